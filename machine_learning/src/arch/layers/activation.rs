use ndarray::{Array2, ArrayView2};

use crate::{MlErr, Result, arch::activations::ActFn};

/// A parameterless layer that applies an activation function to every element.
#[derive(Debug, Clone)]
pub struct Activation {
    act_fn: ActFn,
    z: Option<Array2<f32>>,
}

impl Activation {
    pub fn new(act_fn: ActFn) -> Self {
        Self { act_fn, z: None }
    }

    pub fn act_fn(&self) -> ActFn {
        self.act_fn
    }

    pub fn forward(&mut self, z: ArrayView2<f32>) -> Array2<f32> {
        let act_fn = self.act_fn;
        let a = z.mapv(|z| act_fn.f(z));
        self.z = Some(z.to_owned());
        a
    }

    pub fn backward(&mut self, mut d: Array2<f32>) -> Result<Array2<f32>> {
        let z = self.z.as_ref().ok_or(MlErr::MissingForwardPass {
            layer: self.act_fn.name(),
        })?;

        let act_fn = self.act_fn;
        d.zip_mut_with(z, |d, &z| *d *= act_fn.df(z));
        Ok(d)
    }
}
