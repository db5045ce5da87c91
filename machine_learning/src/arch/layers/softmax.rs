use ndarray::{Array2, ArrayView2, Axis, Zip};

use crate::{MlErr, Result};

/// Normalizes its input into a probability distribution along `axis`.
#[derive(Debug, Clone)]
pub struct Softmax {
    axis: Axis,
    a: Option<Array2<f32>>,
}

impl Softmax {
    /// Creates a new `Softmax`.
    ///
    /// # Arguments
    /// * `axis` - The axis the distribution is taken over, `Axis(1)` normalizes each sample.
    pub fn new(axis: Axis) -> Self {
        Self { axis, a: None }
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn forward(&mut self, x: ArrayView2<f32>) -> Array2<f32> {
        let mut a = x.to_owned();

        for mut lane in a.lanes_mut(self.axis) {
            let max = lane.fold(f32::NEG_INFINITY, |acc, &v| acc.max(v));
            lane.mapv_inplace(|v| (v - max).exp());
            let sum = lane.sum();
            lane.mapv_inplace(|v| v / sum);
        }

        self.a = Some(a.clone());
        a
    }

    pub fn backward(&mut self, mut d: Array2<f32>) -> Result<Array2<f32>> {
        let a = self
            .a
            .as_ref()
            .ok_or(MlErr::MissingForwardPass { layer: "softmax" })?;

        Zip::from(a.lanes(self.axis))
            .and(d.lanes_mut(self.axis))
            .for_each(|a, mut d| {
                let dot = a.dot(&d);
                d.zip_mut_with(&a, |d, &a| *d = a * (*d - dot));
            });

        Ok(d)
    }
}
