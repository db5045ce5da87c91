use ndarray::prelude::*;
use rand::Rng;

use crate::{MlErr, Result};

/// A fully connected layer, computes `x · w + b`.
///
/// The weights and the biases live in a single flat buffer (weights first, row major) so
/// optimizers can update every parameter of the layer with one slice.
#[derive(Debug, Clone)]
pub struct Linear {
    dim: (usize, usize),
    bias: bool,
    params: Vec<f32>,
    grad: Vec<f32>,

    // Forward metadata
    x: Option<Array2<f32>>,
}

impl Linear {
    /// Creates a new `Linear` layer with parameters drawn uniformly from ±1/sqrt(fan_in).
    ///
    /// # Arguments
    /// * `dim` - The amount of input and output features.
    /// * `bias` - Whether the layer learns an additive bias.
    /// * `rng` - The random number generator used for the initialization.
    ///
    /// # Returns
    /// A new `Linear` instance.
    pub fn new<R: Rng + ?Sized>(dim: (usize, usize), bias: bool, rng: &mut R) -> Self {
        let size = dim.0 * dim.1 + if bias { dim.1 } else { 0 };
        let bound = if dim.0 > 0 {
            1. / (dim.0 as f32).sqrt()
        } else {
            0.
        };

        let params = (0..size)
            .map(|_| {
                if bound > 0. {
                    rng.random_range(-bound..bound)
                } else {
                    0.
                }
            })
            .collect();

        Self {
            dim,
            bias,
            params,
            grad: vec![0.; size],
            x: None,
        }
    }

    /// Returns the amount of input and output features.
    pub fn dim(&self) -> (usize, usize) {
        self.dim
    }

    /// Returns the amount of parameters this layer has.
    pub fn size(&self) -> usize {
        self.params.len()
    }

    pub fn forward(&mut self, x: ArrayView2<f32>) -> Result<Array2<f32>> {
        if x.ncols() != self.dim.0 {
            return Err(MlErr::MatMulShape {
                lhs: x.dim(),
                rhs: self.dim,
            });
        }

        let (w, b) = self.view_params()?;
        let mut z = x.dot(&w);
        if let Some(b) = b {
            z += &b;
        }

        self.x = Some(x.to_owned());
        Ok(z)
    }

    /// Accumulates the gradient of this layer's parameters and propagates `d` backwards.
    pub fn backward(&mut self, d: Array2<f32>) -> Result<Array2<f32>> {
        let x = self
            .x
            .as_ref()
            .ok_or(MlErr::MissingForwardPass { layer: "linear" })?;

        let dw = x.t().dot(&d);
        let db = d.sum_axis(Axis(0));

        let w_size = self.dim.0 * self.dim.1;
        let (gw, gb) = self.grad.split_at_mut(w_size);
        gw.iter_mut().zip(dw.iter()).for_each(|(g, d)| *g += d);
        gb.iter_mut().zip(db.iter()).for_each(|(g, d)| *g += d);

        let (w, _) = self.view_params()?;
        Ok(d.dot(&w.t()))
    }

    pub fn zero_grad(&mut self) {
        self.grad.fill(0.);
    }

    /// Gives mutable access to the parameters along with their gradient.
    pub fn params_and_grad(&mut self) -> (&mut [f32], &[f32]) {
        (&mut self.params, &self.grad)
    }

    /// Gives a view of the raw parameter buffer as the weights and biases of this layer.
    ///
    /// # Returns
    /// A tuple containing the weights and, if the layer has them, the biases.
    fn view_params(&self) -> Result<(ArrayView2<'_, f32>, Option<ArrayView1<'_, f32>>)> {
        let w_size = self.dim.0 * self.dim.1;
        let (w_raw, b_raw) = self.params.split_at(w_size);

        let weights = ArrayView2::from_shape(self.dim, w_raw).map_err(|_| MlErr::InvalidReshape {
            shape: self.dim,
            size: w_raw.len(),
        })?;
        let biases = self.bias.then(|| ArrayView1::from(b_raw));

        Ok((weights, biases))
    }
}
