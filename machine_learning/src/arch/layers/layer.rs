use ndarray::{Array2, ArrayView2, Axis};
use rand::Rng;

use super::{Activation, Dropout, Flatten, Linear, Softmax};
use crate::{Result, arch::activations::ActFn};

/// A stage of a sequential model.
#[derive(Debug, Clone)]
pub enum Layer {
    Linear(Linear),
    Activation(Activation),
    Softmax(Softmax),
    Dropout(Dropout),
    Flatten(Flatten),
}

impl Layer {
    pub fn linear<R: Rng + ?Sized>(dim: (usize, usize), bias: bool, rng: &mut R) -> Self {
        Self::Linear(super::Linear::new(dim, bias, rng))
    }

    pub fn activation(act_fn: ActFn) -> Self {
        Self::Activation(super::Activation::new(act_fn))
    }

    pub fn softmax(axis: Axis) -> Self {
        Self::Softmax(super::Softmax::new(axis))
    }

    pub fn dropout(p: f32, seed: u64) -> Result<Self> {
        super::Dropout::new(p, seed).map(Self::Dropout)
    }

    pub fn flatten() -> Self {
        Self::Flatten(super::Flatten)
    }

    /// Returns the amount of learnable parameters of this layer.
    pub fn size(&self) -> usize {
        match self {
            Self::Linear(l) => l.size(),
            _ => 0,
        }
    }

    /// Makes a forward pass through the layer.
    ///
    /// # Arguments
    /// * `x` - The input of the layer.
    /// * `train` - Whether the pass is part of a training step.
    ///
    /// # Returns
    /// The output of the layer or an error if the input doesn't fit the layer.
    pub fn forward(&mut self, x: ArrayView2<f32>, train: bool) -> Result<Array2<f32>> {
        match self {
            Self::Linear(l) => l.forward(x),
            Self::Activation(l) => Ok(l.forward(x)),
            Self::Softmax(l) => Ok(l.forward(x)),
            Self::Dropout(l) => Ok(l.forward(x, train)),
            Self::Flatten(l) => Ok(l.forward(x)),
        }
    }

    /// Makes a backward pass through the layer.
    ///
    /// # Arguments
    /// * `d` - The derivative of the loss with respect to this layer's output.
    ///
    /// # Returns
    /// The derivative of the loss with respect to this layer's input.
    pub fn backward(&mut self, d: Array2<f32>) -> Result<Array2<f32>> {
        match self {
            Self::Linear(l) => l.backward(d),
            Self::Activation(l) => l.backward(d),
            Self::Softmax(l) => l.backward(d),
            Self::Dropout(l) => Ok(l.backward(d)),
            Self::Flatten(l) => Ok(l.backward(d)),
        }
    }

    pub fn zero_grad(&mut self) {
        if let Self::Linear(l) = self {
            l.zero_grad();
        }
    }

    /// Gives mutable access to the layer's parameters along with their gradient, if it has any.
    pub fn params_and_grad(&mut self) -> Option<(&mut [f32], &[f32])> {
        match self {
            Self::Linear(l) => Some(l.params_and_grad()),
            _ => None,
        }
    }
}
