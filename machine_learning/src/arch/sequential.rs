use ndarray::{Array2, ArrayView2};

use super::layers::Layer;
use crate::{Result, optimization::Optimizer};

/// A sequential model: information flows forward when computing an output and backward when
/// computing the *deltas* of its layers.
///
/// Every stage is registered under a name so the structure of the model stays inspectable.
#[derive(Debug, Clone, Default)]
pub struct Sequential {
    stages: Vec<(String, Layer)>,
}

impl Sequential {
    /// Creates a new empty `Sequential`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a stage at the end of the model.
    ///
    /// # Arguments
    /// * `name` - The name the stage is registered under.
    /// * `layer` - The stage itself.
    pub fn push(&mut self, name: impl Into<String>, layer: Layer) {
        self.stages.push((name.into(), layer));
    }

    /// Returns `true` if there's a stage registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.stages.iter().any(|(n, _)| n == name)
    }

    /// Returns the amount of stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Returns the names of the stages, in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().map(|(name, _)| name.as_str())
    }

    /// Returns the stages, in order.
    pub fn layers(&self) -> impl Iterator<Item = &Layer> {
        self.stages.iter().map(|(_, layer)| layer)
    }

    /// Returns the stage registered under `name`.
    pub fn get(&self, name: &str) -> Option<&Layer> {
        self.stages
            .iter()
            .find_map(|(n, layer)| (n == name).then_some(layer))
    }

    /// Returns the amount of learnable parameters in the model.
    pub fn size(&self) -> usize {
        self.stages.iter().map(|(_, layer)| layer.size()).sum()
    }

    /// Makes a forward pass through the network.
    ///
    /// # Arguments
    /// * `x` - The input data.
    /// * `train` - Whether the pass is part of a training step.
    ///
    /// # Returns
    /// The prediction for the given input or an error if occurred.
    pub fn forward(&mut self, x: ArrayView2<f32>, train: bool) -> Result<Array2<f32>> {
        let mut out = x.to_owned();

        for (_, layer) in self.stages.iter_mut() {
            out = layer.forward(out.view(), train)?;
        }

        Ok(out)
    }

    /// Propagates the derivative of the loss through every stage, accumulating the gradients.
    ///
    /// # Arguments
    /// * `d` - The derivative of the loss with respect to the model's output.
    pub fn backward(&mut self, mut d: Array2<f32>) -> Result<()> {
        for (_, layer) in self.stages.iter_mut().rev() {
            d = layer.backward(d)?;
        }

        Ok(())
    }

    pub fn zero_grad(&mut self) {
        self.stages
            .iter_mut()
            .for_each(|(_, layer)| layer.zero_grad());
    }

    /// Updates every learnable parameter with its accumulated gradient.
    ///
    /// # Arguments
    /// * `optimizer` - The algorithm that dictates how to update the parameters.
    pub fn step<O: Optimizer + ?Sized>(&mut self, optimizer: &mut O) -> Result<()> {
        let slots = self
            .stages
            .iter_mut()
            .filter_map(|(_, layer)| layer.params_and_grad());

        for (slot, (params, grad)) in slots.enumerate() {
            optimizer.update_params(slot, params, grad)?;
        }

        Ok(())
    }
}
