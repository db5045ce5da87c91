use super::{
    Optimizer,
    optimizer::{check_sizes, slot_state},
};
use crate::Result;

/// Gradient descent with momentum, steps follow an exponentially decaying sum of past gradients.
#[derive(Debug, Clone)]
pub struct GradientDescentWithMomentum {
    learning_rate: f32,
    momentum: f32,
    velocities: Vec<Box<[f32]>>,
}

impl GradientDescentWithMomentum {
    /// Returns a new `GradientDescentWithMomentum`.
    ///
    /// # Arguments
    /// * `learning_rate` - The *length* of the steps taken on `update_params`.
    /// * `momentum` - How much of the previous velocity is kept on each step.
    pub fn new(learning_rate: f32, momentum: f32) -> Self {
        Self {
            learning_rate,
            momentum,
            velocities: Vec::new(),
        }
    }
}

impl Optimizer for GradientDescentWithMomentum {
    fn update_params(&mut self, slot: usize, params: &mut [f32], grad: &[f32]) -> Result<()> {
        check_sizes(params, grad)?;

        let (lr, mu) = (self.learning_rate, self.momentum);
        let velocity = slot_state(&mut self.velocities, slot, params.len());

        params
            .iter_mut()
            .zip(grad)
            .zip(velocity.iter_mut())
            .for_each(|((p, g), v)| {
                *v = mu * *v + g;
                *p -= lr * *v;
            });

        Ok(())
    }
}
