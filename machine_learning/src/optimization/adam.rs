use super::{
    Optimizer,
    optimizer::{check_sizes, slot_state},
};
use crate::Result;

#[derive(Debug, Clone)]
pub struct Adam {
    learning_rate: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    steps: Vec<i32>,
    v: Vec<Box<[f32]>>,
    s: Vec<Box<[f32]>>,
}

impl Adam {
    /// Creates a new `Adam` optimizer.
    ///
    /// # Arguments
    /// * `learning_rate` - The small coefficient that modulates the amount of training per update.
    /// * `beta1`, `beta2`, `epsilon` - Hyperparameters to the optimization algorithm.
    ///
    /// # Returns
    /// A new `Adam` instance.
    pub fn new(learning_rate: f32, beta1: f32, beta2: f32, epsilon: f32) -> Self {
        Self {
            learning_rate,
            beta1,
            beta2,
            epsilon,
            steps: Vec::new(),
            v: Vec::new(),
            s: Vec::new(),
        }
    }

    /// Creates an `Adam` optimizer with the customary betas and epsilon.
    pub fn with_defaults(learning_rate: f32) -> Self {
        Self::new(learning_rate, 0.9, 0.999, 1e-8)
    }
}

impl Optimizer for Adam {
    fn update_params(&mut self, slot: usize, params: &mut [f32], grad: &[f32]) -> Result<()> {
        check_sizes(params, grad)?;

        let Self {
            learning_rate: lr,
            beta1: b1,
            beta2: b2,
            epsilon: eps,
            ..
        } = *self;

        if self.steps.len() <= slot {
            self.steps.resize(slot + 1, 0);
        }
        self.steps[slot] += 1;
        let t = self.steps[slot];

        let bc1 = 1. - b1.powi(t);
        let bc2 = 1. - b2.powi(t);

        let v = slot_state(&mut self.v, slot, params.len());
        let s = slot_state(&mut self.s, slot, params.len());

        params
            .iter_mut()
            .zip(grad)
            .zip(v.iter_mut())
            .zip(s.iter_mut())
            .for_each(|(((p, g), v), s)| {
                *v = b1 * *v + (1. - b1) * g;
                *s = b2 * *s + (1. - b2) * g.powi(2);
                let v_hat = *v / bc1;
                let s_hat = *s / bc2;
                *p -= lr * v_hat / (s_hat.sqrt() + eps);
            });

        Ok(())
    }
}
