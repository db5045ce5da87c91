use crate::{MlErr, Result};

/// An algorithm that updates parameters given their gradient.
pub trait Optimizer {
    /// Takes one optimization step over a parameter tensor.
    ///
    /// # Arguments
    /// * `slot` - Identifies the parameter tensor, stateful optimizers keep their state per slot.
    /// * `params` - The parameters that are going to be modified.
    /// * `grad` - The gradient used for taking the step.
    fn update_params(&mut self, slot: usize, params: &mut [f32], grad: &[f32]) -> Result<()>;
}

/// Fails with `ParamSizeMismatch` unless the gradient covers every parameter.
pub(super) fn check_sizes(params: &[f32], grad: &[f32]) -> Result<()> {
    if params.len() != grad.len() {
        return Err(MlErr::ParamSizeMismatch {
            got: grad.len(),
            expected: params.len(),
        });
    }

    Ok(())
}

/// Returns the state buffer of a slot, creating it zeroed on first use.
pub(super) fn slot_state(states: &mut Vec<Box<[f32]>>, slot: usize, len: usize) -> &mut [f32] {
    if states.len() <= slot {
        states.resize_with(slot + 1, Default::default);
    }

    if states[slot].len() != len {
        states[slot] = vec![0.; len].into_boxed_slice();
    }

    &mut states[slot]
}
