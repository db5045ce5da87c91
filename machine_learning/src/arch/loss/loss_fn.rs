use ndarray::{Array2, ArrayView2};

use crate::{MlErr, Result};

/// A loss that compares predictions and targets of the same shape element by element.
pub trait LossFn {
    fn loss(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Result<f32>;
    fn loss_prime(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Result<Array2<f32>>;
}

/// Fails with `TargetSizeMismatch` unless both tensors share their shape.
pub(super) fn same_shape(y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Result<()> {
    if y_pred.dim() != y.dim() {
        return Err(MlErr::TargetSizeMismatch {
            prediction: y_pred.dim(),
            target: y.dim(),
        });
    }

    Ok(())
}
