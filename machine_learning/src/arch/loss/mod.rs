mod bce;
mod cross_entropy;
mod hinge;
mod loss_fn;
mod mse;

use ndarray::{Array2, ArrayView2};

pub use bce::Bce;
pub use cross_entropy::CrossEntropy;
pub use hinge::Hinge;
pub use loss_fn::LossFn;
pub use mse::Mse;

use crate::{Result, dataset::Targets};

/// Every loss function the backend supports.
#[derive(Debug, Clone, Copy)]
pub enum Loss {
    Bce(Bce),
    Hinge(Hinge),
    CrossEntropy(CrossEntropy),
    Mse(Mse),
}

impl Loss {
    /// Computes the loss of a batch and its derivative with respect to the prediction.
    ///
    /// Class based losses use the targets as integer labels as they are, the rest view the
    /// targets with the shape of the prediction first.
    ///
    /// # Arguments
    /// * `y_pred` - The output of the model.
    /// * `y` - The expected output.
    ///
    /// # Returns
    /// A tuple with the loss and its derivative.
    pub fn evaluate(&self, y_pred: ArrayView2<f32>, y: &Targets) -> Result<(f32, Array2<f32>)> {
        let pointwise: &dyn LossFn = match self {
            Self::CrossEntropy(ce) => {
                let classes = y.classes()?;
                return Ok((ce.loss(y_pred, classes)?, ce.loss_prime(y_pred, classes)?));
            }
            Self::Bce(l) => l,
            Self::Hinge(l) => l,
            Self::Mse(l) => l,
        };

        let y = y.view_as(y_pred.dim())?;
        let loss = pointwise.loss(y_pred, y.view())?;
        let d = pointwise.loss_prime(y_pred, y.view())?;
        Ok((loss, d))
    }
}
