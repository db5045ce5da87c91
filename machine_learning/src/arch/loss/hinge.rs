use ndarray::{Array2, ArrayView2, Zip};

use super::{LossFn, loss_fn::same_shape};
use crate::Result;

/// Binary hinge loss, `mean(max(0, 1 - y * y_pred))` with targets in {-1, 1}.
#[derive(Debug, Default, Clone, Copy)]
pub struct Hinge;

impl Hinge {
    pub fn new() -> Self {
        Self
    }
}

impl LossFn for Hinge {
    fn loss(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Result<f32> {
        same_shape(y_pred, y)?;

        let n = y_pred.len().max(1) as f32;
        let total = Zip::from(&y_pred)
            .and(&y)
            .fold(0., |acc, &p, &y| acc + (1. - p * y).max(0.));

        Ok(total / n)
    }

    fn loss_prime(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Result<Array2<f32>> {
        same_shape(y_pred, y)?;

        let n = y_pred.len().max(1) as f32;
        Ok(Zip::from(&y_pred)
            .and(&y)
            .map_collect(|&p, &y| if 1. - p * y > 0. { -y / n } else { 0. }))
    }
}
