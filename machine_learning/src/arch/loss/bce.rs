use ndarray::{Array2, ArrayView2, Zip};

use super::{LossFn, loss_fn::same_shape};
use crate::{MlErr, Result};

// Logarithms are clamped so a confident wrong prediction yields a large but finite loss.
const LOG_FLOOR: f32 = -100.;
const EPS: f32 = 1e-12;

/// Binary cross entropy, expects predictions to be probabilities.
#[derive(Debug, Default, Clone, Copy)]
pub struct Bce;

impl Bce {
    pub fn new() -> Self {
        Self
    }

    fn ensure_probabilities(y_pred: ArrayView2<f32>) -> Result<()> {
        match y_pred.iter().find(|p| !(0.0..=1.0).contains(*p)) {
            Some(&value) => Err(MlErr::InputOutOfRange { value }),
            None => Ok(()),
        }
    }
}

impl LossFn for Bce {
    fn loss(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Result<f32> {
        same_shape(y_pred, y)?;
        Self::ensure_probabilities(y_pred)?;

        let n = y_pred.len().max(1) as f32;
        let total = Zip::from(&y_pred).and(&y).fold(0., |acc, &p, &y| {
            acc + y * p.ln().max(LOG_FLOOR) + (1. - y) * (1. - p).ln().max(LOG_FLOOR)
        });

        Ok(-total / n)
    }

    fn loss_prime(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Result<Array2<f32>> {
        same_shape(y_pred, y)?;
        Self::ensure_probabilities(y_pred)?;

        let n = y_pred.len().max(1) as f32;
        Ok(Zip::from(&y_pred)
            .and(&y)
            .map_collect(|&p, &y| (p - y) / (p * (1. - p)).max(EPS) / n))
    }
}
