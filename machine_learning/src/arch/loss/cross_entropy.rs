use ndarray::{Array2, ArrayView2, Axis};

use crate::{MlErr, Result};

/// Cross entropy over raw per class scores, compared against integer class labels.
#[derive(Debug, Default, Clone, Copy)]
pub struct CrossEntropy;

impl CrossEntropy {
    pub fn new() -> Self {
        Self
    }

    pub fn loss(&self, logits: ArrayView2<f32>, classes: &[usize]) -> Result<f32> {
        let probs = Self::softmax(logits, classes)?;
        let n = classes.len().max(1) as f32;

        let total: f32 = classes
            .iter()
            .enumerate()
            .map(|(row, &class)| -probs[[row, class]].max(f32::MIN_POSITIVE).ln())
            .sum();

        Ok(total / n)
    }

    pub fn loss_prime(&self, logits: ArrayView2<f32>, classes: &[usize]) -> Result<Array2<f32>> {
        let mut d = Self::softmax(logits, classes)?;
        let n = classes.len().max(1) as f32;

        for (row, &class) in classes.iter().enumerate() {
            d[[row, class]] -= 1.;
        }

        d /= n;
        Ok(d)
    }

    /// Validates the labels against the scores and normalizes each row of scores.
    fn softmax(logits: ArrayView2<f32>, classes: &[usize]) -> Result<Array2<f32>> {
        if logits.nrows() != classes.len() {
            return Err(MlErr::TargetSizeMismatch {
                prediction: logits.dim(),
                target: (classes.len(), 1),
            });
        }

        let nclasses = logits.ncols();
        if let Some(&target) = classes.iter().find(|&&c| c >= nclasses) {
            return Err(MlErr::TargetOutOfBounds {
                target,
                classes: nclasses,
            });
        }

        let mut probs = logits.to_owned();
        for mut row in probs.axis_iter_mut(Axis(0)) {
            let max = row.fold(f32::NEG_INFINITY, |acc, &v| acc.max(v));
            row.mapv_inplace(|v| (v - max).exp());
            let sum = row.sum();
            row.mapv_inplace(|v| v / sum);
        }

        Ok(probs)
    }
}
