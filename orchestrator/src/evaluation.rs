use std::{
    collections::{BTreeMap, BTreeSet},
    num::NonZeroUsize,
};

use log::info;
use machine_learning::{
    MlErr, Result,
    arch::Sequential,
    dataset::{Dataset, TaskKind, Targets},
};
use ndarray::{ArrayView2, Axis};

use crate::builder::LossKind;

/// Metric name to value.
pub type Metrics = BTreeMap<String, f64>;

pub const ACCURACY: &str = "accuracy_metric";
pub const PRECISION: &str = "precision_metric";
pub const RECALL: &str = "recall_metric";
pub const F1_SCORE: &str = "f1_score_metric";
pub const FALSE_POSITIVE_RATE: &str = "false_positive_metric";

/// Computes the metrics of a model over a held out dataset.
pub struct Evaluator;

impl Evaluator {
    /// Evaluates a model, the metrics depend on the task.
    ///
    /// # Arguments
    /// * `model` - The model to evaluate, it's run in inference mode.
    /// * `data` - The held out samples.
    /// * `loss` - The loss the model was trained with, it decides the binary threshold.
    /// * `task` - The task of the dataset.
    /// * `batch_size` - The amount of samples fed to the model at once.
    ///
    /// # Returns
    /// The metrics or the backend failure that stopped the evaluation.
    pub fn evaluate(
        model: &mut Sequential,
        data: &Dataset,
        loss: LossKind,
        task: TaskKind,
        batch_size: NonZeroUsize,
    ) -> Result<Metrics> {
        if data.is_empty() {
            return Err(MlErr::EmptyDataset);
        }

        let mut outputs = Vec::with_capacity(data.len());
        let mut width = 0;

        for batch in data.batches(batch_size) {
            let y_pred = model.forward(batch.x.view(), false)?;
            width = y_pred.ncols();
            outputs.extend(y_pred.iter().copied());
        }

        let outputs = ArrayView2::from_shape((data.len(), width), &outputs).map_err(|_| {
            MlErr::InvalidReshape {
                shape: (data.len(), width),
                size: outputs.len(),
            }
        })?;

        let metrics = match task {
            TaskKind::BinaryClassification => Self::binary(outputs, data.y(), loss)?,
            TaskKind::MulticlassClassification => Self::multiclass(outputs, data.y().classes()?)?,
        };

        info!("evaluation metrics: {metrics:?}");
        Ok(metrics)
    }

    /// Scores a binary classifier.
    ///
    /// Outputs are thresholded at 0.5 for `bce` and at 0 for every other loss. Hinge labels
    /// come in {-1, 1} and are remapped to {0, 1} before scoring.
    ///
    /// # Arguments
    /// * `outputs` - One output per sample.
    /// * `labels` - One label per sample.
    /// * `loss` - The loss the model was trained with.
    pub fn binary(outputs: ArrayView2<f32>, labels: &Targets, loss: LossKind) -> Result<Metrics> {
        let labels = labels.view_as((labels.len(), 1))?;

        if outputs.len() != labels.len() {
            return Err(MlErr::TargetSizeMismatch {
                prediction: outputs.dim(),
                target: labels.dim(),
            });
        }

        let threshold = match loss {
            LossKind::Bce => 0.5,
            _ => 0.,
        };

        let (mut tp, mut fp, mut tn, mut fneg) = (0usize, 0usize, 0usize, 0usize);

        for (&output, &label) in outputs.iter().zip(labels.iter()) {
            let label = match loss {
                LossKind::Hinge => ((label + 1.) / 2.).floor(),
                _ => label,
            };

            match (output > threshold, label == 1.) {
                (true, true) => tp += 1,
                (true, false) => fp += 1,
                (false, false) => tn += 1,
                (false, true) => fneg += 1,
            }
        }

        let accuracy = ratio(tp + tn, tp + tn + fp + fneg);
        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fneg);
        let f1 = ratio(2 * tp, 2 * tp + fp + fneg);

        Ok(Metrics::from([
            (ACCURACY.to_string(), round3(accuracy)),
            (PRECISION.to_string(), round3(precision)),
            (RECALL.to_string(), round3(recall)),
            (F1_SCORE.to_string(), round3(f1)),
            (FALSE_POSITIVE_RATE.to_string(), ratio(fp, fp + tn)),
        ]))
    }

    /// Scores a multiclass classifier, the predicted class of a sample is its highest output.
    ///
    /// Precision, recall and f1 are averaged over every class that appears either as a label
    /// or as a prediction, classes that would divide by zero score 0.
    ///
    /// # Arguments
    /// * `outputs` - One row of class scores per sample.
    /// * `labels` - One class label per sample.
    pub fn multiclass(outputs: ArrayView2<f32>, labels: &[usize]) -> Result<Metrics> {
        if outputs.nrows() != labels.len() {
            return Err(MlErr::TargetSizeMismatch {
                prediction: outputs.dim(),
                target: (labels.len(), 1),
            });
        }

        let preds: Vec<usize> = outputs.axis_iter(Axis(0)).map(argmax).collect();
        let classes: BTreeSet<usize> = preds.iter().chain(labels).copied().collect();

        let correct = preds.iter().zip(labels).filter(|(p, l)| p == l).count();
        let accuracy = ratio(correct, labels.len());

        let (mut precision, mut recall, mut f1) = (0., 0., 0.);
        for &class in &classes {
            let (mut tp, mut fp, mut fneg) = (0, 0, 0);

            for (&pred, &label) in preds.iter().zip(labels) {
                match (pred == class, label == class) {
                    (true, true) => tp += 1,
                    (true, false) => fp += 1,
                    (false, true) => fneg += 1,
                    (false, false) => {}
                }
            }

            precision += ratio(tp, tp + fp);
            recall += ratio(tp, tp + fneg);
            f1 += ratio(2 * tp, 2 * tp + fp + fneg);
        }

        let n = classes.len().max(1) as f64;
        Ok(Metrics::from([
            (ACCURACY.to_string(), round3(accuracy)),
            (PRECISION.to_string(), round3(precision / n)),
            (RECALL.to_string(), round3(recall / n)),
            (F1_SCORE.to_string(), round3(f1 / n)),
        ]))
    }
}

/// Index of the highest value, the first one on ties.
fn argmax(row: ndarray::ArrayView1<f32>) -> usize {
    row.iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |(best, max), (i, &v)| {
            if v > max { (i, v) } else { (best, max) }
        })
        .0
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.
    } else {
        num as f64 / den as f64
    }
}

fn round3(x: f64) -> f64 {
    (x * 1000.).round() / 1000.
}
