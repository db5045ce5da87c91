use comms::msg::{Update, UpdateType};
use log::{info, warn};
use machine_learning::{MlErr, dataset::TaskKind};

use crate::graph::BlockGraph;

const BOUNDED_OUTPUT: &str = "Selected loss function requires model outputs to be between 0 and 1. Apply an appropriate activation function as the last layer to achieve this range!";
const OUTPUT_COUNT: &str = "Final layer of the model outputs an unexpected number of predictions. Choose an output shape that matches the prediction labels!";

/// Turns numeric backend failures into diagnostics a user can act upon.
pub struct ErrorTranslator;

impl ErrorTranslator {
    /// Translates a backend failure.
    ///
    /// Known failures are attributed to the last block, the rest are delivered as they are,
    /// without attribution.
    ///
    /// # Arguments
    /// * `err` - The failure.
    /// * `graph` - The blocks of the model that failed.
    /// * `task` - The task of the dataset the model was run against.
    /// * `job_id` - The job that failed.
    ///
    /// # Returns
    /// An `error` update.
    pub fn translate(err: &MlErr, graph: &BlockGraph, task: TaskKind, job_id: &str) -> Update {
        let last = graph.len() as i64;

        let (message, layer) = match err {
            MlErr::InputOutOfRange { .. } => {
                info!("loss error caught");
                (BOUNDED_OUTPUT.to_string(), last)
            }
            MlErr::InvalidReshape { .. } => {
                info!("shape error caught");
                (OUTPUT_COUNT.to_string(), last)
            }
            MlErr::ScalarTypeMismatch { .. } | MlErr::TargetSizeMismatch { .. } => {
                info!("output to loss shape error caught");
                let message = format!(
                    "Loss function does not work with specified task due to different expected outputs. For this challenge, choose a loss function that works with {task}!"
                );
                (message, last)
            }
            err => {
                warn!("unknown error caught: {err}");
                (err.to_string(), Update::NO_LAYER)
            }
        };

        Update::new(UpdateType::Error, message, job_id).with_layer(layer)
    }
}
