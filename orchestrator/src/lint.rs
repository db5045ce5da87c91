use comms::msg::{Update, UpdateType};
use log::info;

use crate::{
    builder::{BlockKind, LossKind},
    graph::BlockGraph,
};

const NO_LAYERS: &str = "No layers added for model!";
const LOOKS_GOOD: &str = "Design looks good!";
const HINGE_RANGE: &str = "Hinge loss used, model predictions should be in range -1,1. Use tanh activation or a linear layer as the last layer to achieve this";

// Positions before the first block.
const NONE: i64 = -2;

/// Static analysis of a diagram looking for structural mistakes before it's run.
///
/// Every rule writes over the same update, so when several rules apply the last one wins:
/// dropout placement, then hinge range, then whatever the scan found first.
pub struct DesignLinter;

impl DesignLinter {
    /// Lints the blocks of a diagram.
    ///
    /// # Arguments
    /// * `graph` - The sorted blocks.
    /// * `loss_fn` - The identifier of the selected loss function.
    /// * `job_id` - The job the diagram belongs to.
    ///
    /// # Returns
    /// An `info` update when nothing was found or a `warning` update with the position of
    /// the offending block.
    pub fn lint(graph: &BlockGraph, loss_fn: &str, job_id: &str) -> Update {
        let mut update = Update::new(UpdateType::Info, LOOKS_GOOD, job_id);

        if graph.is_empty() {
            update.message = NO_LAYERS.into();
            info!("{}", update.message);
            return update;
        }

        let mut warn = |message: String, layer: i64| {
            update.update_type = UpdateType::Warning;
            update.message = message;
            update.layer = layer;
        };

        let n = graph.len() as i64;
        let mut prev_linear = NONE;
        let mut prev_activation = NONE;
        let mut prev_dropout = NONE;

        for (i, block) in graph.blocks().iter().enumerate() {
            let i = i as i64;
            let kind = BlockKind::parse(&block.block_id);

            if kind == Some(BlockKind::Linear) {
                if prev_linear == i - 1 {
                    let at = prev_linear + 1;
                    warn(format!("Two linear layers in a row starting at layer: {at}"), at);
                    break;
                }
                prev_linear = i;
            }

            if kind == Some(BlockKind::Dropout) {
                prev_dropout = i;
            }

            if kind == Some(BlockKind::Softmax) && i != n - 1 {
                let at = i + 1;
                warn(
                    format!("Softmax function in the middle of the network at layer: {at}"),
                    at,
                );
                break;
            }

            if block.block_id.contains("_activation") {
                if prev_activation == i - 1 {
                    let at = prev_activation + 1;
                    warn(
                        format!("Two activation layers in a row starting at layer: {at}"),
                        at,
                    );
                    break;
                }
                prev_activation = i;
            }
        }

        let last = graph.last().and_then(|block| BlockKind::parse(&block.block_id));
        let bounded = matches!(last, Some(BlockKind::Linear | BlockKind::Tanh));
        if LossKind::parse(loss_fn) == Some(LossKind::Hinge) && !bounded {
            warn(HINGE_RANGE.into(), n);
        }

        if prev_dropout > prev_linear {
            let at = prev_dropout + 1;
            warn(
                format!(
                    "Dropout at layer {at} should be followed by a layer with learnable parameters, i.e. a linear layer"
                ),
                at,
            );
        }

        info!(job_id = job_id; "{}", update.message);
        update
    }
}
