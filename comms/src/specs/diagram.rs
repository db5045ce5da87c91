use std::{collections::BTreeMap, num::NonZeroUsize};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One declarative stage of a pipeline.
///
/// Blocks are compared by value, two blocks with the same kind, order and parameters are the
/// same block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockSpec {
    pub block_id: String,
    pub order: i64,
    #[serde(default)]
    pub params: BTreeMap<String, Value>,
}

impl BlockSpec {
    /// Creates a new `BlockSpec` without parameters.
    pub fn new(block_id: impl Into<String>, order: i64) -> Self {
        Self {
            block_id: block_id.into(),
            order,
            params: BTreeMap::new(),
        }
    }

    /// Sets a parameter of the block.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// What to do with the compiled model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Execution {
    /// Train the model, then evaluate it.
    Train,
    /// Only evaluate the model.
    Eval,
}

/// The specification of a whole pipeline submitted by a client: the blocks and the
/// hyperparameters used to train and evaluate them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagramSpec {
    pub blocks: Vec<BlockSpec>,
    pub execution: Execution,
    #[serde(default)]
    pub dataset: Option<String>,
    pub optimizer: String,
    pub loss_fn: String,
    #[serde(default, alias = "evalFns")]
    pub eval_fns: Vec<String>,
    pub lr: f32,
    pub epochs: NonZeroUsize,
}
