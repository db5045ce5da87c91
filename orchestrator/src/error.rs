use std::{error::Error, fmt};

use machine_learning::MlErr;
use serde_json::Value;

/// The result type used in the entire orchestrator.
pub type Result<T> = std::result::Result<T, OrchestratorError>;

/// Reasons why a diagram can't be turned into an executable model.
#[derive(Debug, Clone, PartialEq)]
pub enum CompileErr {
    /// There's no stage constructor for the block.
    UnknownBlock { block_id: String, order: i64 },
    /// Two blocks would be registered under the same stage name.
    DuplicateStage { name: String },
    /// A block lacks a parameter it can't be built without.
    MissingParam {
        block_id: String,
        param: &'static str,
    },
    /// A parameter has a value outside of its domain.
    InvalidParam {
        block_id: String,
        param: &'static str,
        value: Value,
    },
    /// A block carries a parameter its stage doesn't take.
    UnknownParam { block_id: String, param: String },
    UnknownLoss(String),
    UnknownOptimizer(String),
    /// A training hyperparameter is outside of its domain.
    InvalidHyperparameter { name: &'static str, value: String },
}

impl fmt::Display for CompileErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownBlock { block_id, order } => {
                write!(f, "unknown block {block_id} at order {order}")
            }
            Self::DuplicateStage { name } => write!(f, "duplicate stage name {name}"),
            Self::MissingParam { block_id, param } => {
                write!(f, "block {block_id} requires the {param} parameter")
            }
            Self::InvalidParam {
                block_id,
                param,
                value,
            } => write!(f, "invalid value {value} for {param} in block {block_id}"),
            Self::UnknownParam { block_id, param } => {
                write!(f, "block {block_id} doesn't take a {param} parameter")
            }
            Self::UnknownLoss(name) => write!(f, "unknown loss function {name}"),
            Self::UnknownOptimizer(name) => write!(f, "unknown optimizer {name}"),
            Self::InvalidHyperparameter { name, value } => {
                write!(f, "invalid value {value} for hyperparameter {name}")
            }
        }
    }
}

impl Error for CompileErr {}

/// All errors that can occur in the orchestrator.
#[derive(Debug)]
pub enum OrchestratorError {
    /// The diagram couldn't be compiled, nothing was run.
    Compile(CompileErr),
    /// The numeric backend failed while training or evaluating.
    Runtime(MlErr),
}

impl fmt::Display for OrchestratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compile(e) => write!(f, "compilation error: {e}"),
            Self::Runtime(e) => write!(f, "runtime error: {e}"),
        }
    }
}

impl Error for OrchestratorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Compile(e) => Some(e),
            Self::Runtime(e) => Some(e),
        }
    }
}

impl From<CompileErr> for OrchestratorError {
    fn from(e: CompileErr) -> Self {
        Self::Compile(e)
    }
}

impl From<MlErr> for OrchestratorError {
    fn from(e: MlErr) -> Self {
        Self::Runtime(e)
    }
}
