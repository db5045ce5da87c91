mod builder;
mod compiler;
pub mod error;
pub mod evaluation;
mod graph;
mod lint;
mod report;
mod session;
mod test;
mod training;
mod translate;

pub use builder::{BlockKind, Hyperparams, LossKind, OptimizerKind};
pub use compiler::{CompilerState, ModelCompiler};
pub use error::{CompileErr, OrchestratorError, Result};
pub use evaluation::{Evaluator, Metrics};
pub use graph::BlockGraph;
pub use lint::DesignLinter;
pub use report::Reporter;
pub use session::{LoadedDataset, RunReport, Session};
pub use training::{TrainOutcome, Trainer};
pub use translate::ErrorTranslator;
