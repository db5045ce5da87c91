use std::num::NonZeroUsize;

use comms::{
    msg::Update,
    specs::diagram::{DiagramSpec, Execution},
};
use log::{error, info};
use machine_learning::{
    self as ml,
    dataset::{Dataset, TaskKind},
};

use crate::{
    builder::Hyperparams,
    compiler::ModelCompiler,
    error::{OrchestratorError, Result},
    evaluation::{Evaluator, Metrics},
    graph::BlockGraph,
    lint::DesignLinter,
    report::Reporter,
    training::{TrainOutcome, Trainer},
    translate::ErrorTranslator,
};

/// A dataset ready to be fed to a model.
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub train: Dataset,
    pub test: Dataset,
    pub input_width: usize,
    pub output_width: usize,
    pub task: TaskKind,
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub metrics: Metrics,
    /// The training outcome, `None` for evaluation only runs.
    pub training: Option<TrainOutcome>,
    /// Whether the model had to be compiled again for this run.
    pub model_updated: bool,
}

/// Runs diagrams on behalf of a single owner.
///
/// The compiled model outlives each run, so submitting the same blocks again reuses the
/// model along with whatever it learned. A `Session` is not meant to be shared between
/// concurrent jobs, callers that do so must serialize access to it.
pub struct Session {
    compiler: ModelCompiler,
    trainer: Trainer,
    batch_size: NonZeroUsize,
}

impl Session {
    /// Creates a new `Session`.
    ///
    /// # Arguments
    /// * `batch_size` - The amount of samples per batch for both training and evaluation.
    /// * `seed` - The seed for every random choice the session makes, random if `None`.
    pub fn new(batch_size: NonZeroUsize, seed: Option<u64>) -> Self {
        Self {
            compiler: ModelCompiler::new(seed),
            trainer: Trainer::new(batch_size, seed),
            batch_size,
        }
    }

    pub fn compiler(&self) -> &ModelCompiler {
        &self.compiler
    }

    /// Lints a diagram without compiling it.
    ///
    /// # Returns
    /// The one update the lint produces, it never stops a run.
    pub fn lint(diagram: &DiagramSpec, job_id: &str) -> Update {
        let graph = BlockGraph::new(diagram.blocks.clone());
        DesignLinter::lint(&graph, &diagram.loss_fn, job_id)
    }

    /// Compiles a diagram and runs it: trains it if asked to and always evaluates it.
    ///
    /// Compilation failures are returned before anything is reported. Backend failures are
    /// reported as an `error` update and then returned.
    ///
    /// # Arguments
    /// * `diagram` - The diagram to run.
    /// * `data` - The dataset to run it against.
    /// * `reporter` - Where progress, results and errors go.
    ///
    /// # Returns
    /// The report of the run or the error that stopped it.
    pub fn run(
        &mut self,
        diagram: &DiagramSpec,
        data: &LoadedDataset,
        reporter: &mut Reporter<'_>,
    ) -> Result<RunReport> {
        let graph = BlockGraph::new(diagram.blocks.clone());
        let hyperparams = Hyperparams::from_diagram(diagram)?;

        let model = self
            .compiler
            .compile(&graph, data.input_width, data.output_width)?;

        let training = match diagram.execution {
            Execution::Train => {
                info!(job_id = reporter.job_id(); "training model");
                let outcome = self.trainer.train(model, &data.train, &hyperparams, reporter);
                Some(intercept(outcome, &graph, data.task, reporter)?)
            }
            Execution::Eval => None,
        };

        info!(job_id = reporter.job_id(); "evaluating model");
        let metrics = Evaluator::evaluate(
            model,
            &data.test,
            hyperparams.loss,
            data.task,
            self.batch_size,
        );
        let metrics = intercept(metrics, &graph, data.task, reporter)?;
        let model_updated = self.compiler.state().model_updated();

        reporter.result(metrics.clone());

        Ok(RunReport {
            metrics,
            training,
            model_updated,
        })
    }
}

/// Reports a backend failure before handing it back.
fn intercept<T>(
    result: ml::Result<T>,
    graph: &BlockGraph,
    task: TaskKind,
    reporter: &mut Reporter<'_>,
) -> Result<T> {
    result.map_err(|e| {
        error!(job_id = reporter.job_id(); "job failed: {e}");
        let update = ErrorTranslator::translate(&e, graph, task, reporter.job_id());
        reporter.post(update);
        OrchestratorError::Runtime(e)
    })
}
