use anyhow::{Context, Result};
use comms::{specs::job::JobSpec, Callback};
use log::{info, warn};
use orchestrator::{LossKind, Reporter, RunReport, Session};

use crate::{config::EngineConfig, datasets};

/// Turns a callback url into a socket address, the `tcp://` scheme is optional.
pub fn callback_addr(url: &str) -> &str {
    url.strip_prefix("tcp://").unwrap_or(url)
}

/// Runs a job from start to end.
///
/// The lint of the diagram is delivered first, on its own channel, a failed delivery is
/// only logged. Then the dataset is made available, and the diagram is compiled, trained
/// if asked to and evaluated.
///
/// # Arguments
/// * `config` - The engine settings.
/// * `job` - The job to run.
/// * `session` - The session of the job's owner, it keeps the model between jobs.
/// * `lint` - Where the lint update goes.
/// * `callback` - Where progress, results and errors go, they're dropped with `None`.
///
/// # Returns
/// The report of the run or the error that stopped it.
pub fn run(
    config: &EngineConfig,
    job: &JobSpec,
    session: &mut Session,
    lint: &mut dyn Callback,
    callback: Option<&mut dyn Callback>,
) -> Result<RunReport> {
    info!(job_id = job.job_id.as_str(), dataset = job.dataset.as_str(); "job received");

    let update = Session::lint(&job.diagram, &job.job_id).with_user(job.user_id.clone());
    if let Err(e) = lint.post(&update) {
        warn!(job_id = job.job_id.as_str(); "failed to send design check: {e}");
    }

    let loss = LossKind::parse(&job.diagram.loss_fn);
    let data = datasets::load(config, &job.dataset, loss)
        .with_context(|| format!("failed to load dataset {}", job.dataset))?;

    let mut reporter = Reporter::new(callback, job.job_id.as_str(), job.user_id.clone());
    let report = session
        .run(&job.diagram, &data, &mut reporter)
        .with_context(|| format!("job {} failed", job.job_id))?;

    info!(job_id = job.job_id.as_str(); "job finished");
    Ok(report)
}
