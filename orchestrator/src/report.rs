use comms::{
    Callback,
    msg::{Ack, Update, UpdateType},
};
use log::warn;

use crate::evaluation::Metrics;

/// Delivers the updates of a job through its callback channel, if it has one.
pub struct Reporter<'a> {
    callback: Option<&'a mut dyn Callback>,
    job_id: String,
    user_id: Option<String>,
}

impl<'a> Reporter<'a> {
    /// Creates a new `Reporter`.
    ///
    /// # Arguments
    /// * `callback` - Where updates are posted, with `None` they are dropped.
    /// * `job_id` - The job every update belongs to.
    /// * `user_id` - The user that submitted the job.
    pub fn new(
        callback: Option<&'a mut dyn Callback>,
        job_id: impl Into<String>,
        user_id: Option<String>,
    ) -> Self {
        Self {
            callback,
            job_id: job_id.into(),
            user_id,
        }
    }

    /// Creates a `Reporter` without a callback channel.
    pub fn silent(job_id: impl Into<String>) -> Self {
        Self::new(None, job_id, None)
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Reports the end of a training epoch.
    ///
    /// # Arguments
    /// * `epoch` - The 1-based epoch that just finished.
    /// * `epochs` - The amount of epochs of the training.
    /// * `loss` - The mean loss of the epoch.
    ///
    /// # Returns
    /// The acknowledgment of the recipient.
    pub fn progress(&mut self, epoch: usize, epochs: usize, loss: f32) -> Ack {
        let metrics = Metrics::from([
            ("loss".to_string(), loss as f64),
            ("epoch".to_string(), epoch as f64),
        ]);

        let message = format!("Epoch {epoch}/{epochs}, Loss: {loss:.4}");
        let update = Update::new(UpdateType::Progress, message, &self.job_id).with_metrics(metrics);
        self.post(update)
    }

    /// Reports the metrics of a finished evaluation.
    pub fn result(&mut self, metrics: Metrics) -> Ack {
        let update =
            Update::new(UpdateType::Result, "Evaluation complete", &self.job_id).with_metrics(metrics);
        self.post(update)
    }

    /// Posts an update tagged with the ids of the job.
    ///
    /// A failing channel is never fatal to the job, the failure is logged and the update is
    /// taken as acknowledged without cancellation.
    pub fn post(&mut self, update: Update) -> Ack {
        let Some(callback) = self.callback.as_deref_mut() else {
            return Ack::default();
        };

        let update = Update {
            job_id: self.job_id.clone(),
            ..update
        }
        .with_user(self.user_id.clone());

        match callback.post(&update) {
            Ok(ack) => ack,
            Err(e) => {
                warn!(job_id = self.job_id.as_str(); "failed to send update: {e}");
                Ack::default()
            }
        }
    }
}
