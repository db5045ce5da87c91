use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The kind of an `Update`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateType {
    Result,
    Progress,
    Error,
    Warning,
    Info,
}

/// An event pushed to the client through the callback channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Update {
    pub message: String,
    pub update_type: UpdateType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<BTreeMap<String, f64>>,
    /// The 1-based position of the block the update refers to, -1 if it refers to none.
    #[serde(default = "Update::no_layer")]
    pub layer: i64,
    pub job_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl Update {
    pub const NO_LAYER: i64 = -1;

    /// Creates a new `Update` not attributed to any layer.
    ///
    /// # Arguments
    /// * `update_type` - The kind of update.
    /// * `message` - The human readable message.
    /// * `job_id` - The job this update belongs to.
    pub fn new(
        update_type: UpdateType,
        message: impl Into<String>,
        job_id: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            update_type,
            metrics: None,
            layer: Self::NO_LAYER,
            job_id: job_id.into(),
            user_id: None,
        }
    }

    pub fn with_layer(mut self, layer: i64) -> Self {
        self.layer = layer;
        self
    }

    pub fn with_metrics(mut self, metrics: BTreeMap<String, f64>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_user(mut self, user_id: Option<String>) -> Self {
        self.user_id = user_id;
        self
    }

    fn no_layer() -> i64 {
        Self::NO_LAYER
    }
}

/// The recipient's synchronous answer to an `Update`.
///
/// A missing flag means the job should go on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub stop_training: bool,
}

impl Ack {
    /// An acknowledgment that asks to stop the job.
    pub fn stop() -> Self {
        Self {
            stop_training: true,
        }
    }
}
