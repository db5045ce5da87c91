use serde::{Deserialize, Serialize};

use super::diagram::DiagramSpec;

/// The inbound job: a diagram to run against a dataset on behalf of a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSpec {
    pub job_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub dataset: String,
    pub diagram: DiagramSpec,
    /// Where updates are posted, with no callback they are computed but not transmitted.
    #[serde(default)]
    pub callback_url: Option<String>,
}
