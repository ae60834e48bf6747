//! Job domain types

use serde::{Deserialize, Serialize};

use crate::domain::run::RunStatus;

/// A single job inside a workflow run
///
/// Only `name` and `status` drive the gate; the rest is kept for logging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowJob {
    pub id: u64,
    pub run_id: u64,
    pub name: String,
    pub status: RunStatus,
    #[serde(default)]
    pub conclusion: Option<String>,
    #[serde(default)]
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl WorkflowJob {
    /// Seconds since the job started, if it has started
    pub fn elapsed_secs(&self, now: chrono::DateTime<chrono::Utc>) -> Option<i64> {
        self.started_at.map(|started| (now - started).num_seconds())
    }
}
