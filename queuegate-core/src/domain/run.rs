//! Workflow run domain types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Workflow run record
///
/// One triggered execution of a workflow. Owned by the remote system and
/// only ever read here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowRun {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    pub run_number: u64,
    pub status: RunStatus,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl WorkflowRun {
    /// Human-readable label, e.g. `Deploy #42`
    pub fn label(&self) -> String {
        format!(
            "{} #{}",
            self.name.as_deref().unwrap_or("<unnamed workflow>"),
            self.run_number
        )
    }
}

/// Execution status shared by runs and jobs
///
/// Upstream reports a few finer-grained states besides the three that
/// matter here; anything unrecognised lands in `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    Completed,
    Waiting,
    Requested,
    Pending,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// Query-string value used when filtering runs by status
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::Completed => "completed",
            RunStatus::Waiting => "waiting",
            RunStatus::Requested => "requested",
            RunStatus::Pending => "pending",
            RunStatus::Unknown => "unknown",
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, RunStatus::Completed)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
