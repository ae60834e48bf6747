//! Job list DTOs

use serde::{Deserialize, Serialize};

use crate::domain::job::WorkflowJob;

/// One page of `GET /repos/{owner}/{repo}/actions/runs/{run_id}/jobs`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsPage {
    pub total_count: u64,
    pub jobs: Vec<WorkflowJob>,
}
