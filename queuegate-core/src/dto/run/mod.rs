//! Workflow run list DTOs

use serde::{Deserialize, Serialize};

use crate::domain::run::WorkflowRun;

/// One page of `GET /repos/{owner}/{repo}/actions/runs`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRunsPage {
    pub total_count: u64,
    pub workflow_runs: Vec<WorkflowRun>,
}
