//! Workflows repository
//!
//! Handles communication with the Actions API for:
//! - Listing workflow runs by status
//! - Listing the jobs of one run

use async_trait::async_trait;
use queuegate_client::{ActionsClient, Result};
use queuegate_core::domain::job::WorkflowJob;
use queuegate_core::domain::run::{RunStatus, WorkflowRun};

/// Repository trait for the workflow API reads used by the gate
#[async_trait]
pub trait WorkflowRepository: Send + Sync {
    /// Lists the repository's runs currently in `status`
    async fn list_runs(&self, status: RunStatus) -> Result<Vec<WorkflowRun>>;

    /// Lists the jobs of one run
    ///
    /// # Arguments
    /// * `run_id` - The ID of the workflow run
    async fn list_jobs(&self, run_id: u64) -> Result<Vec<WorkflowJob>>;
}

/// HTTP implementation of WorkflowRepository
pub struct HttpWorkflowRepository {
    client: ActionsClient,
}

impl HttpWorkflowRepository {
    /// Creates a new HTTP workflow repository
    pub fn new(client: ActionsClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl WorkflowRepository for HttpWorkflowRepository {
    async fn list_runs(&self, status: RunStatus) -> Result<Vec<WorkflowRun>> {
        self.client.list_workflow_runs(status).await
    }

    async fn list_jobs(&self, run_id: u64) -> Result<Vec<WorkflowJob>> {
        self.client.list_jobs_for_run(run_id).await
    }
}
