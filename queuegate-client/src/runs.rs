//! Workflow run API endpoints

use crate::ActionsClient;
use crate::error::Result;
use queuegate_core::domain::run::{RunStatus, WorkflowRun};
use queuegate_core::dto::run::WorkflowRunsPage;

impl ActionsClient {
    /// List the repository's workflow runs with the given status
    ///
    /// # Arguments
    /// * `status` - Status filter, e.g. `RunStatus::Queued`
    ///
    /// # Returns
    /// Every matching run, across all pages
    ///
    /// # Example
    /// ```no_run
    /// # use queuegate_client::ActionsClient;
    /// # use queuegate_core::domain::run::RunStatus;
    /// # async fn example() -> queuegate_client::Result<()> {
    /// let client = ActionsClient::new("https://api.github.com", "octo-org", "octo-repo", "ghp")?;
    /// let queued = client.list_workflow_runs(RunStatus::Queued).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn list_workflow_runs(&self, status: RunStatus) -> Result<Vec<WorkflowRun>> {
        let url = self.repo_url("actions/runs");

        self.get_all_pages(
            &url,
            &[("status", status.as_str().to_string())],
            |page: WorkflowRunsPage| (page.total_count, page.workflow_runs),
        )
        .await
    }
}
