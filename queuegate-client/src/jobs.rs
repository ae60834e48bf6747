//! Job-related API endpoints

use crate::ActionsClient;
use crate::error::Result;
use queuegate_core::domain::job::WorkflowJob;
use queuegate_core::dto::job::JobsPage;

impl ActionsClient {
    /// List the jobs of a workflow run
    ///
    /// Only the latest attempt of the run is reported, which is what the
    /// API returns by default.
    ///
    /// # Arguments
    /// * `run_id` - The workflow run ID
    ///
    /// # Returns
    /// Every job of the run, across all pages
    pub async fn list_jobs_for_run(&self, run_id: u64) -> Result<Vec<WorkflowJob>> {
        let url = self.repo_url(&format!("actions/runs/{}/jobs", run_id));

        self.get_all_pages(&url, &[], |page: JobsPage| (page.total_count, page.jobs))
            .await
    }
}
