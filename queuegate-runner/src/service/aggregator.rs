//! Job status aggregator
//!
//! Decides whether any watched job is still active across a set of
//! workflow runs:
//! - Fetches the jobs of every run concurrently (bounded fan-out)
//! - Waits for all fetches before deciding
//! - Applies the error policy as an explicit reduction over the results

use queuegate_core::domain::job::WorkflowJob;
use queuegate_core::domain::run::{RunStatus, WorkflowRun};
use queuegate_core::domain::watch::WatchList;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::error::GateError;
use crate::repository::WorkflowRepository;

/// Which watched jobs keep the gate closed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JobMatchPolicy {
    /// Any status other than completed, queued jobs included
    #[default]
    NotCompleted,
    /// Only jobs that are executing right now
    InProgressOnly,
}

impl JobMatchPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "not-completed" | "not_completed" => Some(Self::NotCompleted),
            "in-progress" | "in_progress" => Some(Self::InProgressOnly),
            _ => None,
        }
    }

    pub fn is_active(&self, status: RunStatus) -> bool {
        match self {
            JobMatchPolicy::NotCompleted => !status.is_completed(),
            JobMatchPolicy::InProgressOnly => status == RunStatus::InProgress,
        }
    }
}

/// What a failed job-list request does to the cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FetchErrorPolicy {
    /// The first failure ends the gate
    #[default]
    FailFast,
    /// The failing run is logged and counted as inactive
    ContinueOnError,
}

impl FetchErrorPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fail-fast" | "fail_fast" => Some(Self::FailFast),
            "continue" | "continue-on-error" | "continue_on_error" => Some(Self::ContinueOnError),
            _ => None,
        }
    }
}

/// Whether one run holds a watched job that is still active
pub fn run_has_active_watched_job(
    jobs: &[WorkflowJob],
    watch_jobs: &WatchList,
    policy: JobMatchPolicy,
) -> bool {
    jobs.iter()
        .any(|job| watch_jobs.contains(&job.name) && policy.is_active(job.status))
}

/// Aggregates job status over the runs of one poll cycle
pub struct JobStatusAggregator {
    repository: Arc<dyn WorkflowRepository>,
    watch_jobs: Arc<WatchList>,
    match_policy: JobMatchPolicy,
    error_policy: FetchErrorPolicy,
    semaphore: Arc<Semaphore>,
}

impl JobStatusAggregator {
    /// Creates a new aggregator
    ///
    /// # Arguments
    /// * `repository` - Source of job lists
    /// * `watch_jobs` - Job names to look for
    /// * `max_concurrent_fetches` - Upper bound on in-flight job-list requests
    pub fn new(
        repository: Arc<dyn WorkflowRepository>,
        watch_jobs: WatchList,
        match_policy: JobMatchPolicy,
        error_policy: FetchErrorPolicy,
        max_concurrent_fetches: usize,
    ) -> Self {
        let permits = max_concurrent_fetches.clamp(1, Semaphore::MAX_PERMITS);
        Self {
            repository,
            watch_jobs: Arc::new(watch_jobs),
            match_policy,
            error_policy,
            semaphore: Arc::new(Semaphore::new(permits)),
        }
    }

    pub fn watch_jobs(&self) -> &WatchList {
        &self.watch_jobs
    }

    /// Returns true if any run has a watched job that is still active
    ///
    /// Every fetch is awaited before the verdict, including under
    /// fail-fast, so no request is left dangling.
    pub async fn any_watched_job_active(&self, runs: Vec<WorkflowRun>) -> Result<bool, GateError> {
        if runs.is_empty() {
            debug!("No active workflow runs to inspect");
            return Ok(false);
        }

        let mut tasks = JoinSet::new();

        for (index, run) in runs.into_iter().enumerate() {
            let repository = Arc::clone(&self.repository);
            let watch_jobs = Arc::clone(&self.watch_jobs);
            let semaphore = Arc::clone(&self.semaphore);
            let policy = self.match_policy;

            tasks.spawn(async move {
                let outcome = match semaphore.acquire_owned().await {
                    Ok(_permit) => {
                        inspect_run(repository.as_ref(), &run, &watch_jobs, policy).await
                    }
                    Err(_) => Err(GateError::Loop("job fetch semaphore closed".to_string())),
                };
                (index, outcome)
            });
        }

        let mut outcomes = Vec::with_capacity(tasks.len());
        let mut task_failure = None;

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(entry) => outcomes.push(entry),
                Err(e) => {
                    task_failure.get_or_insert_with(|| {
                        GateError::Loop(format!("job fetch task failed: {}", e))
                    });
                }
            }
        }

        if let Some(failure) = task_failure {
            return Err(failure);
        }

        // Reduce in run order so the reported error does not depend on timing
        outcomes.sort_by_key(|(index, _)| *index);
        reduce_outcomes(
            outcomes.into_iter().map(|(_, outcome)| outcome),
            self.error_policy,
        )
    }
}

/// Fetches the jobs of one run and applies the match policy
async fn inspect_run(
    repository: &dyn WorkflowRepository,
    run: &WorkflowRun,
    watch_jobs: &WatchList,
    policy: JobMatchPolicy,
) -> Result<bool, GateError> {
    let jobs = repository
        .list_jobs(run.id)
        .await
        .map_err(|source| GateError::ListJobs {
            run_id: run.id,
            label: run.label(),
            source,
        })?;

    info!("Workflow {} has {} job(s)", run.label(), jobs.len());

    let now = chrono::Utc::now();
    for job in &jobs {
        match job.elapsed_secs(now) {
            Some(secs) if !job.status.is_completed() => {
                debug!("  job '{}': {} for {}s", job.name, job.status, secs)
            }
            _ => debug!("  job '{}': {}", job.name, job.status),
        }
    }

    Ok(run_has_active_watched_job(&jobs, watch_jobs, policy))
}

/// Folds per-run outcomes into one verdict
///
/// Only fetch errors are subject to the policy; any other error is fatal.
fn reduce_outcomes(
    outcomes: impl IntoIterator<Item = Result<bool, GateError>>,
    policy: FetchErrorPolicy,
) -> Result<bool, GateError> {
    let mut any_active = false;

    for outcome in outcomes {
        match outcome {
            Ok(active) => any_active |= active,
            Err(e) if e.is_fetch() && policy == FetchErrorPolicy::ContinueOnError => {
                error!(
                    "{:#}; treating the run as inactive",
                    anyhow::Error::from(e)
                );
            }
            Err(e) => return Err(e),
        }
    }

    Ok(any_active)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::testing::{ScriptedRepository, job, run};
    use queuegate_client::ClientError;

    fn watch() -> WatchList {
        WatchList::parse("build;deploy")
    }

    fn aggregator(
        repository: ScriptedRepository,
        error_policy: FetchErrorPolicy,
    ) -> JobStatusAggregator {
        JobStatusAggregator::new(
            Arc::new(repository),
            watch(),
            JobMatchPolicy::NotCompleted,
            error_policy,
            4,
        )
    }

    #[tokio::test]
    async fn test_oversized_fetch_limit_is_clamped() {
        let repository = ScriptedRepository::new()
            .with_jobs(1, vec![job(1, "build", RunStatus::InProgress)]);
        let aggregator = JobStatusAggregator::new(
            Arc::new(repository),
            watch(),
            JobMatchPolicy::NotCompleted,
            FetchErrorPolicy::FailFast,
            usize::MAX,
        );

        let active = aggregator
            .any_watched_job_active(vec![run(1, RunStatus::InProgress)])
            .await
            .unwrap();
        assert!(active);
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!(JobMatchPolicy::parse("In-Progress"), Some(JobMatchPolicy::InProgressOnly));
        assert_eq!(JobMatchPolicy::parse("not_completed"), Some(JobMatchPolicy::NotCompleted));
        assert_eq!(JobMatchPolicy::parse("queued"), None);
        assert_eq!(
            FetchErrorPolicy::parse("continue-on-error"),
            Some(FetchErrorPolicy::ContinueOnError)
        );
        assert_eq!(FetchErrorPolicy::parse("fail-fast"), Some(FetchErrorPolicy::FailFast));
    }

    #[test]
    fn test_in_progress_watched_job_is_active() {
        let jobs = [
            job(1, "build", RunStatus::InProgress),
            job(1, "test", RunStatus::Completed),
        ];
        assert!(run_has_active_watched_job(&jobs, &watch(), JobMatchPolicy::NotCompleted));
    }

    #[test]
    fn test_completed_watched_jobs_are_inactive() {
        let jobs = [
            job(1, "build", RunStatus::Completed),
            job(1, "test", RunStatus::Completed),
        ];
        assert!(!run_has_active_watched_job(&jobs, &watch(), JobMatchPolicy::NotCompleted));
    }

    #[test]
    fn test_unwatched_active_job_is_ignored() {
        let jobs = [job(1, "lint", RunStatus::InProgress)];
        assert!(!run_has_active_watched_job(&jobs, &watch(), JobMatchPolicy::NotCompleted));
    }

    #[test]
    fn test_queued_job_depends_on_policy() {
        let jobs = [job(1, "deploy", RunStatus::Queued)];
        assert!(run_has_active_watched_job(&jobs, &watch(), JobMatchPolicy::NotCompleted));
        assert!(!run_has_active_watched_job(&jobs, &watch(), JobMatchPolicy::InProgressOnly));

        let waiting = [job(1, "deploy", RunStatus::Waiting)];
        assert!(run_has_active_watched_job(&waiting, &watch(), JobMatchPolicy::NotCompleted));
    }

    #[test]
    fn test_reduce_fail_fast_returns_first_error_in_order() {
        let outcomes = vec![
            Ok(true),
            Err(GateError::ListJobs {
                run_id: 2,
                label: "b #2".to_string(),
                source: ClientError::api_error(500, "boom"),
            }),
            Err(GateError::ListJobs {
                run_id: 3,
                label: "c #3".to_string(),
                source: ClientError::api_error(500, "boom"),
            }),
        ];

        let err = reduce_outcomes(outcomes, FetchErrorPolicy::FailFast).unwrap_err();
        assert!(matches!(err, GateError::ListJobs { run_id: 2, .. }));
    }

    #[test]
    fn test_reduce_continue_keeps_loop_errors_fatal() {
        let outcomes = vec![Ok(false), Err(GateError::Loop("semaphore closed".to_string()))];
        let err = reduce_outcomes(outcomes, FetchErrorPolicy::ContinueOnError).unwrap_err();
        assert!(matches!(err, GateError::Loop(_)));
    }

    #[tokio::test]
    async fn test_empty_runs_are_inactive() {
        let repository = ScriptedRepository::new();
        let aggregator = aggregator(repository, FetchErrorPolicy::FailFast);

        assert!(!aggregator.any_watched_job_active(Vec::new()).await.unwrap());
    }

    #[tokio::test]
    async fn test_any_run_with_active_watched_job() {
        let repository = ScriptedRepository::new()
            .with_jobs(1, vec![job(1, "test", RunStatus::InProgress)])
            .with_jobs(2, vec![job(2, "build", RunStatus::Completed)])
            .with_jobs(3, vec![job(3, "deploy", RunStatus::Queued)]);
        let aggregator = aggregator(repository, FetchErrorPolicy::FailFast);

        let runs = vec![
            run(1, RunStatus::InProgress),
            run(2, RunStatus::InProgress),
            run(3, RunStatus::Queued),
        ];
        assert!(aggregator.any_watched_job_active(runs).await.unwrap());
    }

    #[tokio::test]
    async fn test_no_run_with_active_watched_job() {
        let repository = ScriptedRepository::new()
            .with_jobs(1, vec![job(1, "build", RunStatus::Completed)])
            .with_jobs(2, vec![job(2, "lint", RunStatus::InProgress)]);
        let aggregator = aggregator(repository, FetchErrorPolicy::FailFast);

        let runs = vec![run(1, RunStatus::InProgress), run(2, RunStatus::InProgress)];
        assert!(!aggregator.any_watched_job_active(runs).await.unwrap());
    }

    #[tokio::test]
    async fn test_fail_fast_surfaces_fetch_error() {
        let repository = ScriptedRepository::new()
            .with_jobs(1, vec![job(1, "build", RunStatus::InProgress)])
            .with_job_failure(2, 500);
        let aggregator = aggregator(repository, FetchErrorPolicy::FailFast);

        let runs = vec![run(1, RunStatus::InProgress), run(2, RunStatus::InProgress)];
        let err = aggregator.any_watched_job_active(runs).await.unwrap_err();
        assert!(matches!(err, GateError::ListJobs { run_id: 2, .. }));
    }

    #[tokio::test]
    async fn test_continue_on_error_uses_remaining_runs() {
        let repository = ScriptedRepository::new()
            .with_job_failure(1, 500)
            .with_jobs(2, vec![job(2, "deploy", RunStatus::InProgress)]);
        let aggregator = aggregator(repository, FetchErrorPolicy::ContinueOnError);

        let runs = vec![run(1, RunStatus::InProgress), run(2, RunStatus::InProgress)];
        assert!(aggregator.any_watched_job_active(runs).await.unwrap());
    }

    #[tokio::test]
    async fn test_continue_on_error_failing_run_counts_inactive() {
        let repository = ScriptedRepository::new().with_job_failure(1, 403);
        let aggregator = aggregator(repository, FetchErrorPolicy::ContinueOnError);

        let runs = vec![run(1, RunStatus::InProgress)];
        assert!(!aggregator.any_watched_job_active(runs).await.unwrap());
    }

    #[tokio::test]
    async fn test_every_run_is_fetched_once() {
        let repository = Arc::new(
            ScriptedRepository::new()
                .with_job_failure(1, 500)
                .with_jobs(2, vec![job(2, "build", RunStatus::Completed)]),
        );
        let aggregator = JobStatusAggregator::new(
            repository.clone(),
            watch(),
            JobMatchPolicy::NotCompleted,
            FetchErrorPolicy::FailFast,
            1,
        );

        let runs = (1..=5).map(|id| run(id, RunStatus::Queued)).collect();
        assert!(aggregator.any_watched_job_active(runs).await.is_err());
        assert_eq!(repository.list_jobs_calls(), 5);
    }
}
