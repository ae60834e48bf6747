//! Gate poller
//!
//! Drives the poll loop as an explicit state machine. Each cycle re-reads
//! the queued and in-progress runs from the API; nothing is carried between
//! cycles except the watch list and the wait bounds.
//!
//! The loop has no deadline of its own. Callers layer one on through the
//! cancellation token.

use queuegate_core::domain::run::{RunStatus, WorkflowRun};
use queuegate_core::domain::watch::WaitBounds;
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::GateError;
use crate::repository::WorkflowRepository;
use crate::service::{JobStatusAggregator, WaitPhase, Waiter};

/// State of the poll loop
#[derive(Debug)]
pub enum PollState {
    /// Initial randomized wait
    PreWait,
    /// Polling; `cycle` counts from 1
    Polling { cycle: u64 },
    /// No watched job is active
    Done(PollReport),
    /// Polling stopped on a fatal error
    Failed(GateError),
}

/// Summary of a finished poll loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollReport {
    /// Poll cycles performed
    pub cycles: u64,
    /// Waits performed, the pre-start wait included
    pub waits: u64,
}

/// Poller that blocks until no watched job is active
pub struct GatePoller {
    repository: Arc<dyn WorkflowRepository>,
    aggregator: JobStatusAggregator,
    waiter: Arc<dyn Waiter>,
    start_bounds: WaitBounds,
    poll_bounds: WaitBounds,
}

impl GatePoller {
    /// Creates a new gate poller
    pub fn new(
        config: &Config,
        repository: Arc<dyn WorkflowRepository>,
        waiter: Arc<dyn Waiter>,
    ) -> Self {
        let aggregator = JobStatusAggregator::new(
            Arc::clone(&repository),
            config.watch_jobs.clone(),
            config.match_policy,
            config.error_policy,
            config.max_concurrent_fetches,
        );

        Self {
            repository,
            aggregator,
            waiter,
            start_bounds: config.start_bounds,
            poll_bounds: config.poll_bounds,
        }
    }

    /// Runs the loop until it reaches `Done` or `Failed`
    pub async fn run(&self, cancel: CancellationToken) -> Result<PollReport, GateError> {
        info!(
            "Starting gate poller (watching: {}, start wait {}, poll wait {})",
            self.aggregator.watch_jobs(),
            self.start_bounds,
            self.poll_bounds
        );

        let mut state = PollState::PreWait;
        let mut waits = 0;

        loop {
            state = match state {
                PollState::PreWait => {
                    if self.pause(self.start_bounds, WaitPhase::BeforeStart, &cancel).await {
                        waits += 1;
                        PollState::Polling { cycle: 1 }
                    } else {
                        PollState::Failed(GateError::Cancelled)
                    }
                }
                PollState::Polling { cycle } => {
                    if cancel.is_cancelled() {
                        PollState::Failed(GateError::Cancelled)
                    } else {
                        match self.poll_once(cycle).await {
                            Ok(false) => PollState::Done(PollReport {
                                cycles: cycle,
                                waits,
                            }),
                            Ok(true) => {
                                info!(
                                    "Job(s) named {} still running",
                                    self.aggregator.watch_jobs()
                                );
                                if self
                                    .pause(self.poll_bounds, WaitPhase::BetweenPolls, &cancel)
                                    .await
                                {
                                    waits += 1;
                                    PollState::Polling { cycle: cycle + 1 }
                                } else {
                                    PollState::Failed(GateError::Cancelled)
                                }
                            }
                            Err(e) => PollState::Failed(e),
                        }
                    }
                }
                PollState::Done(report) => {
                    info!(
                        "No watched job is running after {} poll cycle(s)",
                        report.cycles
                    );
                    return Ok(report);
                }
                PollState::Failed(e) => {
                    if let Some(hint) = e.hint() {
                        warn!("Hint: {}", hint);
                    }
                    return Err(e);
                }
            };
        }
    }

    /// Performs a single poll cycle
    ///
    /// Returns true if a watched job is still active.
    async fn poll_once(&self, cycle: u64) -> Result<bool, GateError> {
        debug!("Poll cycle {}", cycle);

        let runs = self.fetch_active_runs().await?;
        self.aggregator.any_watched_job_active(runs).await
    }

    /// Lists queued and in-progress runs
    ///
    /// Both lists are requested concurrently and both are awaited even if
    /// one fails. A run seen in both lists is kept once.
    async fn fetch_active_runs(&self) -> Result<Vec<WorkflowRun>, GateError> {
        let (queued, in_progress) = tokio::join!(
            self.list_runs(RunStatus::Queued),
            self.list_runs(RunStatus::InProgress)
        );
        let (queued, in_progress) = (queued?, in_progress?);

        info!(
            "Retrieved {} queued and {} in-progress workflow run(s)",
            queued.len(),
            in_progress.len()
        );

        let mut seen = HashSet::new();
        Ok(queued
            .into_iter()
            .chain(in_progress)
            .filter(|run| seen.insert(run.id))
            .collect())
    }

    async fn list_runs(&self, status: RunStatus) -> Result<Vec<WorkflowRun>, GateError> {
        self.repository
            .list_runs(status)
            .await
            .map_err(|source| GateError::ListRuns { status, source })
    }

    /// Waits unless cancelled first; returns false on cancellation
    async fn pause(
        &self,
        bounds: WaitBounds,
        phase: WaitPhase,
        cancel: &CancellationToken,
    ) -> bool {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!("Cancelled while waiting {}", phase);
                false
            }
            _ = self.waiter.wait(bounds, phase) => true,
        }
    }
}
