//! Scripted in-memory repository for tests

use async_trait::async_trait;
use queuegate_client::{ClientError, Result};
use queuegate_core::domain::job::WorkflowJob;
use queuegate_core::domain::run::{RunStatus, WorkflowRun};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::WorkflowRepository;

enum JobsReply {
    Jobs(Vec<WorkflowJob>),
    Fail(u16),
}

/// Repository answering from a script
///
/// Job replies for a run are consumed in order; the last one repeats
/// forever. Runs without a script have no jobs.
#[derive(Default)]
pub struct ScriptedRepository {
    runs: HashMap<RunStatus, Vec<WorkflowRun>>,
    failing_statuses: HashSet<RunStatus>,
    jobs: Mutex<HashMap<u64, VecDeque<JobsReply>>>,
    list_runs_calls: AtomicUsize,
    list_jobs_calls: AtomicUsize,
}

impl ScriptedRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_runs(mut self, status: RunStatus, runs: Vec<WorkflowRun>) -> Self {
        self.runs.insert(status, runs);
        self
    }

    pub fn with_run_list_failure(mut self, status: RunStatus) -> Self {
        self.failing_statuses.insert(status);
        self
    }

    pub fn with_jobs(self, run_id: u64, jobs: Vec<WorkflowJob>) -> Self {
        self.push(run_id, JobsReply::Jobs(jobs));
        self
    }

    pub fn with_job_failure(self, run_id: u64, status: u16) -> Self {
        self.push(run_id, JobsReply::Fail(status));
        self
    }

    fn push(&self, run_id: u64, reply: JobsReply) {
        self.jobs
            .lock()
            .unwrap()
            .entry(run_id)
            .or_default()
            .push_back(reply);
    }

    pub fn list_runs_calls(&self) -> usize {
        self.list_runs_calls.load(Ordering::SeqCst)
    }

    pub fn list_jobs_calls(&self) -> usize {
        self.list_jobs_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WorkflowRepository for ScriptedRepository {
    async fn list_runs(&self, status: RunStatus) -> Result<Vec<WorkflowRun>> {
        self.list_runs_calls.fetch_add(1, Ordering::SeqCst);

        if self.failing_statuses.contains(&status) {
            return Err(ClientError::api_error(502, "Bad Gateway"));
        }
        Ok(self.runs.get(&status).cloned().unwrap_or_default())
    }

    async fn list_jobs(&self, run_id: u64) -> Result<Vec<WorkflowJob>> {
        self.list_jobs_calls.fetch_add(1, Ordering::SeqCst);

        let mut script = self.jobs.lock().unwrap();
        let Some(replies) = script.get_mut(&run_id) else {
            return Ok(Vec::new());
        };

        let reply = if replies.len() > 1 {
            replies.pop_front()
        } else {
            None
        };

        match reply.as_ref().or(replies.front()) {
            Some(JobsReply::Jobs(jobs)) => Ok(jobs.clone()),
            Some(JobsReply::Fail(status)) => {
                Err(ClientError::api_error(*status, "scripted failure"))
            }
            None => Ok(Vec::new()),
        }
    }
}

pub fn run(id: u64, status: RunStatus) -> WorkflowRun {
    WorkflowRun {
        id,
        name: Some(format!("workflow-{}", id)),
        run_number: id,
        status,
        html_url: None,
        created_at: None,
    }
}

pub fn job(run_id: u64, name: &str, status: RunStatus) -> WorkflowJob {
    WorkflowJob {
        id: run_id * 100,
        run_id,
        name: name.to_string(),
        status,
        conclusion: None,
        started_at: None,
        completed_at: None,
    }
}
