//! Gate error types
//!
//! Everything that can end a poll loop early. Configuration problems are
//! reported separately by [`crate::config::ConfigError`] since they surface
//! before the loop exists.

use queuegate_client::ClientError;
use queuegate_core::domain::run::RunStatus;
use thiserror::Error;

/// Fatal errors raised while polling
#[derive(Debug, Error)]
pub enum GateError {
    /// Listing workflow runs by status failed
    #[error("Failed to list {status} workflow runs")]
    ListRuns {
        status: RunStatus,
        #[source]
        source: ClientError,
    },

    /// Listing the jobs of one workflow run failed
    #[error("Failed to fetch jobs for workflow run {run_id} ({label})")]
    ListJobs {
        run_id: u64,
        label: String,
        #[source]
        source: ClientError,
    },

    /// A fault inside a poll cycle not tied to a single request
    #[error("Poll cycle failed: {0}")]
    Loop(String),

    /// The caller cancelled the gate (interrupt or overall timeout)
    #[error("Gate cancelled before the watched jobs finished")]
    Cancelled,
}

impl GateError {
    /// Whether this error comes from a single remote request
    pub fn is_fetch(&self) -> bool {
        matches!(self, Self::ListRuns { .. } | Self::ListJobs { .. })
    }

    /// Operator hint for well-known API failures
    pub fn hint(&self) -> Option<&'static str> {
        let source = match self {
            Self::ListRuns { source, .. } | Self::ListJobs { source, .. } => source,
            _ => return None,
        };

        if source.is_rate_limited() {
            Some("the API rate limit was hit; raise min-wait-time/max-wait-time")
        } else if source.is_unauthorized() {
            Some("the token was rejected; check github-token")
        } else {
            None
        }
    }
}
