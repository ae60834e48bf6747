//! Gate configuration
//!
//! Every input can be given as a flag or through the environment variable
//! GitHub Actions sets for an action input (`INPUT_<NAME>`). Raw values are
//! collected as strings by [`GateArgs`] and validated into a [`Config`]
//! before any request is made.

use clap::Parser;
use queuegate_core::domain::watch::{WaitBounds, WatchList};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;

use crate::service::{FetchErrorPolicy, JobMatchPolicy};

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_MIN_WAIT_SECS: u64 = 15;
pub const DEFAULT_MAX_WAIT_SECS: u64 = 30;
pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 8;

/// Raw gate inputs
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "queuegate")]
#[command(about = "Wait until watched workflow jobs are no longer running", long_about = None)]
pub struct GateArgs {
    /// Job names to wait for, separated by `;` or `,`
    #[arg(long, env = "INPUT_WATCH-JOBS")]
    pub watch_jobs: Option<String>,

    /// Former name of `watch-jobs`, used when `watch-jobs` is not set
    #[arg(long, env = "INPUT_QUEUE-JOBS", hide = true)]
    pub queue_jobs: Option<String>,

    /// Minimum seconds between polls
    #[arg(long, env = "INPUT_MIN-WAIT-TIME")]
    pub min_wait_time: Option<String>,

    /// Maximum seconds between polls
    #[arg(long, env = "INPUT_MAX-WAIT-TIME")]
    pub max_wait_time: Option<String>,

    /// Minimum seconds to wait before the first poll
    #[arg(long, env = "INPUT_MIN-WAIT-BEFORE-START-TIME")]
    pub min_wait_before_start_time: Option<String>,

    /// Maximum seconds to wait before the first poll
    #[arg(long, env = "INPUT_MAX-WAIT-BEFORE-START-TIME")]
    pub max_wait_before_start_time: Option<String>,

    /// API token
    #[arg(long, env = "INPUT_GITHUB-TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Token provided by the workflow environment, used when no token input is set
    #[arg(long, env = "GITHUB_TOKEN", hide = true, hide_env_values = true)]
    pub env_token: Option<String>,

    /// Repository to inspect, as `owner/repo`
    #[arg(long, env = "GITHUB_REPOSITORY")]
    pub repository: Option<String>,

    /// API base URL
    #[arg(long, env = "GITHUB_API_URL")]
    pub api_url: Option<String>,

    /// Which watched jobs block: `not-completed` or `in-progress`
    #[arg(long, env = "INPUT_MATCH-POLICY")]
    pub match_policy: Option<String>,

    /// How job fetch failures are handled: `fail-fast` or `continue`
    #[arg(long, env = "INPUT_ERROR-POLICY")]
    pub error_policy: Option<String>,

    /// Maximum number of job lists fetched at once
    #[arg(long, env = "INPUT_MAX-CONCURRENT-FETCHES")]
    pub max_concurrent_fetches: Option<String>,

    /// Give up after this many seconds
    #[arg(long, env = "INPUT_TIMEOUT")]
    pub timeout: Option<String>,
}

/// Configuration problems detected before polling starts
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("watch-jobs input is required and must name at least one job")]
    MissingWatchJobs,

    #[error("{input} must be an integer, got '{value}'")]
    InvalidNumber { input: &'static str, value: String },

    #[error("{input} must be a positive integer")]
    NonPositive { input: &'static str },

    #[error("{input} must not exceed {max}")]
    TooLarge { input: &'static str, max: u64 },

    #[error("{max_input} ({max}) must be greater than or equal to {min_input} ({min})")]
    MaxBelowMin {
        min_input: &'static str,
        max_input: &'static str,
        min: u64,
        max: u64,
    },

    #[error("github-token input is required")]
    MissingToken,

    #[error("repository is required (set GITHUB_REPOSITORY or --repository)")]
    MissingRepository,

    #[error("repository must look like 'owner/repo', got '{0}'")]
    InvalidRepository(String),

    #[error("api-url must start with http:// or https://, got '{0}'")]
    InvalidApiUrl(String),

    #[error("{input} has unknown value '{value}'")]
    InvalidPolicy { input: &'static str, value: String },
}

/// API credential, kept out of debug output
#[derive(Clone, PartialEq, Eq)]
pub struct ApiToken(String);

impl ApiToken {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiToken(<redacted>)")
    }
}

/// Validated gate configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Job names the gate waits on
    pub watch_jobs: WatchList,

    /// Delay drawn between two polls
    pub poll_bounds: WaitBounds,

    /// Delay drawn once before the first poll
    pub start_bounds: WaitBounds,

    pub token: ApiToken,

    pub owner: String,
    pub repo: String,
    pub api_url: String,

    pub match_policy: JobMatchPolicy,
    pub error_policy: FetchErrorPolicy,

    /// Upper bound on concurrent job-list requests in one cycle
    pub max_concurrent_fetches: usize,

    /// Overall deadline armed by the driver; the poll loop itself is unbounded
    pub timeout: Option<Duration>,
}

impl Config {
    /// Validates raw inputs into a configuration
    ///
    /// Empty values count as absent, which is how unset action inputs arrive.
    pub fn from_args(args: GateArgs) -> Result<Self, ConfigError> {
        let watch_jobs = non_empty(args.watch_jobs.as_deref())
            .or_else(|| non_empty(args.queue_jobs.as_deref()))
            .map(WatchList::parse)
            .filter(|list| !list.is_empty())
            .ok_or(ConfigError::MissingWatchJobs)?;

        let poll_bounds = parse_bounds(
            ("min-wait-time", args.min_wait_time.as_deref()),
            ("max-wait-time", args.max_wait_time.as_deref()),
        )?;

        let start_bounds = parse_bounds(
            (
                "min-wait-before-start-time",
                args.min_wait_before_start_time.as_deref(),
            ),
            (
                "max-wait-before-start-time",
                args.max_wait_before_start_time.as_deref(),
            ),
        )?;

        let token = non_empty(args.github_token.as_deref())
            .or_else(|| non_empty(args.env_token.as_deref()))
            .map(|token| ApiToken(token.to_string()))
            .ok_or(ConfigError::MissingToken)?;

        let repository =
            non_empty(args.repository.as_deref()).ok_or(ConfigError::MissingRepository)?;
        let (owner, repo) = parse_repository(repository)?;

        let api_url = non_empty(args.api_url.as_deref())
            .unwrap_or(DEFAULT_API_URL)
            .to_string();
        if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
            return Err(ConfigError::InvalidApiUrl(api_url));
        }

        let match_policy = match non_empty(args.match_policy.as_deref()) {
            None => JobMatchPolicy::default(),
            Some(value) => {
                JobMatchPolicy::parse(value).ok_or_else(|| ConfigError::InvalidPolicy {
                    input: "match-policy",
                    value: value.to_string(),
                })?
            }
        };

        let error_policy = match non_empty(args.error_policy.as_deref()) {
            None => FetchErrorPolicy::default(),
            Some(value) => {
                FetchErrorPolicy::parse(value).ok_or_else(|| ConfigError::InvalidPolicy {
                    input: "error-policy",
                    value: value.to_string(),
                })?
            }
        };

        let max_concurrent_fetches = match parse_positive(
            "max-concurrent-fetches",
            args.max_concurrent_fetches.as_deref(),
        )? {
            None => DEFAULT_MAX_CONCURRENT_FETCHES,
            Some(n) if n > Semaphore::MAX_PERMITS as u64 => {
                return Err(ConfigError::TooLarge {
                    input: "max-concurrent-fetches",
                    max: Semaphore::MAX_PERMITS as u64,
                });
            }
            Some(n) => n as usize,
        };

        let timeout = parse_positive("timeout", args.timeout.as_deref())?.map(Duration::from_secs);

        Ok(Self {
            watch_jobs,
            poll_bounds,
            start_bounds,
            token,
            owner,
            repo,
            api_url,
            match_policy,
            error_policy,
            max_concurrent_fetches,
            timeout,
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Parses an optional strictly positive integer input
fn parse_positive(input: &'static str, raw: Option<&str>) -> Result<Option<u64>, ConfigError> {
    let Some(raw) = non_empty(raw) else {
        return Ok(None);
    };

    let value: i64 = raw.parse().map_err(|_| ConfigError::InvalidNumber {
        input,
        value: raw.to_string(),
    })?;

    if value <= 0 {
        return Err(ConfigError::NonPositive { input });
    }

    Ok(Some(value as u64))
}

fn parse_bounds(
    (min_input, min_raw): (&'static str, Option<&str>),
    (max_input, max_raw): (&'static str, Option<&str>),
) -> Result<WaitBounds, ConfigError> {
    let min = parse_positive(min_input, min_raw)?.unwrap_or(DEFAULT_MIN_WAIT_SECS);
    let max = parse_positive(max_input, max_raw)?.unwrap_or(DEFAULT_MAX_WAIT_SECS);

    WaitBounds::new(min, max).ok_or(ConfigError::MaxBelowMin {
        min_input,
        max_input,
        min,
        max,
    })
}

fn parse_repository(value: &str) -> Result<(String, String), ConfigError> {
    match value.split_once('/') {
        Some((owner, repo))
            if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') =>
        {
            Ok((owner.to_string(), repo.to_string()))
        }
        _ => Err(ConfigError::InvalidRepository(value.to_string())),
    }
}

/// Minimal valid configuration for unit tests
#[cfg(test)]
pub fn test_config(watch_jobs: &str) -> Config {
    Config::from_args(GateArgs {
        watch_jobs: Some(watch_jobs.to_string()),
        github_token: Some("test-token".to_string()),
        repository: Some("octo-org/octo-repo".to_string()),
        min_wait_time: Some("1".to_string()),
        max_wait_time: Some("2".to_string()),
        min_wait_before_start_time: Some("1".to_string()),
        max_wait_before_start_time: Some("1".to_string()),
        ..GateArgs::default()
    })
    .unwrap()
}
