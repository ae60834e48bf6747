//! Queuegate
//!
//! A deployment gate that blocks a workflow step until a named set of jobs
//! is no longer running in the repository.
//!
//! Architecture:
//! - Configuration: Inputs from flags or the action environment
//! - Repositories: HTTP communication with the Actions API
//! - Services: Jitter timer and job status aggregation
//! - Scheduler: The poll loop state machine
//!
//! The gate waits a random time, then polls queued and in-progress runs,
//! inspecting their jobs, until none of the watched jobs is active.

mod config;
mod error;
mod output;
mod repository;
mod scheduler;
mod service;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, GateArgs};
use crate::output::ActionOutput;
use crate::repository::{HttpWorkflowRepository, WorkflowRepository};
use crate::scheduler::GatePoller;
use crate::service::{JitterTimer, Waiter};
use queuegate_client::ActionsClient;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging; stdout is reserved for action output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "queuegate=info,queuegate_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(GateArgs::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Gate failed: {:#}", e);
            println!("{}", output::error_annotation(&format!("{:#}", e)));
            ExitCode::FAILURE
        }
    }
}

async fn run(args: GateArgs) -> Result<()> {
    let config = Config::from_args(args).context("Invalid configuration")?;
    let client = ActionsClient::new(
        config.api_url.clone(),
        config.owner.clone(),
        config.repo.clone(),
        config.token.expose(),
    )
    .context("Failed to initialize API client")?;

    info!(
        "Loaded configuration: repository={}, api_url={}, watch_jobs=[{}]",
        client.repository(),
        client.base_url(),
        config.watch_jobs
    );
    info!(
        "Match policy: {:?}, error policy: {:?}, max concurrent fetches: {}",
        config.match_policy, config.error_policy, config.max_concurrent_fetches
    );

    let repository: Arc<dyn WorkflowRepository> = Arc::new(HttpWorkflowRepository::new(client));
    let waiter: Arc<dyn Waiter> = Arc::new(JitterTimer::default());
    let poller = GatePoller::new(&config, repository, waiter);

    let cancel = CancellationToken::new();
    spawn_cancel_triggers(cancel.clone(), config.timeout);

    let report = poller.run(cancel).await?;
    info!(
        "Gate open after {} poll cycle(s) and {} wait(s)",
        report.cycles, report.waits
    );

    ActionOutput::from_env().set("status", "ready")?;
    println!(
        "{} {}",
        "No job with names".green(),
        format!("{} is running. Proceeding with the deployment.", config.watch_jobs).bold()
    );

    Ok(())
}

/// Cancels the poll loop on interrupt, or once `timeout` has elapsed
fn spawn_cancel_triggers(cancel: CancellationToken, timeout: Option<Duration>) {
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping the gate");
            interrupt.cancel();
        }
    });

    if let Some(timeout) = timeout {
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            warn!("Gate timeout of {}s elapsed", timeout.as_secs());
            cancel.cancel();
        });
    }
}
