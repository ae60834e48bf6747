//! Jitter timer
//!
//! Randomized waits keep concurrent gates in the same repository from
//! polling the API in lockstep.

use async_trait::async_trait;
use queuegate_core::domain::watch::WaitBounds;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::info;

/// Which wait of the poll loop is running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitPhase {
    /// The single wait before the first poll
    BeforeStart,
    /// A wait after a poll that found watched jobs still active
    BetweenPolls,
}

impl fmt::Display for WaitPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitPhase::BeforeStart => f.write_str("before the first poll"),
            WaitPhase::BetweenPolls => f.write_str("before the next poll"),
        }
    }
}

/// Suspends the caller for a duration chosen within `bounds`
#[async_trait]
pub trait Waiter: Send + Sync {
    /// Waits and returns how long it waited
    async fn wait(&self, bounds: WaitBounds, phase: WaitPhase) -> Duration;
}

/// Waiter drawing whole seconds uniformly from `[min, max]`
///
/// The generator is seeded once when the timer is built, so repeated
/// waits in one process are not correlated.
pub struct JitterTimer {
    rng: Mutex<StdRng>,
}

impl Default for JitterTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl JitterTimer {
    /// Creates a timer seeded from OS entropy
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Creates a timer with a fixed seed
    #[cfg(test)]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Draws a delay without waiting
    pub fn sample(&self, bounds: WaitBounds) -> Duration {
        let secs = self
            .rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .gen_range(bounds.min()..=bounds.max());
        Duration::from_secs(secs)
    }
}

#[async_trait]
impl Waiter for JitterTimer {
    async fn wait(&self, bounds: WaitBounds, phase: WaitPhase) -> Duration {
        let delay = self.sample(bounds);
        info!("Waiting {}s {} (range {})", delay.as_secs(), phase, bounds);
        tokio::time::sleep(delay).await;
        delay
    }
}
