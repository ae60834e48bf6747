//! Watch list and wait bounds
//!
//! Both are built once from configuration and stay immutable for the whole
//! gate run.

use std::fmt;
use std::time::Duration;

/// Ordered list of job names the gate waits on
///
/// Matching is exact and case-sensitive. Duplicates are harmless.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchList(Vec<String>);

impl WatchList {
    /// Parses a `;` or `,` delimited list, trimming entries and dropping
    /// empty ones
    pub fn parse(input: &str) -> Self {
        Self(
            input
                .split([';', ','])
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|watched| watched == name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for WatchList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(", "))
    }
}

/// Inclusive range of whole seconds a randomized wait is drawn from
///
/// Invariant: `1 <= min <= max`. The only way to build one is through
/// [`WaitBounds::new`], which enforces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitBounds {
    min: u64,
    max: u64,
}

impl WaitBounds {
    /// Returns `None` when `min` is zero or `max < min`
    pub fn new(min: u64, max: u64) -> Option<Self> {
        if min == 0 || max < min {
            return None;
        }
        Some(Self { min, max })
    }

    pub fn min(&self) -> u64 {
        self.min
    }

    pub fn max(&self) -> u64 {
        self.max
    }

    pub fn min_duration(&self) -> Duration {
        Duration::from_secs(self.min)
    }

    pub fn max_duration(&self) -> Duration {
        Duration::from_secs(self.max)
    }
}

impl fmt::Display for WaitBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s..={}s", self.min, self.max)
    }
}
