//! Service layer
//!
//! Services contain the gate's business logic: drawing randomized waits
//! and deciding whether any watched job is still active.
//!
//! Seams are trait-based so the poll loop can be driven in tests without
//! real delays or HTTP.

mod aggregator;
mod jitter;

// Re-export traits
pub use jitter::Waiter;

// Re-export implementations
pub use aggregator::{FetchErrorPolicy, JobMatchPolicy, JobStatusAggregator};
pub use jitter::{JitterTimer, WaitPhase};
