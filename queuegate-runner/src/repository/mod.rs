//! Repository layer
//!
//! Repositories abstract communication with the workflow API. They expose
//! the two read operations the gate consumes without any business logic.
//!
//! The trait seam lets the aggregator and poller run against scripted
//! in-memory implementations in tests.

mod workflows;

#[cfg(test)]
pub mod testing;

// Re-export trait
pub use workflows::WorkflowRepository;

// Re-export implementation
pub use workflows::HttpWorkflowRepository;
