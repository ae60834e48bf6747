//! Scheduler layer for the gate
//!
//! This layer runs the poll loop: one randomized wait before the first
//! poll, then poll cycles separated by randomized waits until no watched
//! job is active.

pub mod poller;

pub use poller::GatePoller;
