//! Core domain types
//!
//! This module contains the core domain structures used across Queuegate crates.
//! Remote entities (runs and jobs) are fetched fresh on every poll cycle and
//! never cached, while the watch list and wait bounds are fixed for the
//! lifetime of a gate run.

pub mod job;
pub mod run;
pub mod watch;
