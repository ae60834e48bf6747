//! Queuegate Core
//!
//! Core types and abstractions for the Queuegate deployment gate.
//!
//! This crate contains:
//! - Domain types: Workflow runs, their jobs, the watch list and wait bounds
//! - DTOs: Paged list responses of the workflow API

pub mod domain;
pub mod dto;
