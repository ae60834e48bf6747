//! Data Transfer Objects for the workflow API
//!
//! Wire shapes of the two list endpoints consumed by the gate. Both are
//! paged and wrap their items next to a `total_count`.

pub mod job;
pub mod run;
