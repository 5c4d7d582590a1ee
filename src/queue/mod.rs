// src/queue/mod.rs

//! Job queue owned by the orchestrator.
//!
//! - [`job`] holds a single item and its status transitions.
//! - [`list`] keeps items in enqueue order and implements the list edits
//!   (enqueue / remove selected / clear) plus dispatch selection.

pub mod job;
pub mod list;

pub use job::JobItem;
pub use list::{EnqueueRejected, JobList, RemoveOutcome};
