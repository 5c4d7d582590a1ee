// src/exec/mod.rs

//! Process execution layer.
//!
//! This module runs `blastn` for one job at a time using
//! `tokio::process::Command` and reports back to the orchestrator through
//! the worker message channel.
//!
//! - [`command`] builds the `blastn` invocation for an input file.
//! - [`process`] spawns it, collects output and delivers stop signals.
//! - [`worker`] owns one job: progress, outcome classification,
//!   relocation, and the termination control block.
//! - [`relocate`] moves an analysed input into `processed/`.
//! - [`backend`] provides the `WorkerBackend` trait and a concrete
//!   `RealWorkerBackend` that the runtime uses in production, and which
//!   tests can replace with a fake implementation.

pub mod backend;
pub mod command;
pub mod process;
pub mod relocate;
pub mod worker;

pub use backend::{RealWorkerBackend, WorkerBackend, WorkerHandle};
pub use command::BlastCommand;
pub use worker::{TerminationOutcome, Worker, WorkerControl};
