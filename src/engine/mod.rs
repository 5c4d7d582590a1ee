// src/engine/mod.rs

//! Orchestration engine for blastq.
//!
//! This module ties together:
//! - the job list and run state machine (what runs next, when to stop)
//! - the worker message channel (progress / completion / failure)
//! - the control surface events (enqueue, remove, clear, start, stop,
//!   shutdown)
//!
//! The pure core state machine lives in [`core`] with the per-message logic
//! in [`event_handlers`]; the async/IO shell that polls the channel and talks
//! to the worker backend is implemented in [`runtime`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::sync::mpsc;

use crate::config::{RunConfig, RuntimeSection};
use crate::types::DrainPolicy;

/// Classification of a failed job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The aligner binary could not be started because it does not exist.
    ExecutableNotFound,
    /// The aligner ran and exited non-zero; detail carries its stderr.
    ProcessExecutionFailed,
    /// The analysis succeeded but the input could not be moved to
    /// `processed/`. Not an error for the job itself.
    FileMoveFailed,
    /// Anything else caught at the worker boundary.
    Unexpected,
}

/// Messages flowing from a worker to the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerMessage {
    Progress {
        item: PathBuf,
        value: u8,
        text: String,
    },
    Completed {
        item: PathBuf,
    },
    Failed {
        item: PathBuf,
        kind: FailureKind,
        detail: String,
    },
}

impl WorkerMessage {
    pub fn item(&self) -> &Path {
        match self {
            WorkerMessage::Progress { item, .. }
            | WorkerMessage::Completed { item }
            | WorkerMessage::Failed { item, .. } => item,
        }
    }

    /// Whether this message ends the job it refers to.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, WorkerMessage::Progress { .. })
    }
}

pub type MessageSender = mpsc::UnboundedSender<WorkerMessage>;
pub type MessageReceiver = mpsc::UnboundedReceiver<WorkerMessage>;

/// Create the worker -> controller message channel.
pub fn message_channel() -> (MessageSender, MessageReceiver) {
    mpsc::unbounded_channel()
}

/// One job handed to a worker: the input and the config snapshot taken at
/// dispatch time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub item: PathBuf,
    pub config: RunConfig,
}

/// Requests coming from the control surface (CLI, Ctrl-C handler, tests).
#[derive(Debug, Clone)]
pub enum ControlEvent {
    Enqueue(Vec<PathBuf>),
    RemoveSelected(Vec<usize>),
    Clear,
    Start,
    /// Finish the current job, then stop dispatching.
    RequestStop,
    /// Replace the live run configuration. Rejected while running.
    UpdateConfig(RunConfig),
    /// Terminate any live worker and exit.
    Shutdown,
}

/// Externally visible run state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    /// Running, but no further job will be dispatched.
    StopPending,
}

/// Options used by both the core and the async shell.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeOptions {
    /// If true, exit the runtime once the orchestrator goes idle after a
    /// start attempt (used by the CLI).
    pub exit_when_idle: bool,
    pub poll_interval: Duration,
    pub drain: DrainPolicy,
    pub termination_grace: Duration,
}

impl RuntimeOptions {
    pub fn from_config(runtime: &RuntimeSection, exit_when_idle: bool) -> Self {
        Self {
            exit_when_idle,
            poll_interval: runtime.poll_interval(),
            drain: runtime.drain,
            termination_grace: runtime.termination_grace(),
        }
    }
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self::from_config(&RuntimeSection::default(), false)
    }
}

pub mod core;
pub mod event_handlers;
pub mod inbox;
pub mod notice;
pub mod runtime;

pub use self::core::{Orchestrator, RunSummary};
pub use self::event_handlers::{CoreCommand, CoreStep};
pub use self::inbox::Inbox;
pub use self::notice::Notice;
pub use self::runtime::Runtime;
