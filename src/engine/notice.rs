// src/engine/notice.rs

//! User-facing notifications produced by the orchestrator.
//!
//! The core only describes *what* happened; turning a notice into text is
//! the job of [`crate::report`].

use std::path::PathBuf;

use crate::engine::FailureKind;
use crate::queue::RemoveOutcome;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Enqueued {
        added: usize,
        duplicates: Vec<PathBuf>,
    },
    Removed(RemoveOutcome),
    Cleared {
        removed: usize,
    },
    /// `start()` found no queued item.
    NothingToDo,
    /// `start()` while a job is already running.
    AlreadyRunning,
    /// The run configuration failed the pre-start checks.
    ConfigInvalid(String),
    ConfigUpdated,
    /// Configuration edit refused because a job is running.
    ConfigLocked,
    /// `request_stop()` while idle.
    NotRunning,
    StopRequested,
    Started {
        item: PathBuf,
    },
    Progress {
        item: PathBuf,
        value: u8,
        text: String,
    },
    ItemDone {
        item: PathBuf,
    },
    ItemFailed {
        item: PathBuf,
        kind: FailureKind,
        detail: String,
    },
    /// Analysis succeeded but relocation to `processed/` failed.
    MoveWarning {
        item: PathBuf,
        detail: String,
    },
    /// A stop request took effect after the current job ended.
    Stopped,
    /// The queue ran dry. `errored` counts failures since the last start.
    Finished {
        done: usize,
        errored: usize,
    },
    /// Shutdown is terminating the running job.
    Terminating {
        item: PathBuf,
    },
}
