// src/engine/event_handlers.rs

//! Worker message handling for the core runtime.

use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::engine::{FailureKind, Job, Notice, WorkerMessage};
use crate::queue::JobList;
use crate::types::JobStatus;

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Spawn a worker for this job.
    Dispatch(Job),
    /// The running job reached a terminal message; drop its worker handle.
    ReleaseWorker,
    /// Ask the live worker to terminate (graceful, then forced).
    TerminateWorker,
    /// Request that the runtime exits.
    RequestExit,
}

/// Decision returned by the core after handling a single event or message.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute.
    pub commands: Vec<CoreCommand>,
    /// Notifications for the presentation layer, in order.
    pub notices: Vec<Notice>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            notices: Vec::new(),
            keep_running: true,
        }
    }

    pub(crate) fn with_notice(notice: Notice) -> Self {
        let mut step = Self::new();
        step.notices.push(notice);
        step
    }

    /// Append another step's commands and notices after ours.
    pub(crate) fn merge(&mut self, other: CoreStep) {
        self.commands.extend(other.commands);
        self.notices.extend(other.notices);
        self.keep_running &= other.keep_running;
    }

    /// The job dispatched by this step, if any.
    pub fn dispatched(&self) -> Option<&Job> {
        self.commands.iter().find_map(|c| match c {
            CoreCommand::Dispatch(job) => Some(job),
            _ => None,
        })
    }
}

impl Default for CoreStep {
    fn default() -> Self {
        Self::new()
    }
}

/// Mutable run flags owned by the orchestrator.
#[derive(Debug, Clone, Default)]
pub(crate) struct RunFlags {
    pub is_running: bool,
    pub stop_requested: bool,
    pub running_item: Option<PathBuf>,
    /// Jobs that ended successfully since the last user `start()`.
    pub done: usize,
    /// Jobs that ended `Errored` since the last user `start()`.
    pub errored: usize,
}

/// What the core does once the running job has ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FollowUp {
    /// Dispatch the next queued item.
    Advance,
    /// A pending stop took effect.
    Stopped,
    /// Nothing left to run.
    Finished,
}

/// Handle a `Progress` message: display only, no transition.
pub(crate) fn handle_progress(
    flags: &RunFlags,
    item: PathBuf,
    value: u8,
    text: String,
) -> CoreStep {
    if flags.running_item.as_deref() != Some(item.as_path()) {
        debug!(item = %item.display(), "progress for an item that is not running; ignoring");
        return CoreStep::new();
    }
    CoreStep::with_notice(Notice::Progress { item, value, text })
}

/// Handle a `Completed` or `Failed` message for the running item.
///
/// Returns `None` for messages that do not refer to the running item; those
/// change nothing.
pub(crate) fn handle_terminal(
    jobs: &mut JobList,
    flags: &mut RunFlags,
    message: WorkerMessage,
) -> Option<(CoreStep, FollowUp)> {
    if flags.running_item.as_deref() != Some(message.item()) {
        warn!(
            item = %message.item().display(),
            running = ?flags.running_item,
            "terminal message for an item that is not running; ignoring"
        );
        return None;
    }

    let mut step = CoreStep::new();

    let (item, status) = match message {
        WorkerMessage::Completed { item } => {
            info!(item = %item.display(), "job completed");
            step.notices.push(Notice::ItemDone { item: item.clone() });
            (item, JobStatus::Done)
        }
        WorkerMessage::Failed {
            item,
            kind: FailureKind::FileMoveFailed,
            detail,
        } => {
            warn!(item = %item.display(), %detail, "job completed but relocation failed");
            step.notices.push(Notice::MoveWarning {
                item: item.clone(),
                detail,
            });
            step.notices.push(Notice::ItemDone { item: item.clone() });
            (item, JobStatus::Done)
        }
        WorkerMessage::Failed { item, kind, detail } => {
            warn!(item = %item.display(), ?kind, "job failed");
            step.notices.push(Notice::ItemFailed {
                item: item.clone(),
                kind,
                detail,
            });
            (item, JobStatus::Errored)
        }
        WorkerMessage::Progress { .. } => return None,
    };

    if !jobs.finish(&item, status) {
        warn!(item = %item.display(), ?status, "running item missing from job list");
    }
    match status {
        JobStatus::Errored => flags.errored += 1,
        _ => flags.done += 1,
    }

    flags.running_item = None;
    flags.is_running = false;
    step.commands.push(CoreCommand::ReleaseWorker);

    let follow_up = if flags.stop_requested {
        flags.stop_requested = false;
        info!("stop request honoured; orchestrator idle");
        step.notices.push(Notice::Stopped);
        FollowUp::Stopped
    } else if jobs.has_queued() {
        FollowUp::Advance
    } else {
        info!(done = flags.done, errored = flags.errored, "queue exhausted");
        step.notices.push(Notice::Finished {
            done: flags.done,
            errored: flags.errored,
        });
        FollowUp::Finished
    };

    Some((step, follow_up))
}
