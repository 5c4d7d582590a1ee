// src/engine/core.rs

//! Pure orchestrator state machine.
//!
//! [`Orchestrator`] consumes [`ControlEvent`]s and [`WorkerMessage`]s and
//! produces a [`CoreStep`]: the commands the IO shell should carry out plus
//! the notices to show the user.
//!
//! The async shell (`engine::runtime::Runtime`) is responsible for:
//! - reading control events and polling the worker channel
//! - spawning and terminating workers through a backend
//! - forwarding notices to the presentation layer
//!
//! The only IO performed here is the existence check on the configured
//! executable and database, done through the [`FileSystem`] trait so tests
//! can use a mock.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::{check_run_config, RunConfig};
use crate::engine::event_handlers::{
    handle_progress, handle_terminal, CoreCommand, CoreStep, FollowUp, RunFlags,
};
use crate::engine::{
    ControlEvent, FailureKind, Job, Notice, RunState, RuntimeOptions, WorkerMessage,
};
use crate::fs::FileSystem;
use crate::queue::{EnqueueRejected, JobList};
use crate::types::JobStatus;

/// Counts reported when the runtime exits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub done: usize,
    pub errored: usize,
    pub queued: usize,
    /// The last start attempt was refused because the configuration did not
    /// pass the pre-start checks.
    pub config_rejected: bool,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.errored == 0 && !self.config_rejected
    }
}

/// Job list plus run flags. At most one job is `Running` at any time.
#[derive(Debug)]
pub struct Orchestrator {
    jobs: JobList,
    config: RunConfig,
    fs: Arc<dyn FileSystem>,
    flags: RunFlags,
    options: RuntimeOptions,
    config_rejected: bool,
}

impl Orchestrator {
    pub fn new(config: RunConfig, fs: Arc<dyn FileSystem>, options: RuntimeOptions) -> Self {
        Self {
            jobs: JobList::new(),
            config,
            fs,
            flags: RunFlags::default(),
            options,
            config_rejected: false,
        }
    }

    pub fn jobs(&self) -> &JobList {
        &self.jobs
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.flags.is_running
    }

    pub fn stop_requested(&self) -> bool {
        self.flags.stop_requested
    }

    pub fn running_item(&self) -> Option<&Path> {
        self.flags.running_item.as_deref()
    }

    pub fn run_state(&self) -> RunState {
        match (self.flags.is_running, self.flags.stop_requested) {
            (false, _) => RunState::Idle,
            (true, false) => RunState::Running,
            (true, true) => RunState::StopPending,
        }
    }

    /// Whether the shell should keep polling the worker channel.
    ///
    /// Polling continues while a job runs or while messages are still
    /// buffered, so late messages are never stranded.
    pub fn wants_poll(&self, channel_empty: bool) -> bool {
        self.flags.is_running || !channel_empty
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            done: self.jobs.count(JobStatus::Done),
            errored: self.jobs.count(JobStatus::Errored),
            queued: self.jobs.count(JobStatus::Queued),
            config_rejected: self.config_rejected,
        }
    }

    /// Handle a single control-surface event.
    pub fn handle_control(&mut self, event: ControlEvent) -> CoreStep {
        debug!(?event, "control event");
        match event {
            ControlEvent::Enqueue(paths) => self.enqueue(paths),
            ControlEvent::RemoveSelected(indices) => self.remove_selected(&indices),
            ControlEvent::Clear => self.clear(),
            ControlEvent::Start => self.start(),
            ControlEvent::RequestStop => self.request_stop(),
            ControlEvent::UpdateConfig(config) => self.update_config(config),
            ControlEvent::Shutdown => self.shutdown(),
        }
    }

    /// Handle one message drained from the worker channel.
    pub fn handle_message(&mut self, message: WorkerMessage) -> CoreStep {
        match message {
            WorkerMessage::Progress { item, value, text } => {
                handle_progress(&self.flags, item, value, text)
            }
            terminal => match handle_terminal(&mut self.jobs, &mut self.flags, terminal) {
                None => CoreStep::new(),
                Some((mut step, FollowUp::Advance)) => {
                    step.merge(self.dispatch_next());
                    step
                }
                Some((mut step, FollowUp::Stopped | FollowUp::Finished)) => {
                    self.exit_if_idle(&mut step);
                    step
                }
            },
        }
    }

    /// The backend could not spawn a worker for `item`.
    ///
    /// Treated like a worker reporting an unexpected failure, so the run
    /// advances instead of sticking in `Running`.
    pub fn dispatch_failed(&mut self, item: &Path, detail: String) -> CoreStep {
        warn!(item = %item.display(), %detail, "worker dispatch failed");
        self.handle_message(WorkerMessage::Failed {
            item: item.to_path_buf(),
            kind: FailureKind::Unexpected,
            detail,
        })
    }

    /// Append each path as a `Queued` item. Paths already queued or running
    /// are reported back instead of being added twice.
    pub fn enqueue(&mut self, paths: Vec<PathBuf>) -> CoreStep {
        let mut added = 0;
        let mut duplicates = Vec::new();
        for path in paths {
            match self.jobs.enqueue(path) {
                Ok(()) => added += 1,
                Err(EnqueueRejected::Duplicate(path)) => duplicates.push(path),
            }
        }
        info!(added, duplicates = duplicates.len(), "enqueued items");
        CoreStep::with_notice(Notice::Enqueued { added, duplicates })
    }

    /// Remove the items at `indices` except the running one.
    pub fn remove_selected(&mut self, indices: &[usize]) -> CoreStep {
        let outcome = self.jobs.remove_selected(indices);
        if outcome.blocked_by_running {
            warn!("refusing to remove the running item");
        }
        CoreStep::with_notice(Notice::Removed(outcome))
    }

    /// Remove every non-running item.
    pub fn clear(&mut self) -> CoreStep {
        let removed = self.jobs.clear();
        CoreStep::with_notice(Notice::Cleared { removed })
    }

    /// Begin a run: validate the configuration and dispatch the earliest
    /// queued item. Counters for the end-of-run summary restart here.
    pub fn start(&mut self) -> CoreStep {
        if self.flags.is_running {
            debug!("start requested while running");
            return CoreStep::with_notice(Notice::AlreadyRunning);
        }
        self.flags.stop_requested = false;
        self.flags.done = 0;
        self.flags.errored = 0;
        self.dispatch_next()
    }

    /// Let the current job finish, then stop dispatching.
    pub fn request_stop(&mut self) -> CoreStep {
        if !self.flags.is_running {
            return CoreStep::with_notice(Notice::NotRunning);
        }
        if !self.flags.stop_requested {
            info!("stop requested; current job will finish");
        }
        self.flags.stop_requested = true;
        CoreStep::with_notice(Notice::StopRequested)
    }

    /// Replace the live configuration. Refused while a job runs; the running
    /// job keeps the snapshot it was dispatched with either way.
    pub fn update_config(&mut self, config: RunConfig) -> CoreStep {
        if self.flags.is_running {
            warn!("configuration edit refused while a job is running");
            return CoreStep::with_notice(Notice::ConfigLocked);
        }
        self.config = config;
        self.config_rejected = false;
        info!("run configuration updated");
        CoreStep::with_notice(Notice::ConfigUpdated)
    }

    /// Tear down: terminate any live worker and exit.
    pub fn shutdown(&mut self) -> CoreStep {
        let mut step = CoreStep::new();
        if let Some(item) = self.flags.running_item.clone() {
            info!(item = %item.display(), "shutdown while running; terminating worker");
            step.commands.push(CoreCommand::TerminateWorker);
            step.notices.push(Notice::Terminating { item });
        }
        step.commands.push(CoreCommand::RequestExit);
        step.keep_running = false;
        step
    }

    fn dispatch_next(&mut self) -> CoreStep {
        if let Err(err) = check_run_config(self.fs.as_ref(), &self.config) {
            warn!(error = %err, "run configuration failed pre-start checks");
            self.config_rejected = true;
            let mut step = CoreStep::with_notice(Notice::ConfigInvalid(err.to_string()));
            self.exit_if_idle(&mut step);
            return step;
        }
        self.config_rejected = false;

        let Some(item) = self.jobs.begin_next() else {
            debug!("no queued item to dispatch");
            let mut step = CoreStep::with_notice(Notice::NothingToDo);
            self.exit_if_idle(&mut step);
            return step;
        };

        info!(item = %item.display(), "dispatching job");
        self.flags.is_running = true;
        self.flags.running_item = Some(item.clone());

        let mut step = CoreStep::new();
        step.commands.push(CoreCommand::Dispatch(Job {
            item: item.clone(),
            config: self.config.clone(),
        }));
        step.notices.push(Notice::Started { item });
        step
    }

    fn exit_if_idle(&self, step: &mut CoreStep) {
        if self.options.exit_when_idle && !self.flags.is_running {
            debug!("orchestrator idle and exit_when_idle set; requesting exit");
            step.commands.push(CoreCommand::RequestExit);
            step.keep_running = false;
        }
    }
}
