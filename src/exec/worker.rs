// src/exec/worker.rs

//! One job's execution: progress, the `blastn` run, outcome classification
//! and relocation of the input.
//!
//! A worker reports through the message channel only. Once termination has
//! been requested it reports nothing at all, whatever the process did.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result};
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use crate::engine::{FailureKind, Job, MessageSender, WorkerMessage};
use crate::exec::command::BlastCommand;
use crate::exec::process::{self, StartError};
use crate::exec::relocate::move_to_processed;
use crate::fs::FileSystem;

/// Progress value reported when a job begins.
pub const STARTED_PROGRESS: u8 = 50;

/// Result of [`WorkerControl::request_termination`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationOutcome {
    /// The flag was already set by an earlier call.
    AlreadyRequested,
    /// No process is attached (not started yet or already exited).
    NotRunning,
    /// Graceful stop signal delivered.
    Signalled,
    /// Graceful delivery failed; a forced kill was issued instead.
    Killed,
}

#[derive(Debug, Default)]
struct LiveProcess {
    pid: Option<u32>,
    kill_tx: Option<oneshot::Sender<()>>,
}

/// Termination control block shared between a worker and its handle.
///
/// Safe to use from any task or thread.
#[derive(Debug, Default)]
pub struct WorkerControl {
    termination_requested: AtomicBool,
    live: Mutex<Option<LiveProcess>>,
}

impl WorkerControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_termination_requested(&self) -> bool {
        self.termination_requested.load(Ordering::SeqCst)
    }

    /// Set the flag, then stop the process if one is attached: graceful
    /// signal first, forced kill if the signal cannot be delivered.
    pub fn request_termination(&self) -> TerminationOutcome {
        if self.termination_requested.swap(true, Ordering::SeqCst) {
            return TerminationOutcome::AlreadyRequested;
        }

        let mut live = self.lock_live();
        let Some(running) = live.as_mut() else {
            debug!("termination requested before the process started");
            return TerminationOutcome::NotRunning;
        };

        let signalled = match running.pid {
            Some(pid) => match process::send_graceful_stop(pid) {
                Ok(()) => true,
                Err(err) => {
                    warn!(pid, error = %err, "graceful stop failed; escalating to kill");
                    false
                }
            },
            None => false,
        };

        if signalled {
            TerminationOutcome::Signalled
        } else {
            Self::fire_kill(running);
            TerminationOutcome::Killed
        }
    }

    /// Forced kill of the attached process. Returns false if none is attached
    /// or a kill was already issued.
    pub fn force_kill(&self) -> bool {
        match self.lock_live().as_mut() {
            Some(running) => Self::fire_kill(running),
            None => false,
        }
    }

    /// Register the live process. Returns true if termination was requested
    /// before this call, in which case the caller must kill it right away.
    pub(crate) fn attach(&self, pid: Option<u32>, kill_tx: oneshot::Sender<()>) -> bool {
        let mut live = self.lock_live();
        *live = Some(LiveProcess {
            pid,
            kill_tx: Some(kill_tx),
        });
        self.is_termination_requested()
    }

    pub(crate) fn detach(&self) {
        self.lock_live().take();
    }

    fn fire_kill(running: &mut LiveProcess) -> bool {
        match running.kill_tx.take() {
            Some(tx) => tx.send(()).is_ok(),
            None => false,
        }
    }

    fn lock_live(&self) -> MutexGuard<'_, Option<LiveProcess>> {
        self.live.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Executes exactly one job.
#[derive(Debug)]
pub struct Worker {
    job: Job,
    tx: MessageSender,
    fs: Arc<dyn FileSystem>,
    control: Arc<WorkerControl>,
}

impl Worker {
    pub fn new(
        job: Job,
        tx: MessageSender,
        fs: Arc<dyn FileSystem>,
        control: Arc<WorkerControl>,
    ) -> Self {
        Self {
            job,
            tx,
            fs,
            control,
        }
    }

    pub fn control(&self) -> &Arc<WorkerControl> {
        &self.control
    }

    /// Run the job to completion. Emits at most one terminal message, and
    /// none once termination has been requested.
    pub async fn run(self) {
        if let Err(err) = self.run_inner().await {
            if self.control.is_termination_requested() {
                debug!(item = %self.job.item.display(), error = %err, "error after termination; suppressed");
                return;
            }
            let detail = format!("{err:#}");
            error!(item = %self.job.item.display(), error = %detail, "worker failed unexpectedly");
            self.emit_terminal(WorkerMessage::Failed {
                item: self.job.item.clone(),
                kind: FailureKind::Unexpected,
                detail,
            });
        }
    }

    async fn run_inner(&self) -> Result<()> {
        let item = &self.job.item;
        self.emit(WorkerMessage::Progress {
            item: item.clone(),
            value: STARTED_PROGRESS,
            text: format!("processing {}", display_name(item)),
        });

        if self.control.is_termination_requested() {
            return Ok(());
        }

        let command = BlastCommand::build(item, &self.job.config);
        info!(item = %item.display(), cmd = %command.display(), "starting blastn");

        let mut child = match process::start(&command) {
            Ok(child) => child,
            Err(StartError::NotFound(program)) => {
                self.emit_terminal(WorkerMessage::Failed {
                    item: item.clone(),
                    kind: FailureKind::ExecutableNotFound,
                    detail: program.display().to_string(),
                });
                return Ok(());
            }
            Err(err) => return Err(err).context("starting blastn"),
        };

        let (kill_tx, mut kill_rx) = oneshot::channel();
        if self.control.attach(child.id(), kill_tx) {
            debug!(item = %item.display(), "termination already requested; killing at once");
            if let Err(err) = child.start_kill() {
                warn!(item = %item.display(), error = %err, "failed to kill blastn");
            }
        }

        let waited = tokio::select! {
            out = child.wait() => out,
            Ok(()) = &mut kill_rx => {
                info!(item = %item.display(), "force kill requested");
                if let Err(err) = child.start_kill() {
                    warn!(item = %item.display(), error = %err, "failed to kill blastn");
                }
                child.wait().await
            }
        };
        self.control.detach();

        if self.control.is_termination_requested() {
            info!(item = %item.display(), "worker terminated; result discarded");
            return Ok(());
        }

        let output = waited.context("waiting for blastn")?;

        if !output.success() {
            warn!(item = %item.display(), exit_code = ?output.exit_code, "blastn failed");
            let detail = if output.stderr.trim().is_empty() {
                match output.exit_code {
                    Some(code) => format!("blastn exited with status {code}"),
                    None => "blastn was terminated by a signal".to_string(),
                }
            } else {
                output.stderr.trim().to_string()
            };
            self.emit_terminal(WorkerMessage::Failed {
                item: item.clone(),
                kind: FailureKind::ProcessExecutionFailed,
                detail,
            });
            return Ok(());
        }

        match move_to_processed(self.fs.as_ref(), item) {
            Ok(target) => {
                info!(item = %item.display(), moved_to = %target.display(), "job finished");
                self.emit_terminal(WorkerMessage::Completed { item: item.clone() });
            }
            Err(err) => {
                self.emit_terminal(WorkerMessage::Failed {
                    item: item.clone(),
                    kind: FailureKind::FileMoveFailed,
                    detail: format!("{err:#}"),
                });
            }
        }
        Ok(())
    }

    /// Send a terminal message unless termination was requested, however
    /// late that request came.
    fn emit_terminal(&self, message: WorkerMessage) {
        if self.control.is_termination_requested() {
            debug!(item = %self.job.item.display(), "terminated; terminal message suppressed");
            return;
        }
        self.emit(message);
    }

    fn emit(&self, message: WorkerMessage) {
        if self.tx.send(message).is_err() {
            debug!(item = %self.job.item.display(), "controller gone; message dropped");
        }
    }
}

fn display_name(item: &Path) -> String {
    item.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| item.display().to_string())
}
