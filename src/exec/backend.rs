// src/exec/backend.rs

//! Pluggable worker backend abstraction.
//!
//! The runtime talks to a `WorkerBackend` instead of spawning workers
//! itself. This makes it easy to swap in a fake backend in tests while the
//! production path runs real `blastn` processes.
//!
//! - `RealWorkerBackend` spawns a [`Worker`] on the Tokio runtime, plus a
//!   small supervisor that turns a worker panic into an `Unexpected` failure.
//! - Tests can provide their own `WorkerBackend` that, for example, records
//!   which items were dispatched and posts scripted messages.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, error, warn};

use crate::engine::{FailureKind, Job, MessageSender, WorkerMessage};
use crate::errors::Result;
use crate::exec::worker::{TerminationOutcome, Worker, WorkerControl};
use crate::fs::FileSystem;

/// Trait abstracting how a dispatched job is executed.
pub trait WorkerBackend: Send {
    /// Start a worker for `job` and return a handle to it.
    ///
    /// Completion is reported only through the message channel.
    fn dispatch(&mut self, job: Job) -> Result<WorkerHandle>;
}

/// Controller-side handle to one live worker.
#[derive(Debug)]
pub struct WorkerHandle {
    item: PathBuf,
    control: Arc<WorkerControl>,
    join: JoinHandle<()>,
    worker_abort: Option<AbortHandle>,
}

impl WorkerHandle {
    pub fn new(item: PathBuf, control: Arc<WorkerControl>, join: JoinHandle<()>) -> Self {
        Self {
            item,
            control,
            join,
            worker_abort: None,
        }
    }

    /// Also abort this task on [`WorkerHandle::abort`], for backends where
    /// `join` only supervises the task that runs the job.
    pub fn with_worker_abort(mut self, abort: AbortHandle) -> Self {
        self.worker_abort = Some(abort);
        self
    }

    pub fn item(&self) -> &Path {
        &self.item
    }

    pub fn request_termination(&self) -> TerminationOutcome {
        self.control.request_termination()
    }

    pub fn force_kill(&self) -> bool {
        self.control.force_kill()
    }

    /// Wait for the worker task to end. Returns false if it panicked or was
    /// aborted.
    ///
    /// Cancel-safe, but must not be polled again once it has returned.
    pub async fn wait(&mut self) -> bool {
        match (&mut self.join).await {
            Ok(()) => true,
            Err(err) => {
                debug!(item = %self.item.display(), error = %err, "worker task ended abnormally");
                false
            }
        }
    }

    /// Drop the worker task outright. Its process is killed on drop.
    pub fn abort(&self) {
        if let Some(worker) = &self.worker_abort {
            worker.abort();
        }
        self.join.abort();
    }
}

/// Real backend used in production.
#[derive(Debug)]
pub struct RealWorkerBackend {
    tx: MessageSender,
    fs: Arc<dyn FileSystem>,
}

impl RealWorkerBackend {
    pub fn new(tx: MessageSender, fs: Arc<dyn FileSystem>) -> Self {
        Self { tx, fs }
    }
}

impl WorkerBackend for RealWorkerBackend {
    fn dispatch(&mut self, job: Job) -> Result<WorkerHandle> {
        let item = job.item.clone();
        let control = Arc::new(WorkerControl::new());
        let worker = Worker::new(job, self.tx.clone(), Arc::clone(&self.fs), Arc::clone(&control));

        let tx = self.tx.clone();
        let supervised = Arc::clone(&control);
        let supervised_item = item.clone();
        let inner = tokio::spawn(worker.run());
        let worker_abort = inner.abort_handle();
        let join = tokio::spawn(async move {
            match inner.await {
                Ok(()) => {}
                Err(err) if err.is_panic() => {
                    if supervised.is_termination_requested() {
                        warn!(item = %supervised_item.display(), "worker panicked after termination");
                        return;
                    }
                    error!(item = %supervised_item.display(), "worker panicked");
                    let failed = WorkerMessage::Failed {
                        item: supervised_item.clone(),
                        kind: FailureKind::Unexpected,
                        detail: "worker panicked".to_string(),
                    };
                    if tx.send(failed).is_err() {
                        debug!(item = %supervised_item.display(), "controller gone; panic report dropped");
                    }
                }
                Err(err) => {
                    debug!(item = %supervised_item.display(), error = %err, "worker task cancelled");
                }
            }
        });

        Ok(WorkerHandle::new(item, control, join).with_worker_abort(worker_abort))
    }
}
