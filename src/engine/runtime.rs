// src/engine/runtime.rs

use std::collections::VecDeque;
use std::fmt;

use tokio::sync::mpsc;
use tokio::time::{sleep_until, timeout, Instant};
use tracing::{debug, error, info, warn};

use crate::errors::Result;
use crate::exec::{WorkerBackend, WorkerHandle};

use super::core::{Orchestrator, RunSummary};
use super::{ControlEvent, CoreCommand, CoreStep, Inbox, Notice, RuntimeOptions};

/// Drives the [`Orchestrator`] from control events and worker messages, and
/// delegates actual job execution to a `WorkerBackend`.
///
/// This is a pure IO shell around the orchestrator, which contains all the
/// queue semantics. This struct handles async IO: reading control events,
/// polling the worker channel on a fixed tick, spawning and terminating
/// workers, and forwarding notices.
pub struct Runtime<B: WorkerBackend> {
    core: Orchestrator,
    inbox: Inbox,
    control_rx: mpsc::Receiver<ControlEvent>,
    backend: B,
    worker: Option<WorkerHandle>,
    notice_tx: mpsc::UnboundedSender<Notice>,
    options: RuntimeOptions,
    next_tick: Option<Instant>,
}

impl<B: WorkerBackend> fmt::Debug for Runtime<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("worker", &self.worker)
            .field("next_tick", &self.next_tick)
            .finish_non_exhaustive()
    }
}

impl<B: WorkerBackend> Runtime<B> {
    pub fn new(
        core: Orchestrator,
        inbox: Inbox,
        control_rx: mpsc::Receiver<ControlEvent>,
        backend: B,
        notice_tx: mpsc::UnboundedSender<Notice>,
        options: RuntimeOptions,
    ) -> Self {
        Self {
            core,
            inbox,
            control_rx,
            backend,
            worker: None,
            notice_tx,
            options,
            next_tick: None,
        }
    }

    pub fn core(&self) -> &Orchestrator {
        &self.core
    }

    pub fn has_worker(&self) -> bool {
        self.worker.is_some()
    }

    /// Whether a drain tick is scheduled.
    pub fn tick_scheduled(&self) -> bool {
        self.next_tick.is_some()
    }

    /// Main loop.
    ///
    /// - Feeds control events into the orchestrator as they arrive.
    /// - Drains the worker channel on each scheduled tick.
    /// - Executes commands returned by the orchestrator.
    ///
    /// Returns once the orchestrator asks to exit, or once the control
    /// channel is closed and no tick is pending.
    pub async fn run(mut self) -> Result<RunSummary> {
        info!("blastq runtime started");
        let mut control_open = true;

        loop {
            if !control_open && self.next_tick.is_none() {
                info!("control channel closed and nothing pending; exiting");
                break;
            }

            let tick = self.next_tick;
            let keep_running = tokio::select! {
                event = self.control_rx.recv(), if control_open => match event {
                    Some(event) => self.handle_control(event).await?,
                    None => {
                        debug!("control channel closed");
                        control_open = false;
                        true
                    }
                },
                _ = sleep_until(tick.unwrap_or_else(Instant::now)), if tick.is_some() => {
                    self.poll_once().await?
                }
            };

            if !keep_running {
                info!("orchestrator requested exit; stopping runtime");
                break;
            }
        }

        if self.worker.is_some() {
            self.terminate_worker().await;
        }

        let summary = self.core.summary();
        info!(?summary, "runtime exiting");
        Ok(summary)
    }

    /// Feed one control event through the orchestrator.
    ///
    /// Returns whether the runtime should keep running.
    pub async fn handle_control(&mut self, event: ControlEvent) -> Result<bool> {
        let step = self.core.handle_control(event);
        Ok(self.apply_step(step).await)
    }

    /// One drain tick: take messages per the drain policy, apply them, and
    /// reschedule if still needed.
    ///
    /// With nothing running and an empty channel this changes nothing and
    /// schedules nothing.
    pub async fn poll_once(&mut self) -> Result<bool> {
        self.next_tick = None;
        for message in self.inbox.drain() {
            debug!(?message, "worker message");
            let step = self.core.handle_message(message);
            if !self.apply_step(step).await {
                return Ok(false);
            }
        }
        self.reschedule();
        Ok(true)
    }

    async fn apply_step(&mut self, step: CoreStep) -> bool {
        let mut keep_running = step.keep_running;
        self.emit_all(step.notices);

        let mut pending: VecDeque<CoreCommand> = step.commands.into();
        while let Some(command) = pending.pop_front() {
            match command {
                CoreCommand::Dispatch(job) => {
                    if let Some(stale) = self.worker.take() {
                        warn!(item = %stale.item().display(), "replacing a worker handle that was never released");
                    }
                    let item = job.item.clone();
                    match self.backend.dispatch(job) {
                        Ok(handle) => self.worker = Some(handle),
                        Err(err) => {
                            let follow = self.core.dispatch_failed(&item, err.to_string());
                            keep_running &= follow.keep_running;
                            self.emit_all(follow.notices);
                            pending.extend(follow.commands);
                        }
                    }
                }
                CoreCommand::ReleaseWorker => {
                    if let Some(handle) = self.worker.take() {
                        debug!(item = %handle.item().display(), "worker released");
                    }
                }
                CoreCommand::TerminateWorker => self.terminate_worker().await,
                CoreCommand::RequestExit => debug!("core issued RequestExit command"),
            }
        }

        self.reschedule();
        keep_running
    }

    /// Graceful stop, bounded wait, then forced kill.
    async fn terminate_worker(&mut self) {
        let Some(mut handle) = self.worker.take() else {
            return;
        };
        let grace = self.options.termination_grace;
        let outcome = handle.request_termination();
        info!(item = %handle.item().display(), ?outcome, "termination requested");

        if timeout(grace, handle.wait()).await.is_ok() {
            debug!(item = %handle.item().display(), "worker exited after termination request");
            return;
        }

        warn!(item = %handle.item().display(), ?grace, "worker still alive after grace period; force killing");
        handle.force_kill();
        if timeout(grace, handle.wait()).await.is_err() {
            error!(item = %handle.item().display(), "worker did not exit after kill; aborting task");
            handle.abort();
        }
    }

    fn reschedule(&mut self) {
        if self.next_tick.is_none() && self.core.wants_poll(self.inbox.is_empty()) {
            self.next_tick = Some(Instant::now() + self.options.poll_interval);
        }
    }

    fn emit_all(&self, notices: Vec<Notice>) {
        for notice in notices {
            if self.notice_tx.send(notice).is_err() {
                debug!("notice receiver gone; dropping notice");
            }
        }
    }
}
