use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use blastq::engine::{FailureKind, Job, MessageSender, WorkerMessage};
use blastq::errors::{BlastqError, Result};
use blastq::exec::{WorkerBackend, WorkerControl, WorkerHandle};

/// What a scripted worker does for one item.
#[derive(Debug, Clone)]
pub enum Script {
    /// Progress, then `Completed`.
    Complete,
    /// Progress, then `Failed { kind, detail }`.
    Fail(FailureKind, String),
    /// Progress, then nothing until termination is requested.
    Hang,
    /// `dispatch` itself returns an error; no worker runs.
    RefuseDispatch,
}

/// A fake backend that:
/// - records which jobs were dispatched
/// - posts scripted messages per item file name instead of running `blastn`.
///
/// Items without a script complete successfully.
pub struct ScriptedBackend {
    tx: MessageSender,
    scripts: HashMap<String, Script>,
    dispatched: Arc<Mutex<Vec<Job>>>,
}

impl ScriptedBackend {
    pub fn new(tx: MessageSender) -> Self {
        Self {
            tx,
            scripts: HashMap::new(),
            dispatched: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn script(mut self, file_name: &str, script: Script) -> Self {
        self.scripts.insert(file_name.to_string(), script);
        self
    }

    /// Shared record of dispatched jobs, in dispatch order.
    pub fn dispatched(&self) -> Arc<Mutex<Vec<Job>>> {
        Arc::clone(&self.dispatched)
    }

    fn script_for(&self, item: &Path) -> Script {
        item.file_name()
            .and_then(|n| self.scripts.get(n.to_string_lossy().as_ref()))
            .cloned()
            .unwrap_or(Script::Complete)
    }
}

impl WorkerBackend for ScriptedBackend {
    fn dispatch(&mut self, job: Job) -> Result<WorkerHandle> {
        self.dispatched.lock().unwrap().push(job.clone());

        let script = self.script_for(&job.item);
        if let Script::RefuseDispatch = script {
            return Err(BlastqError::Other(anyhow::anyhow!(
                "scripted dispatch refusal for {}",
                job.item.display()
            )));
        }

        let item = job.item.clone();
        let control = Arc::new(WorkerControl::new());
        let ctl = Arc::clone(&control);
        let tx = self.tx.clone();

        let join = tokio::spawn(async move {
            let _ = tx.send(WorkerMessage::Progress {
                item: item.clone(),
                value: 50,
                text: format!("processing {}", item.display()),
            });

            let message = match script {
                Script::Complete => WorkerMessage::Completed { item },
                Script::Fail(kind, detail) => WorkerMessage::Failed { item, kind, detail },
                Script::Hang => {
                    while !ctl.is_termination_requested() {
                        tokio::time::sleep(Duration::from_millis(5)).await;
                    }
                    return;
                }
                Script::RefuseDispatch => return,
            };

            if !ctl.is_termination_requested() {
                let _ = tx.send(message);
            }
        });

        Ok(WorkerHandle::new(job.item, control, join))
    }
}
