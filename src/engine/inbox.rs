// src/engine/inbox.rs

//! Controller side of the worker message channel.

use tokio::sync::mpsc::error::TryRecvError;
use tracing::trace;

use crate::engine::{MessageReceiver, WorkerMessage};
use crate::types::DrainPolicy;

/// Non-blocking reader over the worker channel.
#[derive(Debug)]
pub struct Inbox {
    rx: MessageReceiver,
    policy: DrainPolicy,
}

impl Inbox {
    pub fn new(rx: MessageReceiver, policy: DrainPolicy) -> Self {
        Self { rx, policy }
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Take the messages for one poll tick, in send order.
    ///
    /// Never blocks. Returns an empty vec when nothing is buffered.
    pub fn drain(&mut self) -> Vec<WorkerMessage> {
        let limit = match self.policy {
            DrainPolicy::One => 1,
            DrainPolicy::All => usize::MAX,
        };

        let mut out = Vec::new();
        while out.len() < limit {
            match self.rx.try_recv() {
                Ok(msg) => out.push(msg),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        trace!(count = out.len(), "drained worker messages");
        out
    }
}
