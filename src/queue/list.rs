// src/queue/list.rs

//! Ordered job list owned by the orchestrator.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::queue::job::JobItem;
use crate::types::JobStatus;

/// Result of a `remove_selected` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RemoveOutcome {
    /// Number of items actually removed.
    pub removed: usize,
    /// Whether at least one selected index pointed at the running item.
    pub blocked_by_running: bool,
}

/// Why an enqueue was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnqueueRejected {
    /// The same path is already queued or running.
    Duplicate(PathBuf),
}

/// Jobs in enqueue order.
///
/// Items keep their position for their whole life; dispatch always takes the
/// first `Queued` entry, so earlier failures never get picked up again.
#[derive(Debug, Clone, Default)]
pub struct JobList {
    items: Vec<JobItem>,
}

impl JobList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[JobItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn count(&self, status: JobStatus) -> usize {
        self.items.iter().filter(|i| i.status() == status).count()
    }

    pub fn has_queued(&self) -> bool {
        self.items.iter().any(|i| i.status() == JobStatus::Queued)
    }

    pub fn status_of(&self, path: &Path) -> Option<JobStatus> {
        self.find_active(path)
            .map(|idx| self.items[idx].status())
            .or_else(|| {
                self.items
                    .iter()
                    .rev()
                    .find(|i| i.path() == path)
                    .map(|i| i.status())
            })
    }

    /// The item currently marked `Running`, if any.
    pub fn running(&self) -> Option<&JobItem> {
        self.items.iter().find(|i| i.status() == JobStatus::Running)
    }

    /// Append a new `Queued` item.
    pub fn enqueue(&mut self, path: impl Into<PathBuf>) -> Result<(), EnqueueRejected> {
        let path = path.into();
        if self.find_active(&path).is_some() {
            debug!(item = %path.display(), "path already queued or running; rejecting");
            return Err(EnqueueRejected::Duplicate(path));
        }
        self.items.push(JobItem::new(path));
        Ok(())
    }

    /// Remove the items at `indices`, skipping the running one.
    ///
    /// Out-of-range and repeated indices are ignored.
    pub fn remove_selected(&mut self, indices: &[usize]) -> RemoveOutcome {
        let selected: BTreeSet<usize> = indices
            .iter()
            .copied()
            .filter(|&i| i < self.items.len())
            .collect();

        let mut outcome = RemoveOutcome::default();
        for idx in selected.into_iter().rev() {
            if self.items[idx].status() == JobStatus::Running {
                outcome.blocked_by_running = true;
                continue;
            }
            self.items.remove(idx);
            outcome.removed += 1;
        }
        outcome
    }

    /// Remove every item that is not running. Returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let before = self.items.len();
        self.items.retain(|i| i.status() == JobStatus::Running);
        before - self.items.len()
    }

    /// Mark the earliest `Queued` item as `Running` and return its path.
    ///
    /// Returns `None` when nothing is queued or an item is already running.
    pub(crate) fn begin_next(&mut self) -> Option<PathBuf> {
        if self.running().is_some() {
            warn!("begin_next called while an item is running; refusing");
            return None;
        }
        let item = self
            .items
            .iter_mut()
            .find(|i| i.status() == JobStatus::Queued)?;
        item.transition(JobStatus::Running);
        Some(item.path().to_path_buf())
    }

    /// Move the running item at `path` to a terminal status.
    pub(crate) fn finish(&mut self, path: &Path, status: JobStatus) -> bool {
        match self
            .items
            .iter_mut()
            .find(|i| i.path() == path && i.status() == JobStatus::Running)
        {
            Some(item) => item.transition(status),
            None => false,
        }
    }

    fn find_active(&self, path: &Path) -> Option<usize> {
        self.items
            .iter()
            .position(|i| i.is_active() && i.path() == path)
    }
}
