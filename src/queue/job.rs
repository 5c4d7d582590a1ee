// src/queue/job.rs

//! A single input file tracked through the queue.

use std::path::{Path, PathBuf};

use crate::types::JobStatus;

/// One entry of the job list.
///
/// The path is the identity of the item while it is `Queued` or `Running`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobItem {
    path: PathBuf,
    status: JobStatus,
}

impl JobItem {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            status: JobStatus::Queued,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    /// Whether the item still occupies its path in the queue.
    pub fn is_active(&self) -> bool {
        matches!(self.status, JobStatus::Queued | JobStatus::Running)
    }

    /// Apply a status transition, refusing anything that is not
    /// `Queued -> Running` or `Running -> Done | Errored`.
    ///
    /// Returns whether the transition happened.
    pub(crate) fn transition(&mut self, next: JobStatus) -> bool {
        let allowed = matches!(
            (self.status, next),
            (JobStatus::Queued, JobStatus::Running)
                | (JobStatus::Running, JobStatus::Done)
                | (JobStatus::Running, JobStatus::Errored)
        );
        if allowed {
            self.status = next;
        }
        allowed
    }
}
