// src/report.rs

//! Human-readable rendering of orchestrator notices.
//!
//! Info lines go to stdout; warnings and errors go to stderr next to the
//! logs.

use std::path::Path;

use tokio::sync::mpsc;

use crate::engine::{FailureKind, Notice};

/// Longest stderr excerpt shown for a failed run, in characters.
pub const MAX_DETAIL_CHARS: usize = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

/// A notice turned into text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub severity: Severity,
    pub text: String,
}

impl Rendered {
    fn info(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            text: text.into(),
        }
    }

    fn warn(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warn,
            text: text.into(),
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            text: text.into(),
        }
    }
}

pub fn render(notice: &Notice) -> Rendered {
    match notice {
        Notice::Enqueued { added, duplicates } => {
            if duplicates.is_empty() {
                Rendered::info(format!("queued {added} file(s)"))
            } else {
                let names: Vec<String> = duplicates.iter().map(|p| name(p)).collect();
                Rendered::warn(format!(
                    "queued {added} file(s); already in the queue: {}",
                    names.join(", ")
                ))
            }
        }
        Notice::Removed(outcome) => {
            if outcome.blocked_by_running {
                Rendered::warn(format!(
                    "removed {} item(s); the running item cannot be removed",
                    outcome.removed
                ))
            } else {
                Rendered::info(format!("removed {} item(s)", outcome.removed))
            }
        }
        Notice::Cleared { removed: 0 } => Rendered::info("nothing to clear"),
        Notice::Cleared { removed } => Rendered::info(format!("cleared {removed} item(s)")),
        Notice::NothingToDo => Rendered::info("nothing to do: no queued files"),
        Notice::AlreadyRunning => Rendered::warn("a job is already running"),
        Notice::ConfigInvalid(reason) => {
            Rendered::error(format!("cannot start, check the configuration: {reason}"))
        }
        Notice::ConfigUpdated => Rendered::info("configuration updated"),
        Notice::ConfigLocked => {
            Rendered::warn("configuration cannot be changed while a job is running")
        }
        Notice::NotRunning => Rendered::info("nothing is running"),
        Notice::StopRequested => {
            Rendered::info("stop requested: the current file will finish, then the queue stops")
        }
        Notice::Started { item } => Rendered::info(format!("started {}", name(item))),
        Notice::Progress { value, text, .. } => Rendered::info(format!("[{value:>3}%] {text}")),
        Notice::ItemDone { item } => Rendered::info(format!("done {}", name(item))),
        Notice::ItemFailed { item, kind, detail } => {
            Rendered::error(failure_text(item, *kind, detail))
        }
        Notice::MoveWarning { item, detail } => Rendered::warn(format!(
            "{} was analysed but could not be moved to processed/: {detail}",
            name(item)
        )),
        Notice::Stopped => Rendered::info("stopped"),
        Notice::Finished { errored: 0, .. } => Rendered::info("all files done"),
        Notice::Finished { done, errored } => Rendered::warn(format!(
            "finished with errors: {done} done, {errored} failed"
        )),
        Notice::Terminating { item } => {
            Rendered::warn(format!("shutting down; terminating {}", name(item)))
        }
    }
}

fn failure_text(item: &Path, kind: FailureKind, detail: &str) -> String {
    let file = name(item);
    match kind {
        FailureKind::ExecutableNotFound => format!(
            "{file}: blastn executable not found ({detail}); check blast_path in the configuration"
        ),
        FailureKind::ProcessExecutionFailed => format!(
            "{file}: blastn failed:\n{}",
            truncate_detail(detail, MAX_DETAIL_CHARS)
        ),
        FailureKind::FileMoveFailed => {
            format!("{file}: analysed, but moving to processed/ failed: {detail}")
        }
        FailureKind::Unexpected => format!("{file}: unexpected error: {detail}"),
    }
}

/// Cut `detail` to at most `max` characters, marking the cut with `...`.
pub fn truncate_detail(detail: &str, max: usize) -> String {
    match detail.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &detail[..cut]),
        None => detail.to_string(),
    }
}

fn name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Print every notice received until the sender side is dropped.
pub async fn print_notices(mut rx: mpsc::UnboundedReceiver<Notice>) {
    while let Some(notice) = rx.recv().await {
        let rendered = render(&notice);
        match rendered.severity {
            Severity::Info => println!("{}", rendered.text),
            Severity::Warn | Severity::Error => eprintln!("{}", rendered.text),
        }
    }
}
