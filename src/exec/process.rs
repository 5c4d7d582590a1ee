// src/exec/process.rs

//! Spawned `blastn` process: start, wait, and stop signals.

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::exec::command::BlastCommand;

#[derive(Debug, Error)]
pub enum StartError {
    /// The program does not exist; nothing was spawned.
    #[error("executable not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to spawn {}: {source}", .program.display())]
    Io {
        program: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was ended by a signal.
    pub exit_code: Option<i32>,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// A running child with its output being collected in the background.
#[derive(Debug)]
pub struct ProcessHandle {
    child: Child,
    stdout: Option<JoinHandle<String>>,
    stderr: Option<JoinHandle<String>>,
}

/// Spawn `command`.
///
/// A missing program is reported as [`StartError::NotFound`] before any
/// spawn is attempted, so a bad working directory is never mistaken for a
/// missing executable.
pub fn start(command: &BlastCommand) -> Result<ProcessHandle, StartError> {
    if !command.program.is_file() {
        return Err(StartError::NotFound(command.program.clone()));
    }

    let mut child = command.to_command().spawn().map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound && !command.program.exists() {
            StartError::NotFound(command.program.clone())
        } else {
            StartError::Io {
                program: command.program.clone(),
                source,
            }
        }
    })?;

    debug!(pid = ?child.id(), cmd = %command.display(), "blastn started");

    let stdout = child.stdout.take().map(|s| collect_lines(s, "stdout"));
    let stderr = child.stderr.take().map(|s| collect_lines(s, "stderr"));

    Ok(ProcessHandle {
        child,
        stdout,
        stderr,
    })
}

impl ProcessHandle {
    /// OS process id, `None` once the child has been reaped.
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Send a non-graceful kill without waiting for exit.
    pub fn start_kill(&mut self) -> io::Result<()> {
        self.child.start_kill()
    }

    /// Wait for exit and gather everything written to stdout and stderr.
    pub async fn wait(&mut self) -> io::Result<ProcessOutput> {
        let status = self.child.wait().await?;
        let stdout = join_output(self.stdout.take()).await;
        let stderr = join_output(self.stderr.take()).await;
        debug!(exit_code = ?status.code(), "blastn exited");
        Ok(ProcessOutput {
            stdout,
            stderr,
            exit_code: status.code(),
        })
    }
}

fn collect_lines<R>(stream: R, name: &'static str) -> JoinHandle<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(stream).lines();
        let mut out = String::new();
        while let Ok(Some(line)) = lines.next_line().await {
            trace!(stream = name, "{}", line);
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&line);
        }
        out
    })
}

async fn join_output(handle: Option<JoinHandle<String>>) -> String {
    match handle {
        Some(h) => h.await.unwrap_or_default(),
        None => String::new(),
    }
}

/// Ask process `pid` to stop gracefully (SIGTERM).
#[cfg(unix)]
pub fn send_graceful_stop(pid: u32) -> io::Result<()> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let raw = i32::try_from(pid)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"))?;
    kill(Pid::from_raw(raw), Signal::SIGTERM).map_err(io::Error::from)
}

/// No graceful stop signal exists here; callers fall back to a forced kill.
#[cfg(not(unix))]
pub fn send_graceful_stop(_pid: u32) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "graceful stop is not supported on this platform",
    ))
}
