// src/exec/command.rs

//! `blastn` command line construction.

use std::ffi::{OsStr, OsString};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;

use crate::config::RunConfig;

/// Tabular output columns requested from `blastn`.
pub const OUTPUT_FORMAT: &str = "6 pident sacc staxid ssciname stitle";

/// `CREATE_NO_WINDOW`: keeps a console window from flashing up per job.
#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Fully resolved invocation for one input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlastCommand {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    /// Database directory; alias files are resolved relative to it.
    pub cwd: PathBuf,
}

impl BlastCommand {
    pub fn build(item: &Path, config: &RunConfig) -> Self {
        let out = result_path(item);
        let args: Vec<OsString> = vec![
            "-task".into(),
            "megablast".into(),
            "-query".into(),
            item.as_os_str().to_owned(),
            "-db".into(),
            config.database_name.clone().into(),
            "-out".into(),
            out.into_os_string(),
            "-outfmt".into(),
            OUTPUT_FORMAT.into(),
            "-num_threads".into(),
            config.num_threads.to_string().into(),
        ];

        Self {
            program: config.executable(),
            args,
            cwd: config.database_path.clone(),
        }
    }

    /// Tokio command with captured output and no stdin.
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .current_dir(&self.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        #[cfg(windows)]
        cmd.creation_flags(CREATE_NO_WINDOW);

        cmd
    }

    /// Shell-like rendering for `--dry-run` and logs.
    pub fn display(&self) -> String {
        let mut s = quote(self.program.as_os_str());
        for arg in &self.args {
            let _ = write!(s, " {}", quote(arg));
        }
        s
    }
}

/// `<input>_result.csv`, next to the input.
pub fn result_path(item: &Path) -> PathBuf {
    let mut out = item.as_os_str().to_owned();
    out.push("_result.csv");
    PathBuf::from(out)
}

fn quote(arg: &OsStr) -> String {
    let s = arg.to_string_lossy();
    if s.is_empty() || s.contains(char::is_whitespace) || s.contains('"') {
        format!("\"{}\"", s.replace('"', "\\\""))
    } else {
        s.into_owned()
    }
}
