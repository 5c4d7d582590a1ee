// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::DrainPolicy;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [paths]
/// blast_path = "/opt/ncbi-blast/bin"
/// database_path = "/data/blast_db"
///
/// [blast]
/// database_name = "ref_prok_rep_genomes"
/// num_threads = 8
///
/// [runtime]
/// poll_interval_ms = 100
/// drain = "one"
/// termination_grace_ms = 3000
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub paths: PathsSection,

    #[serde(default)]
    pub blast: BlastSection,

    #[serde(default)]
    pub runtime: RuntimeSection,
}

/// Validated configuration. Only constructible through
/// `ConfigFile::try_from(RawConfigFile)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub paths: PathsSection,
    pub blast: BlastSection,
    pub runtime: RuntimeSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        paths: PathsSection,
        blast: BlastSection,
        runtime: RuntimeSection,
    ) -> Self {
        Self {
            paths,
            blast,
            runtime,
        }
    }

    /// Snapshot of the values a worker needs for one job.
    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            blast_path: self.paths.blast_path.clone(),
            database_path: self.paths.database_path.clone(),
            database_name: self.blast.database_name.clone(),
            num_threads: self.blast.num_threads,
        }
    }

    pub fn to_raw(&self) -> RawConfigFile {
        RawConfigFile {
            paths: self.paths.clone(),
            blast: self.blast.clone(),
            runtime: self.runtime.clone(),
        }
    }
}

/// `[paths]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathsSection {
    /// Directory holding the BLAST+ binaries (`blastn`).
    #[serde(default = "default_blast_path")]
    pub blast_path: PathBuf,

    /// Directory holding the database and its `.nal` / `.pal` alias file.
    /// Also used as the working directory of every `blastn` run.
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

fn default_blast_path() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from(r"C:\ncbi-blast-2.17.0+\bin")
    } else {
        PathBuf::from("/usr/local/ncbi-blast/bin")
    }
}

fn default_database_path() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from(r"C:\blast_db")
    } else {
        PathBuf::from("/var/lib/blast_db")
    }
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            blast_path: default_blast_path(),
            database_path: default_database_path(),
        }
    }
}

/// `[blast]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BlastSection {
    /// Database alias name passed to `-db`, resolved relative to
    /// `paths.database_path`.
    #[serde(default = "default_database_name")]
    pub database_name: String,

    #[serde(default = "default_num_threads")]
    pub num_threads: u32,
}

fn default_database_name() -> String {
    "ref_prok_rep_genomes".to_string()
}

fn default_num_threads() -> u32 {
    8
}

impl Default for BlastSection {
    fn default() -> Self {
        Self {
            database_name: default_database_name(),
            num_threads: default_num_threads(),
        }
    }
}

/// `[runtime]` section: controller pacing and shutdown escalation.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RuntimeSection {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default)]
    pub drain: DrainPolicy,

    /// How long shutdown waits after the graceful stop signal before
    /// force-killing the aligner.
    #[serde(default = "default_termination_grace_ms")]
    pub termination_grace_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_termination_grace_ms() -> u64 {
    3000
}

impl RuntimeSection {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn termination_grace(&self) -> Duration {
        Duration::from_millis(self.termination_grace_ms)
    }
}

impl Default for RuntimeSection {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            drain: DrainPolicy::default(),
            termination_grace_ms: default_termination_grace_ms(),
        }
    }
}

/// Immutable per-job snapshot handed to a worker at dispatch time.
///
/// Later edits to the live configuration never reach a worker that already
/// holds a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub blast_path: PathBuf,
    pub database_path: PathBuf,
    pub database_name: String,
    pub num_threads: u32,
}

impl RunConfig {
    /// Full path of the `blastn` binary.
    pub fn executable(&self) -> PathBuf {
        self.blast_path
            .join(format!("blastn{}", std::env::consts::EXE_SUFFIX))
    }

    /// Candidate alias files; at least one must exist for a usable database.
    pub fn alias_files(&self) -> [PathBuf; 2] {
        [
            self.database_path.join(format!("{}.nal", self.database_name)),
            self.database_path.join(format!("{}.pal", self.database_name)),
        ]
    }
}
