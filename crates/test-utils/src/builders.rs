#![allow(dead_code)]

use std::path::{Path, PathBuf};

use blastq::config::{ConfigFile, RawConfigFile, RunConfig};
use blastq::fs::mock::MockFileSystem;
use blastq::types::DrainPolicy;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn blast_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.paths.blast_path = path.into();
        self
    }

    pub fn database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.paths.database_path = path.into();
        self
    }

    pub fn database_name(mut self, name: &str) -> Self {
        self.config.blast.database_name = name.to_string();
        self
    }

    pub fn num_threads(mut self, n: u32) -> Self {
        self.config.blast.num_threads = n;
        self
    }

    pub fn drain(mut self, drain: DrainPolicy) -> Self {
        self.config.runtime.drain = drain;
        self
    }

    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.runtime.poll_interval_ms = ms;
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `RunConfig` snapshots.
pub struct RunConfigBuilder {
    config: RunConfig,
}

impl RunConfigBuilder {
    /// Defaults to `/opt/blast/bin` and `/data/db` with database `testdb`.
    pub fn new() -> Self {
        Self {
            config: RunConfig {
                blast_path: PathBuf::from("/opt/blast/bin"),
                database_path: PathBuf::from("/data/db"),
                database_name: "testdb".to_string(),
                num_threads: 4,
            },
        }
    }

    pub fn blast_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.blast_path = path.into();
        self
    }

    pub fn database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.database_path = path.into();
        self
    }

    pub fn database_name(mut self, name: &str) -> Self {
        self.config.database_name = name.to_string();
        self
    }

    pub fn num_threads(mut self, n: u32) -> Self {
        self.config.num_threads = n;
        self
    }

    pub fn build(self) -> RunConfig {
        self.config
    }
}

impl Default for RunConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Mock filesystem where `config` passes the pre-start checks: the
/// executable and a `.nal` alias file exist.
pub fn valid_mock_fs(config: &RunConfig) -> MockFileSystem {
    let fs = MockFileSystem::new();
    fs.add_file(config.executable(), "#!/bin/sh\n");
    fs.add_file(&config.alias_files()[0], "TITLE test\n");
    fs
}

/// Add input files to `fs` under `dir` and return their paths, in order.
pub fn add_inputs(fs: &MockFileSystem, dir: &Path, names: &[&str]) -> Vec<PathBuf> {
    names
        .iter()
        .map(|name| {
            let path = dir.join(name);
            fs.add_file(&path, ">seq\nACGT\n");
            path
        })
        .collect()
}
