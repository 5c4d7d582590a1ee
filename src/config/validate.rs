// src/config/validate.rs

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile, RunConfig};
use crate::errors::{BlastqError, Result};
use crate::fs::FileSystem;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::BlastqError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.paths, raw.blast, raw.runtime))
    }
}

/// Structural validation: values that are wrong regardless of what is on disk.
pub fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_blast_section(cfg)?;
    validate_runtime_section(cfg)?;
    Ok(())
}

fn validate_blast_section(cfg: &RawConfigFile) -> Result<()> {
    if cfg.blast.database_name.trim().is_empty() {
        return Err(BlastqError::ConfigError(
            "[blast].database_name must not be empty".to_string(),
        ));
    }

    if cfg.blast.num_threads == 0 {
        return Err(BlastqError::ConfigError(
            "[blast].num_threads must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(())
}

fn validate_runtime_section(cfg: &RawConfigFile) -> Result<()> {
    // drain policy is strongly typed and validated during deserialization.

    if cfg.runtime.poll_interval_ms == 0 {
        return Err(BlastqError::ConfigError(
            "[runtime].poll_interval_ms must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(())
}

/// Environmental validation run before every `start()`.
///
/// Checks that the aligner binary exists and that the database has a
/// nucleotide (`.nal`) or protein (`.pal`) alias file.
pub fn check_run_config(fs: &dyn FileSystem, cfg: &RunConfig) -> Result<()> {
    let exe = cfg.executable();
    if !fs.is_file(&exe) {
        return Err(BlastqError::ExecutableMissing(exe));
    }

    if !cfg.alias_files().iter().any(|alias| fs.exists(alias)) {
        return Err(BlastqError::DatabaseMissing {
            dir: cfg.database_path.clone(),
            name: cfg.database_name.clone(),
        });
    }

    debug!(exe = %exe.display(), db = %cfg.database_name, "run configuration verified");
    Ok(())
}
