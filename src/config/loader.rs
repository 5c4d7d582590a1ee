// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and run structural validation.
///
/// Whether the configured executable and database actually exist is checked
/// separately, right before each start (see
/// [`crate::config::validate::check_run_config`]).
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Like [`load_and_validate`], but writes a default config file first when
/// none exists at `path`.
pub fn load_or_init(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    if !path.exists() {
        save_config(path, &RawConfigFile::default())?;
        info!(path = %path.display(), "config file not found; wrote defaults");
    }
    load_and_validate(path)
}

/// Serialize `config` as TOML and write it to `path`.
pub fn save_config(path: impl AsRef<Path>, config: &RawConfigFile) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let contents = toml::to_string_pretty(config)?;
    fs::write(path, contents)?;
    Ok(())
}

/// Default config location: `blastq.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("blastq.toml")
}
