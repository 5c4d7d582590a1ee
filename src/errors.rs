// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BlastqError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerError(#[from] toml::ser::Error),

    /// Aligner binary missing at the configured location.
    #[error("blastn executable not found: {}", .0.display())]
    ExecutableMissing(PathBuf),

    /// Neither `<name>.nal` nor `<name>.pal` exists in the database directory.
    #[error("database '{name}' not found in {} (expected {name}.nal or {name}.pal)", .dir.display())]
    DatabaseMissing { dir: PathBuf, name: String },

    #[error("worker message channel closed")]
    ChannelClosed,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, BlastqError>;
