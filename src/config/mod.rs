// src/config/mod.rs

//! Configuration loading and validation for blastq.
//!
//! - `model.rs` defines the TOML-backed data model and the per-job
//!   [`RunConfig`] snapshot.
//! - `loader.rs` reads (and, if missing, initialises) the file.
//! - `validate.rs` checks structural invariants and, before each start,
//!   that the executable and database exist.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_or_init, save_config};
pub use model::{
    BlastSection, ConfigFile, PathsSection, RawConfigFile, RunConfig, RuntimeSection,
};
pub use validate::{check_run_config, validate_raw_config};
