// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::types::DrainPolicy;

/// Command-line arguments for `blastq`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "blastq",
    version,
    about = "Run a queue of FASTA files through blastn, one file at a time.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML). Written with defaults if missing.
    #[arg(long, value_name = "PATH", default_value = "blastq.toml")]
    pub config: PathBuf,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `BLASTQ_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Validate the config and print the command for each file; run nothing.
    #[arg(long)]
    pub dry_run: bool,

    /// Worker messages handled per poll tick (overrides `[runtime].drain`).
    #[arg(long, value_name = "one|all", value_parser = parse_drain)]
    pub drain: Option<DrainPolicy>,

    /// Input files, queued in the given order.
    #[arg(value_name = "FILES", required = true)]
    pub files: Vec<PathBuf>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

fn parse_drain(s: &str) -> Result<DrainPolicy, String> {
    s.parse()
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
