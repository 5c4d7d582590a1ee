// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod queue;
pub mod report;
pub mod types;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{check_run_config, load_or_init, ConfigFile};
use crate::engine::{
    message_channel, ControlEvent, Inbox, Orchestrator, RunSummary, Runtime, RuntimeOptions,
};
use crate::errors::BlastqError;
use crate::exec::{BlastCommand, RealWorkerBackend};
use crate::fs::{FileSystem, RealFileSystem};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (a default file is written if missing)
/// - orchestrator / runtime
/// - worker backend
/// - notice printing
/// - Ctrl-C handling: first press stops after the current file, second
///   press terminates it
pub async fn run(args: CliArgs) -> Result<RunSummary> {
    let mut cfg = load_or_init(&args.config)
        .with_context(|| format!("loading config {}", args.config.display()))?;
    if let Some(drain) = args.drain {
        cfg.runtime.drain = drain;
    }

    let files = absolute_paths(&args.files)?;
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);

    if args.dry_run {
        return Ok(print_dry_run(&cfg, &files, fs.as_ref()));
    }

    let options = RuntimeOptions::from_config(&cfg.runtime, true);

    // Worker -> controller messages.
    let (msg_tx, msg_rx) = message_channel();
    let inbox = Inbox::new(msg_rx, options.drain);

    // Control surface -> runtime.
    let (control_tx, control_rx) = mpsc::channel::<ControlEvent>(16);

    // Orchestrator -> presentation.
    let (notice_tx, notice_rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(report::print_notices(notice_rx));

    let backend = RealWorkerBackend::new(msg_tx, Arc::clone(&fs));
    let core = Orchestrator::new(cfg.run_config(), fs, options);
    let runtime = Runtime::new(core, inbox, control_rx, backend, notice_tx, options);

    spawn_ctrl_c_handler(control_tx.clone());

    info!(count = files.len(), "queueing input files");
    for event in [ControlEvent::Enqueue(files), ControlEvent::Start] {
        control_tx
            .send(event)
            .await
            .map_err(|_| BlastqError::ChannelClosed)?;
    }
    drop(control_tx);

    let summary = runtime.run().await?;

    if let Err(e) = printer.await {
        warn!(error = %e, "notice printer task failed");
    }
    Ok(summary)
}

/// First Ctrl-C requests a stop after the current file; the second shuts
/// down and terminates the running `blastn`.
fn spawn_ctrl_c_handler(tx: mpsc::Sender<ControlEvent>) {
    tokio::spawn(async move {
        for event in [ControlEvent::RequestStop, ControlEvent::Shutdown] {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            debug!(?event, "Ctrl+C received");
            if tx.send(event).await.is_err() {
                return;
            }
        }
    });
}

/// Inputs are queued by absolute path so the worker does not depend on the
/// process working directory, which differs from `blastn`'s.
fn absolute_paths(files: &[PathBuf]) -> Result<Vec<PathBuf>> {
    files
        .iter()
        .map(|f| std::path::absolute(f).with_context(|| format!("resolving {}", f.display())))
        .collect()
}

/// Print the resolved configuration and the command line per file.
fn print_dry_run(cfg: &ConfigFile, files: &[PathBuf], fs: &dyn FileSystem) -> RunSummary {
    let run = cfg.run_config();
    println!("blastq dry-run");
    println!("  paths.blast_path = {}", cfg.paths.blast_path.display());
    println!("  paths.database_path = {}", cfg.paths.database_path.display());
    println!("  blast.database_name = {}", cfg.blast.database_name);
    println!("  blast.num_threads = {}", cfg.blast.num_threads);
    println!("  runtime.drain = {:?}", cfg.runtime.drain);
    println!();

    let config_rejected = match check_run_config(fs, &run) {
        Ok(()) => {
            println!("configuration check: ok");
            false
        }
        Err(e) => {
            println!("configuration check: FAILED ({e})");
            true
        }
    };
    println!();

    println!("commands ({}):", files.len());
    for file in files {
        let cmd = BlastCommand::build(file, &run);
        println!("  (cd {}) {}", cmd.cwd.display(), cmd.display());
    }

    debug!("dry-run complete (no execution)");
    RunSummary {
        queued: files.len(),
        config_rejected,
        ..RunSummary::default()
    }
}
