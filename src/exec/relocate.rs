// src/exec/relocate.rs

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use tracing::debug;

use crate::fs::FileSystem;

/// Name of the sibling directory analysed inputs are moved into.
pub const PROCESSED_DIR: &str = "processed";

/// `<dir>/processed/<name>` for an input at `<dir>/<name>`.
pub fn processed_path(item: &Path) -> Result<PathBuf> {
    let name = item
        .file_name()
        .ok_or_else(|| anyhow!("input path has no file name: {}", item.display()))?;
    let dir = item.parent().unwrap_or_else(|| Path::new(""));
    Ok(dir.join(PROCESSED_DIR).join(name))
}

/// Move an analysed input into its sibling `processed/` directory,
/// creating the directory when absent. Returns the new location.
pub fn move_to_processed(fs: &dyn FileSystem, item: &Path) -> Result<PathBuf> {
    let target = processed_path(item)?;
    if let Some(dir) = target.parent() {
        fs.create_dir_all(dir)
            .with_context(|| format!("creating {}", dir.display()))?;
    }
    fs.rename(item, &target)
        .with_context(|| format!("moving {} to {}", item.display(), target.display()))?;
    debug!(from = %item.display(), to = %target.display(), "input relocated");
    Ok(target)
}
