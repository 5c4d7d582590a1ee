pub mod builders;
pub mod scripted_backend;

use std::path::{Path, PathBuf};
use std::sync::Once;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer() // print only for failing tests unless --nocapture
            .with_target(true)
            .init();
    });
}

/// Run a future with a 5-second timeout.
#[allow(dead_code)]
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}

/// Create `<dir>/<name>.nal` so the database check passes.
pub fn write_database(dir: &Path, name: &str) -> PathBuf {
    std::fs::create_dir_all(dir).expect("create database dir");
    let alias = dir.join(format!("{name}.nal"));
    std::fs::write(&alias, "TITLE test\nDBLIST test\n").expect("write alias file");
    alias
}

/// Shell stand-in for `blastn`, keyed on the `-query` file name:
///
/// - `*fail*`: prints "database not found" to stderr and exits 2
/// - `*slow*`: sleeps 30s (to be terminated)
/// - `*stubborn*`: ignores SIGTERM and loops until killed
/// - anything else: writes one tabular hit to `-out`, the working directory
///   to `<out>.cwd`, and exits 0
#[cfg(unix)]
const FAKE_BLASTN: &str = r#"#!/bin/sh
query=""
out=""
while [ $# -gt 0 ]; do
  case "$1" in
    -query) query="$2"; shift 2 ;;
    -out) out="$2"; shift 2 ;;
    *) shift ;;
  esac
done
case "$query" in
  *fail*) echo "database not found" >&2; exit 2 ;;
  *slow*) exec sleep 30 ;;
  *stubborn*)
    trap '' TERM
    while :; do sleep 1 >/dev/null 2>&1 </dev/null; done ;;
esac
pwd > "$out.cwd"
printf '99.5\tNZ_CP000001\t562\tEscherichia coli\tE. coli chromosome\n' > "$out"
exit 0
"#;

/// Write the fake `blastn` into `dir` and return its path.
#[cfg(unix)]
pub fn write_fake_blastn(dir: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    std::fs::create_dir_all(dir).expect("create bin dir");
    let path = dir.join("blastn");
    std::fs::write(&path, FAKE_BLASTN).expect("write fake blastn");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("chmod fake blastn");
    path
}
