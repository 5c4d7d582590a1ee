// tests/command_and_report.rs

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use blastq::cli::LogLevel;
use blastq::engine::{FailureKind, Notice};
use blastq::exec::command::{result_path, BlastCommand, OUTPUT_FORMAT};
use blastq::exec::relocate::{move_to_processed, processed_path};
use blastq::fs::mock::MockFileSystem;
use blastq::fs::FileSystem;
use blastq::logging::resolve_level;
use blastq::queue::RemoveOutcome;
use blastq::report::{render, truncate_detail, Severity, MAX_DETAIL_CHARS};
use blastq_test_utils::builders::RunConfigBuilder;

#[test]
fn command_line_matches_blastn_invocation() {
    let cfg = RunConfigBuilder::new()
        .blast_path("/opt/blast/bin")
        .database_path("/data/db")
        .database_name("ref_prok_rep_genomes")
        .num_threads(8)
        .build();
    let cmd = BlastCommand::build(Path::new("/in/a.fasta"), &cfg);

    assert_eq!(cmd.program, cfg.executable());
    assert_eq!(cmd.cwd, PathBuf::from("/data/db"));

    let expected: Vec<OsString> = [
        "-task",
        "megablast",
        "-query",
        "/in/a.fasta",
        "-db",
        "ref_prok_rep_genomes",
        "-out",
        "/in/a.fasta_result.csv",
        "-outfmt",
        "6 pident sacc staxid ssciname stitle",
        "-num_threads",
        "8",
    ]
    .iter()
    .map(OsString::from)
    .collect();
    assert_eq!(cmd.args, expected);
    assert_eq!(OUTPUT_FORMAT, "6 pident sacc staxid ssciname stitle");
}

#[test]
fn display_quotes_arguments_with_spaces() {
    let cfg = RunConfigBuilder::new().build();
    let cmd = BlastCommand::build(Path::new("/in/my sample.fasta"), &cfg);
    let shown = cmd.display();
    assert!(shown.contains("-query \"/in/my sample.fasta\""));
    assert!(shown.contains("-outfmt \"6 pident sacc staxid ssciname stitle\""));
    assert!(shown.contains("-num_threads 4"));
}

#[test]
fn result_path_appends_suffix_to_full_name() {
    assert_eq!(
        result_path(Path::new("/in/a.fasta")),
        PathBuf::from("/in/a.fasta_result.csv")
    );
}

#[test]
fn processed_path_is_a_sibling_directory() {
    assert_eq!(
        processed_path(Path::new("/in/a.fasta")).unwrap(),
        PathBuf::from("/in/processed/a.fasta")
    );
    assert!(processed_path(Path::new("/")).is_err());
}

#[test]
fn relocation_creates_processed_dir_and_moves_file() {
    let fs = MockFileSystem::new();
    fs.add_file("/in/a.fasta", ">x\nACGT\n");

    let target = move_to_processed(&fs, Path::new("/in/a.fasta")).unwrap();
    assert_eq!(target, PathBuf::from("/in/processed/a.fasta"));
    assert!(!fs.exists(Path::new("/in/a.fasta")));
    assert!(fs.is_dir(Path::new("/in/processed")));
    assert_eq!(fs.file_contents(&target), Some(b">x\nACGT\n".to_vec()));
}

#[test]
fn relocation_failure_keeps_the_input() {
    let fs = MockFileSystem::new();
    fs.add_file("/in/a.fasta", "x");
    fs.deny_writes_under("/in/processed");

    assert!(move_to_processed(&fs, Path::new("/in/a.fasta")).is_err());
    assert!(fs.is_file(Path::new("/in/a.fasta")));
}

#[test]
fn relocation_replaces_an_earlier_processed_copy() {
    let fs = MockFileSystem::new();
    fs.add_file("/in/processed/a.fasta", "old");
    fs.add_file("/in/a.fasta", "new");

    let target = move_to_processed(&fs, Path::new("/in/a.fasta")).unwrap();
    assert_eq!(fs.file_contents(&target), Some(b"new".to_vec()));
    assert!(!fs.exists(Path::new("/in/a.fasta")));
}

#[test]
fn long_stderr_is_truncated_with_ellipsis() {
    let long = "e".repeat(MAX_DETAIL_CHARS + 50);
    let cut = truncate_detail(&long, MAX_DETAIL_CHARS);
    assert_eq!(cut.len(), MAX_DETAIL_CHARS + 3);
    assert!(cut.ends_with("..."));

    assert_eq!(truncate_detail("short", MAX_DETAIL_CHARS), "short");
    // Counted in characters, not bytes.
    assert_eq!(truncate_detail("ééé", 2), "éé...");
}

#[test]
fn each_failure_kind_renders_distinct_text() {
    let item = PathBuf::from("/in/a.fasta");
    let texts: Vec<String> = [
        FailureKind::ExecutableNotFound,
        FailureKind::ProcessExecutionFailed,
        FailureKind::FileMoveFailed,
        FailureKind::Unexpected,
    ]
    .into_iter()
    .map(|kind| {
        render(&Notice::ItemFailed {
            item: item.clone(),
            kind,
            detail: "detail".to_string(),
        })
        .text
    })
    .collect();

    for (i, a) in texts.iter().enumerate() {
        assert!(a.starts_with("a.fasta"));
        for b in texts.iter().skip(i + 1) {
            assert_ne!(a, b);
        }
    }
}

#[test]
fn process_failure_text_truncates_stderr() {
    let rendered = render(&Notice::ItemFailed {
        item: PathBuf::from("a.fasta"),
        kind: FailureKind::ProcessExecutionFailed,
        detail: "x".repeat(1000),
    });
    assert_eq!(rendered.severity, Severity::Error);
    assert!(rendered.text.ends_with("..."));
    assert!(rendered.text.len() < 400);
}

#[test]
fn move_warning_and_finished_severities() {
    let warn = render(&Notice::MoveWarning {
        item: PathBuf::from("/in/a.fasta"),
        detail: "denied".to_string(),
    });
    assert_eq!(warn.severity, Severity::Warn);

    let clean = render(&Notice::Finished { done: 2, errored: 0 });
    assert_eq!(clean.severity, Severity::Info);
    assert_eq!(clean.text, "all files done");

    let errors = render(&Notice::Finished { done: 1, errored: 1 });
    assert_eq!(errors.severity, Severity::Warn);
    assert!(errors.text.contains("1 failed"));
}

#[test]
fn blocked_removal_is_a_warning() {
    let rendered = render(&Notice::Removed(RemoveOutcome {
        removed: 0,
        blocked_by_running: true,
    }));
    assert_eq!(rendered.severity, Severity::Warn);
    assert_eq!(
        render(&Notice::Cleared { removed: 0 }).text,
        "nothing to clear"
    );
}

#[test]
fn log_level_prefers_flag_then_env() {
    assert_eq!(
        resolve_level(Some(LogLevel::Debug), Some("error")),
        tracing::Level::DEBUG
    );
    assert_eq!(resolve_level(None, Some("warning")), tracing::Level::WARN);
    assert_eq!(resolve_level(None, Some("nonsense")), tracing::Level::INFO);
    assert_eq!(resolve_level(None, None), tracing::Level::INFO);
}
