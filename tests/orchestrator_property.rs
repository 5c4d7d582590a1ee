// tests/orchestrator_property.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use proptest::prelude::*;

use blastq::engine::{FailureKind, Orchestrator, RunState, RuntimeOptions, WorkerMessage};
use blastq::types::JobStatus;
use blastq_test_utils::builders::{valid_mock_fs, RunConfigBuilder};

#[derive(Debug, Clone)]
enum Op {
    Enqueue(u8),
    Remove(Vec<usize>),
    Clear,
    Start,
    Stop,
    Complete,
    Fail,
    MoveFail,
    Progress,
    /// A terminal message for an item that is not running.
    Stray(u8),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0u8..6).prop_map(Op::Enqueue),
        1 => proptest::collection::vec(0usize..8, 0..3).prop_map(Op::Remove),
        1 => Just(Op::Clear),
        2 => Just(Op::Start),
        1 => Just(Op::Stop),
        3 => Just(Op::Complete),
        2 => Just(Op::Fail),
        1 => Just(Op::MoveFail),
        1 => Just(Op::Progress),
        1 => (0u8..6).prop_map(Op::Stray),
    ]
}

fn input(n: u8) -> PathBuf {
    PathBuf::from(format!("/in/{n}.fasta"))
}

fn apply(orch: &mut Orchestrator, op: Op) {
    let running: Option<PathBuf> = orch.running_item().map(Path::to_path_buf);
    match op {
        Op::Enqueue(n) => {
            orch.enqueue(vec![input(n)]);
        }
        Op::Remove(indices) => {
            orch.remove_selected(&indices);
        }
        Op::Clear => {
            orch.clear();
        }
        Op::Start => {
            orch.start();
        }
        Op::Stop => {
            orch.request_stop();
        }
        Op::Complete => {
            if let Some(item) = running {
                orch.handle_message(WorkerMessage::Completed { item });
            }
        }
        Op::Fail => {
            if let Some(item) = running {
                orch.handle_message(WorkerMessage::Failed {
                    item,
                    kind: FailureKind::ProcessExecutionFailed,
                    detail: "exit 2".to_string(),
                });
            }
        }
        Op::MoveFail => {
            if let Some(item) = running {
                orch.handle_message(WorkerMessage::Failed {
                    item,
                    kind: FailureKind::FileMoveFailed,
                    detail: "denied".to_string(),
                });
            }
        }
        Op::Progress => {
            if let Some(item) = running {
                orch.handle_message(WorkerMessage::Progress {
                    item,
                    value: 50,
                    text: "processing".to_string(),
                });
            }
        }
        Op::Stray(n) => {
            let item = input(n);
            if running.as_deref() != Some(item.as_path()) {
                orch.handle_message(WorkerMessage::Completed { item });
            }
        }
    }
}

proptest! {
    #[test]
    fn at_most_one_item_is_ever_running(ops in proptest::collection::vec(op_strategy(), 1..60)) {
        let cfg = RunConfigBuilder::new().build();
        let fs = valid_mock_fs(&cfg);
        let mut orch = Orchestrator::new(cfg, Arc::new(fs), RuntimeOptions::default());

        for op in ops {
            let before_terminal = orch.jobs().count(JobStatus::Done) + orch.jobs().count(JobStatus::Errored);
            let removes = matches!(op, Op::Remove(_) | Op::Clear);

            apply(&mut orch, op);

            let running = orch.jobs().count(JobStatus::Running);
            prop_assert!(running <= 1);
            prop_assert_eq!(running == 1, orch.is_running());
            prop_assert_eq!(
                orch.running_item().map(Path::to_path_buf),
                orch.jobs().running().map(|i| i.path().to_path_buf())
            );
            if orch.stop_requested() {
                prop_assert_eq!(orch.run_state(), RunState::StopPending);
            }

            // Terminal items only disappear through removal.
            let after_terminal = orch.jobs().count(JobStatus::Done) + orch.jobs().count(JobStatus::Errored);
            if !removes {
                prop_assert!(after_terminal >= before_terminal);
            }
        }
    }
}
