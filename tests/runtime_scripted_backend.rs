// tests/runtime_scripted_backend.rs

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;

use blastq::engine::{
    message_channel, ControlEvent, FailureKind, Inbox, Job, Notice, Orchestrator, RunState,
    Runtime, RuntimeOptions,
};
use blastq::types::{DrainPolicy, JobStatus};
use blastq_test_utils::builders::{add_inputs, valid_mock_fs, RunConfigBuilder};
use blastq_test_utils::scripted_backend::{Script, ScriptedBackend};
use blastq_test_utils::{init_tracing, with_timeout};

struct Harness {
    runtime: Runtime<ScriptedBackend>,
    control_tx: mpsc::Sender<ControlEvent>,
    notices: mpsc::UnboundedReceiver<Notice>,
    dispatched: Arc<Mutex<Vec<Job>>>,
    inputs: Vec<PathBuf>,
}

fn options(drain: DrainPolicy, exit_when_idle: bool) -> RuntimeOptions {
    RuntimeOptions {
        exit_when_idle,
        poll_interval: Duration::from_millis(5),
        drain,
        termination_grace: Duration::from_millis(200),
    }
}

fn harness(
    names: &[&str],
    scripts: &[(&str, Script)],
    options: RuntimeOptions,
) -> Harness {
    init_tracing();
    let cfg = RunConfigBuilder::new().build();
    let fs = valid_mock_fs(&cfg);
    let inputs = add_inputs(&fs, Path::new("/in"), names);

    let (msg_tx, msg_rx) = message_channel();
    let mut backend = ScriptedBackend::new(msg_tx);
    for (name, script) in scripts {
        backend = backend.script(name, script.clone());
    }
    let dispatched = backend.dispatched();

    let (control_tx, control_rx) = mpsc::channel(16);
    let (notice_tx, notices) = mpsc::unbounded_channel();
    let core = Orchestrator::new(cfg, Arc::new(fs), options);
    let runtime = Runtime::new(
        core,
        Inbox::new(msg_rx, options.drain),
        control_rx,
        backend,
        notice_tx,
        options,
    );

    Harness {
        runtime,
        control_tx,
        notices,
        dispatched,
        inputs,
    }
}

fn drain_notices(rx: &mut mpsc::UnboundedReceiver<Notice>) -> Vec<Notice> {
    let mut out = Vec::new();
    while let Ok(n) = rx.try_recv() {
        out.push(n);
    }
    out
}

fn dispatched_items(dispatched: &Arc<Mutex<Vec<Job>>>) -> Vec<PathBuf> {
    dispatched.lock().unwrap().iter().map(|j| j.item.clone()).collect()
}

#[tokio::test]
async fn runs_every_item_in_order_then_exits() {
    let mut h = harness(
        &["a.fasta", "b.fasta", "c.fasta"],
        &[],
        options(DrainPolicy::One, true),
    );
    h.control_tx
        .send(ControlEvent::Enqueue(h.inputs.clone()))
        .await
        .unwrap();
    h.control_tx.send(ControlEvent::Start).await.unwrap();

    let summary = with_timeout(h.runtime.run()).await.unwrap();

    assert_eq!(summary.done, 3);
    assert_eq!(summary.errored, 0);
    assert_eq!(summary.queued, 0);
    assert!(summary.is_success());
    assert_eq!(dispatched_items(&h.dispatched), h.inputs);

    let notices = drain_notices(&mut h.notices);
    assert_eq!(
        notices.last(),
        Some(&Notice::Finished { done: 3, errored: 0 })
    );
    let progress = notices
        .iter()
        .filter(|n| matches!(n, Notice::Progress { value: 50, .. }))
        .count();
    assert_eq!(progress, 3);
}

#[tokio::test]
async fn drain_all_policy_reaches_the_same_result() {
    let h = harness(&["a.fasta", "b.fasta"], &[], options(DrainPolicy::All, true));
    h.control_tx
        .send(ControlEvent::Enqueue(h.inputs.clone()))
        .await
        .unwrap();
    h.control_tx.send(ControlEvent::Start).await.unwrap();

    let summary = with_timeout(h.runtime.run()).await.unwrap();
    assert_eq!(summary.done, 2);
    assert_eq!(dispatched_items(&h.dispatched), h.inputs);
}

#[tokio::test]
async fn failed_item_does_not_stop_the_queue() {
    let mut h = harness(
        &["a.fasta", "b.fasta", "c.fasta"],
        &[(
            "b.fasta",
            Script::Fail(
                FailureKind::ProcessExecutionFailed,
                "database not found".to_string(),
            ),
        )],
        options(DrainPolicy::One, true),
    );
    h.control_tx
        .send(ControlEvent::Enqueue(h.inputs.clone()))
        .await
        .unwrap();
    h.control_tx.send(ControlEvent::Start).await.unwrap();

    let summary = with_timeout(h.runtime.run()).await.unwrap();
    assert_eq!(summary.done, 2);
    assert_eq!(summary.errored, 1);
    assert!(!summary.is_success());
    assert_eq!(dispatched_items(&h.dispatched).len(), 3);

    let notices = drain_notices(&mut h.notices);
    assert!(notices.contains(&Notice::ItemFailed {
        item: h.inputs[1].clone(),
        kind: FailureKind::ProcessExecutionFailed,
        detail: "database not found".to_string(),
    }));
    assert_eq!(
        notices.last(),
        Some(&Notice::Finished { done: 2, errored: 1 })
    );
}

#[tokio::test]
async fn refused_dispatch_errors_the_item_and_advances() {
    let h = harness(
        &["a.fasta", "b.fasta"],
        &[("a.fasta", Script::RefuseDispatch)],
        options(DrainPolicy::One, true),
    );
    h.control_tx
        .send(ControlEvent::Enqueue(h.inputs.clone()))
        .await
        .unwrap();
    h.control_tx.send(ControlEvent::Start).await.unwrap();

    let summary = with_timeout(h.runtime.run()).await.unwrap();
    assert_eq!(summary.errored, 1);
    assert_eq!(summary.done, 1);
}

#[tokio::test]
async fn stop_request_lets_current_item_finish() {
    let mut h = harness(
        &["a.fasta", "b.fasta"],
        &[],
        options(DrainPolicy::One, true),
    );
    h.control_tx
        .send(ControlEvent::Enqueue(h.inputs.clone()))
        .await
        .unwrap();
    h.control_tx.send(ControlEvent::Start).await.unwrap();
    h.control_tx.send(ControlEvent::RequestStop).await.unwrap();

    let summary = with_timeout(h.runtime.run()).await.unwrap();
    assert_eq!(summary.done, 1);
    assert_eq!(summary.queued, 1);
    assert_eq!(dispatched_items(&h.dispatched), vec![h.inputs[0].clone()]);

    let notices = drain_notices(&mut h.notices);
    assert!(notices.contains(&Notice::StopRequested));
    assert_eq!(notices.last(), Some(&Notice::Stopped));
}

#[tokio::test]
async fn shutdown_terminates_hanging_worker_without_result() {
    let mut h = harness(
        &["slow.fasta", "b.fasta"],
        &[("slow.fasta", Script::Hang)],
        options(DrainPolicy::One, false),
    );
    h.control_tx
        .send(ControlEvent::Enqueue(h.inputs.clone()))
        .await
        .unwrap();
    h.control_tx.send(ControlEvent::Start).await.unwrap();
    h.control_tx.send(ControlEvent::Shutdown).await.unwrap();

    let summary = with_timeout(h.runtime.run()).await.unwrap();
    assert_eq!(summary.done, 0);
    assert_eq!(summary.errored, 0);
    assert_eq!(dispatched_items(&h.dispatched), vec![h.inputs[0].clone()]);

    let notices = drain_notices(&mut h.notices);
    assert!(notices.contains(&Notice::Terminating {
        item: h.inputs[0].clone()
    }));
    assert!(!notices
        .iter()
        .any(|n| matches!(n, Notice::ItemDone { .. } | Notice::ItemFailed { .. })));
}

#[tokio::test]
async fn idle_poll_is_a_no_op() {
    let mut h = harness(&["a.fasta"], &[], options(DrainPolicy::One, false));

    let keep_running = h.runtime.poll_once().await.unwrap();
    assert!(keep_running);
    assert!(!h.runtime.tick_scheduled());
    assert_eq!(h.runtime.core().run_state(), RunState::Idle);
    assert!(h.runtime.core().jobs().is_empty());
    assert!(drain_notices(&mut h.notices).is_empty());
}

#[tokio::test]
async fn start_schedules_polling_until_idle() {
    let mut h = harness(&["a.fasta"], &[], options(DrainPolicy::One, false));

    h.runtime
        .handle_control(ControlEvent::Enqueue(h.inputs.clone()))
        .await
        .unwrap();
    assert!(!h.runtime.tick_scheduled());

    h.runtime.handle_control(ControlEvent::Start).await.unwrap();
    assert!(h.runtime.tick_scheduled());
    assert!(h.runtime.has_worker());

    // Poll until the scripted worker's messages have been handled.
    with_timeout(async {
        while h.runtime.core().is_running() {
            tokio::time::sleep(Duration::from_millis(2)).await;
            h.runtime.poll_once().await.unwrap();
        }
    })
    .await;

    assert!(!h.runtime.has_worker());
    assert!(!h.runtime.tick_scheduled());
    assert_eq!(
        h.runtime.core().jobs().status_of(&h.inputs[0]),
        Some(JobStatus::Done)
    );
}

#[tokio::test]
async fn closing_control_channel_while_idle_ends_the_loop() {
    let h = harness(&["a.fasta"], &[], options(DrainPolicy::One, false));
    drop(h.control_tx);

    let summary = with_timeout(h.runtime.run()).await.unwrap();
    assert_eq!(summary.done, 0);
    assert_eq!(summary.queued, 0);
}
