//! Fan-out Integration Tests
//!
//! Drives the coordinator with scripted hosts: timeouts, refused
//! connections, flaky hosts and panicking workers.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{coordinator, executor, hosts, HostBehavior, ScriptedHosts};
use fleetcheck_core::config::FanoutConfig;
use fleetcheck_core::execution::{sort_by_target, FanoutCoordinator, RetryPolicy};
use fleetcheck_core::models::{Classification, FleetVerdict, Operation, OperationSequence};
use fleetcheck_core::report::FleetSummary;

#[tokio::test]
async fn timeout_on_one_host_is_reported_by_name() {
    let runner = Arc::new(ScriptedHosts::new().with("B", HostBehavior::Hang));
    let fanout = FanoutCoordinator::new(
        executor(Arc::clone(&runner), Duration::from_millis(100)),
        RetryPolicy::no_retry(),
        &FanoutConfig::default(),
    );

    let mut outcomes = fanout
        .dispatch(&hosts(&["A", "B", "C"]), &Operation::new("echo", "echo OK"))
        .await;
    assert_eq!(outcomes.len(), 3);

    sort_by_target(&mut outcomes);
    assert_eq!(outcomes[0].classification, Classification::Ok);
    assert_eq!(outcomes[1].classification, Classification::Fail);
    assert_eq!(outcomes[1].exit_status, Some(124));
    assert!(outcomes[1].stderr.contains("TIMEOUT after 100ms"));
    assert_eq!(outcomes[2].classification, Classification::Ok);

    let summary = FleetSummary::new("echo", outcomes);
    assert_eq!(summary.summary_line(), "2/3 succeeded; failed: B");
    assert_eq!(summary.verdict, FleetVerdict::PartialFailure);
    assert_ne!(summary.exit_code(), 0);
}

#[tokio::test]
async fn refused_connection_is_retried_then_reported() {
    let runner = Arc::new(
        ScriptedHosts::new().with("B", HostBehavior::Refuse("Connection refused".to_string())),
    );
    let retry = RetryPolicy::new(3, Duration::from_millis(10));
    let outcomes = coordinator(Arc::clone(&runner), retry, 4)
        .dispatch(&hosts(&["A", "B"]), &Operation::new("echo", "echo OK"))
        .await;

    let b = outcomes.iter().find(|o| o.target.as_str() == "B").unwrap();
    assert_eq!(b.classification, Classification::Fail);
    assert_eq!(b.attempts, 3);
    assert!(b.stderr.contains("Connection refused"));
    assert_eq!(b.exit_status, None);
    assert_eq!(runner.calls("B"), 3);
    assert_eq!(runner.calls("A"), 1);
}

#[tokio::test]
async fn flaky_host_recovers_within_attempt_budget() {
    let runner = Arc::new(ScriptedHosts::new().with("B", HostBehavior::FlakyFor(2)));
    let retry = RetryPolicy::new(3, Duration::from_millis(5));
    let outcomes = coordinator(Arc::clone(&runner), retry, 2)
        .dispatch(&hosts(&["B"]), &Operation::new("echo", "echo OK"))
        .await;

    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].is_ok());
    assert_eq!(outcomes[0].attempts, 3);
    assert_eq!(runner.calls("B"), 3);
}

#[tokio::test]
async fn panicking_worker_still_yields_an_outcome() {
    let runner = Arc::new(ScriptedHosts::new().with("B", HostBehavior::Panic));
    let outcomes = coordinator(runner, RetryPolicy::no_retry(), 3)
        .dispatch(&hosts(&["A", "B", "C"]), &Operation::new("echo", "echo OK"))
        .await;

    assert_eq!(outcomes.len(), 3);
    let b = outcomes.iter().find(|o| o.target.as_str() == "B").unwrap();
    assert!(!b.success);
    assert!(b.summary.contains("worker panicked"));
    assert_eq!(outcomes.iter().filter(|o| o.success).count(), 2);
}

#[tokio::test]
async fn expected_output_mismatch_fails_the_host() {
    let runner = Arc::new(
        ScriptedHosts::new().with("B", HostBehavior::Succeed("FAIL\n".to_string())),
    );
    let operation = Operation::new("echo", "echo OK")
        .expecting(fleetcheck_core::models::ExpectedOutput::Contains("OK".to_string()));
    let mut outcomes = coordinator(runner, RetryPolicy::no_retry(), 2)
        .dispatch(&hosts(&["A", "B"]), &operation)
        .await;
    sort_by_target(&mut outcomes);

    assert!(outcomes[0].is_ok());
    assert!(!outcomes[1].is_ok());
    assert!(outcomes[1].summary.contains("expected"));
}

#[tokio::test]
async fn sequence_stops_each_host_at_its_first_failure() {
    let runner = Arc::new(
        ScriptedHosts::new().with("B", HostBehavior::Exit(1, "scp: permission denied".to_string())),
    );
    let sequence = OperationSequence::new(
        "copy_kubeconfig",
        vec![
            Operation::new("copy", "scp /etc/rancher/rke2/rke2.yaml {address}:/root/.kube/config"),
            Operation::new("patch", "sed -i 's|127.0.0.1|{address}|' /root/.kube/config"),
        ],
    );
    let mut outcomes = coordinator(Arc::clone(&runner), RetryPolicy::no_retry(), 2)
        .dispatch_sequence(&hosts(&["A", "B"]), &sequence)
        .await;
    sort_by_target(&mut outcomes);

    assert!(outcomes[0].is_ok());
    assert_eq!(outcomes[0].summary, "2 steps completed");
    assert_eq!(runner.calls("A"), 2);

    assert_eq!(outcomes[1].failed_step.as_deref(), Some("copy"));
    assert!(outcomes[1].summary.contains("permission denied"));
    assert_eq!(runner.calls("B"), 1);
}

#[tokio::test]
async fn empty_target_set_is_vacuously_ok() {
    let runner = Arc::new(ScriptedHosts::new());
    let outcomes = coordinator(runner, RetryPolicy::no_retry(), 4)
        .dispatch(&[], &Operation::new("echo", "echo OK"))
        .await;
    assert!(outcomes.is_empty());
    assert_eq!(FleetSummary::new("echo", outcomes).verdict, FleetVerdict::Ok);
}
