//! Diagnostics Integration Tests
//!
//! Runs the cluster check registry against a fake kubectl, then
//! classifies and renders the result.

mod common;

use std::path::Path;
use std::sync::Arc;

use common::{engine, FakeCluster};
use fleetcheck_core::config::{DiagnosticsConfig, ReportConfig};
use fleetcheck_core::diagnostics::{cluster_registry, preflight_cluster, SeverityClassifier};
use fleetcheck_core::evidence::EvidenceStore;
use fleetcheck_core::execution::RawOutput;
use fleetcheck_core::models::{Classification, RunId, RunMetadata, Target, Verdict};
use fleetcheck_core::report::{ReportBuilder, Style};
use fleetcheck_core::{CheckOutcome, FleetError};

async fn run_cluster(
    cluster: FakeCluster,
    store: Arc<EvidenceStore>,
    run: &RunId,
) -> Vec<CheckOutcome> {
    let registry =
        cluster_registry(Path::new("/usr/local/bin/kubectl"), &DiagnosticsConfig::default())
            .unwrap();
    engine(Arc::new(cluster), store)
        .run_all(&registry, &Target::local("default"), run)
        .await
        .unwrap()
}

fn find<'a>(outcomes: &'a [CheckOutcome], id: &str) -> &'a CheckOutcome {
    outcomes.iter().find(|o| o.check_id == id).unwrap()
}

#[tokio::test]
async fn healthy_cluster_is_operational_with_evidence_for_every_check() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(EvidenceStore::new(dir.path()));
    let run = RunId::new("healthy");
    let outcomes = run_cluster(FakeCluster::healthy(), Arc::clone(&store), &run).await;

    assert_eq!(outcomes.len(), 8);
    for outcome in &outcomes {
        assert_eq!(
            outcome.classification(),
            Classification::Ok,
            "{} failed: {}",
            outcome.check_id,
            outcome.outcome.summary
        );
    }
    assert_eq!(SeverityClassifier::default().classify(&outcomes), Verdict::Operational);

    let files = std::fs::read_dir(store.run_dir(&run)).unwrap().count();
    assert_eq!(files, 8);
    assert!(store.run_dir(&run).join("2_1_nodes_ready.txt").exists());
}

#[tokio::test]
async fn not_ready_node_fails_nodes_ready_and_makes_cluster_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let nodes = "\
NAME   STATUS     ROLES                       AGE   VERSION
cp-1   Ready      control-plane,etcd,master   40d   v1.28.9+rke2r1
w-1    NotReady   <none>                      40d   v1.28.9+rke2r1
";
    let cluster = FakeCluster::healthy().answer("get nodes", RawOutput::new(0, nodes, ""));
    // `get nodes -o json` must keep its own answer
    let cluster = cluster.answer(
        "get nodes -o json",
        RawOutput::new(0, common::nodes_json(&["v1.28.9+rke2r1"]), ""),
    );
    let store = Arc::new(EvidenceStore::new(dir.path()));
    let outcomes = run_cluster(cluster, store, &RunId::new("nr")).await;

    let nodes_ready = find(&outcomes, "2.1");
    assert_eq!(nodes_ready.classification(), Classification::Fail);
    assert!(nodes_ready.outcome.summary.contains("w-1"));
    assert!(!nodes_ready.outcome.summary.contains("cp-1"));
    assert_eq!(SeverityClassifier::default().classify(&outcomes), Verdict::Unavailable);
}

#[tokio::test]
async fn rbac_denied_dns_probe_is_not_applicable() {
    let dir = tempfile::tempdir().unwrap();
    let cluster = FakeCluster::healthy().answer(
        "run dns-check-",
        RawOutput::new(
            1,
            "",
            "Error from server (Forbidden): pods is forbidden: User \"support\" cannot create resource \"pods\"",
        ),
    );
    let store = Arc::new(EvidenceStore::new(dir.path()));
    let outcomes = run_cluster(cluster, store, &RunId::new("rbac")).await;

    let dns = find(&outcomes, "4.2");
    assert_eq!(dns.classification(), Classification::NotApplicable);
    assert!(!dns.is_in_scope_failure());
    assert_eq!(SeverityClassifier::default().classify(&outcomes), Verdict::Operational);
    assert_eq!(SeverityClassifier::default().tally(&outcomes).not_applicable, 1);
}

#[tokio::test]
async fn missing_dns_endpoints_degrade_and_are_reported_with_hint() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(EvidenceStore::new(dir.path().join("evidence")));
    let endpoints = "NAME                        ENDPOINTS   AGE\nrke2-coredns-rke2-coredns   <none>      40d\n";
    let cluster = FakeCluster::healthy()
        .answer("get endpoints -n kube-system", RawOutput::new(0, endpoints, ""));

    let mut run = RunMetadata::new("RKE2 cluster health report").with_run_id(RunId::new("dns"));
    run.context = Some("default".to_string());
    let outcomes = run_cluster(cluster, Arc::clone(&store), &run.run_id).await;

    let verdict = SeverityClassifier::default().classify(&outcomes);
    assert_eq!(verdict, Verdict::Degraded);

    let config = ReportConfig {
        output_dir: dir.path().to_path_buf(),
        ..ReportConfig::default()
    };
    let report = ReportBuilder::new(&config).build(&run, &outcomes, verdict, &store);
    assert_eq!(report.failures().len(), 1);
    assert_eq!(report.failures()[0].check_id, "4.3");
    assert_eq!(report.exit_code(), 1);

    let path = report.write(&store).unwrap();
    let text = std::fs::read_to_string(path).unwrap();
    assert!(text.contains("VERDICT: PLATFORM DEGRADED"));
    assert!(text.contains("CoreDNS is down or its Service has no endpoints."));
    assert!(text.contains("2_1_nodes_ready.txt"));
    assert_eq!(report.render(Style::plain()), text);
}

#[tokio::test]
async fn missing_kubectl_aborts_with_environment_error_and_debug_evidence() {
    let dir = tempfile::tempdir().unwrap();
    let store = EvidenceStore::new(dir.path());
    let executor =
        common::executor(Arc::new(FakeCluster::healthy()), std::time::Duration::from_secs(1));
    let mut run = RunMetadata::new("health").with_run_id(RunId::new("env"));

    let err = preflight_cluster(
        &executor,
        &store,
        &mut run,
        Some(Path::new("/nonexistent/bin/kubectl")),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, FleetError::Environment { .. }));
    assert_eq!(err.exit_code(), 3);
    assert!(err.remediation().is_some());
    assert!(store.run_dir(&run.run_id).join("00_env_debug.txt").exists());
}
