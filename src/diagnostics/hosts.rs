use std::sync::Arc;

use super::classifier::SeverityClassifier;
use super::engine::DiagnosticEngine;
use super::registry::{CheckOutcome, CheckRegistry};
use crate::execution::{FanoutCoordinator, RemoteExecutor, RetryPolicy};
use crate::models::{RunId, Target, Verdict};

/// Check results for one host
#[derive(Debug, Clone)]
pub struct HostReport {
    pub target: Target,
    pub checks: Vec<CheckOutcome>,
    pub verdict: Verdict,
    /// Set when the host's checks could not run at all
    pub error: Option<String>,
}

impl HostReport {
    fn failed(target: &Target, reason: String) -> Self {
        Self {
            target: target.clone(),
            checks: Vec::new(),
            verdict: Verdict::Unavailable,
            error: Some(reason),
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &CheckOutcome> {
        self.checks.iter().filter(|check| check.is_in_scope_failure())
    }
}

/// Run `registry` on every host through the coordinator's worker pool.
/// Reports are sorted by target id.
pub async fn run_on_hosts(
    fanout: &FanoutCoordinator,
    engine: &DiagnosticEngine,
    registry: Arc<CheckRegistry>,
    classifier: &SeverityClassifier,
    targets: &[Target],
    run_id: &RunId,
) -> Vec<HostReport> {
    let classifier = Arc::new(classifier.clone());
    let engine = engine.clone();
    let run_id = run_id.clone();

    let mut reports = fanout
        .fan_out(
            targets,
            move |_executor: RemoteExecutor, _retry: RetryPolicy, target: Target| {
                let engine = engine.clone();
                let registry = Arc::clone(&registry);
                let classifier = Arc::clone(&classifier);
                let run_id = run_id.clone();
                async move {
                    match engine.run_all(&registry, &target, &run_id).await {
                        Ok(checks) => HostReport {
                            verdict: classifier.classify(&checks),
                            target,
                            checks,
                            error: None,
                        },
                        Err(e) => HostReport::failed(&target, e.to_string()),
                    }
                }
            },
            |target: &Target, reason: String| HostReport::failed(target, reason),
        )
        .await;
    reports.sort_by(|a, b| a.target.id.cmp(&b.target.id));
    reports
}

/// Worst host verdict; no hosts is operational
pub fn fleet_verdict(reports: &[HostReport]) -> Verdict {
    reports
        .iter()
        .map(|report| report.verdict)
        .max()
        .unwrap_or(Verdict::Operational)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DiagnosticsConfig, ExecutorConfig, FanoutConfig};
    use crate::diagnostics::registry::{Check, Verification};
    use crate::evidence::EvidenceStore;
    use crate::execution::{CommandRunner, RawOutput, TransportError};
    use crate::models::{EvidenceSection, Operation};
    use async_trait::async_trait;

    /// Host `bad` has swap enabled
    struct Hosts;

    #[async_trait]
    impl CommandRunner for Hosts {
        async fn run(&self, target: &Target, _command: &str) -> Result<RawOutput, TransportError> {
            let swap = if target.name == "bad" { "/swap.img file 4G 0B -2\n" } else { "" };
            Ok(RawOutput::new(0, swap, ""))
        }
    }

    #[tokio::test]
    async fn test_each_host_classified_independently() {
        let dir = tempfile::tempdir().unwrap();
        let executor = RemoteExecutor::new(Arc::new(Hosts), &ExecutorConfig::default());
        let engine = DiagnosticEngine::new(
            executor.clone(),
            RetryPolicy::no_retry(),
            Arc::new(EvidenceStore::new(dir.path())),
            &DiagnosticsConfig::default(),
        );
        let fanout =
            FanoutCoordinator::new(executor, RetryPolicy::no_retry(), &FanoutConfig::default());

        let mut registry = CheckRegistry::new();
        registry
            .register(Check::new(
                "node.swap",
                "Swap disabled",
                "Node preflight",
                vec![Operation::new("probe", "swapon --show --noheadings")],
                crate::diagnostics::node_checks::verify_swap_disabled,
            ))
            .unwrap();
        registry
            .register(Check::new(
                "node.extra",
                "Extra",
                "Node preflight",
                vec![],
                |_: &[EvidenceSection]| Verification::ok("fine"),
            ))
            .unwrap();

        let targets = vec![Target::ssh("good", "10.0.0.1"), Target::ssh("bad", "10.0.0.2")];
        let classifier = SeverityClassifier::new(["node.swap"]);
        let reports = run_on_hosts(
            &fanout,
            &engine,
            Arc::new(registry),
            &classifier,
            &targets,
            &RunId::new("pre"),
        )
        .await;

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].target.name, "bad");
        assert_eq!(reports[0].verdict, Verdict::Unavailable);
        assert_eq!(reports[0].failures().count(), 1);
        assert_eq!(reports[1].verdict, Verdict::Operational);
        assert_eq!(fleet_verdict(&reports), Verdict::Unavailable);
        // Evidence is kept per check and host
        assert!(dir.path().join("evidence_pre").join("node_swap_bad.txt").exists());
    }
}
