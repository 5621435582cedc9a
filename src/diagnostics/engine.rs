//! Diagnostic Engine: runs every registered check against one shared target.

use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, instrument};

use super::registry::{Check, CheckOutcome, CheckRegistry, Verification};
use super::remediation;
use crate::config::DiagnosticsConfig;
use crate::constants::defaults::SUMMARY_MAX_CHARS;
use crate::error::{FleetError, Result};
use crate::evidence::EvidenceStore;
use crate::execution::{RemoteExecutor, RetryPolicy};
use crate::logging::{log_error, log_outcome};
use crate::models::{EvidenceRecord, EvidenceSection, Outcome, RunId, Target};
use crate::state_machine::{CheckEvent, CheckStateMachine};
use crate::utils::text::summarize;

#[derive(Debug, Clone)]
pub struct DiagnosticEngine {
    executor: RemoteExecutor,
    retry: RetryPolicy,
    store: Arc<EvidenceStore>,
    concurrency: usize,
    timeouts: HashMap<String, Duration>,
}

impl DiagnosticEngine {
    pub fn new(
        executor: RemoteExecutor,
        retry: RetryPolicy,
        store: Arc<EvidenceStore>,
        config: &DiagnosticsConfig,
    ) -> Self {
        let timeouts = config
            .check_timeouts_ms
            .iter()
            .map(|(id, ms)| (id.clone(), Duration::from_millis(*ms)))
            .collect();
        Self {
            executor,
            retry,
            store,
            concurrency: config.check_concurrency.max(1),
            timeouts,
        }
    }

    pub fn store(&self) -> &Arc<EvidenceStore> {
        &self.store
    }

    /// Run every check in `registry` against `target`.
    ///
    /// Checks run concurrently; results come back in registration order.
    /// Every check persists one evidence record, even when it passes.
    #[instrument(skip(self, registry), fields(target_id = %target.id, checks = registry.len()))]
    pub async fn run_all(
        &self,
        registry: &CheckRegistry,
        target: &Target,
        run_id: &RunId,
    ) -> Result<Vec<CheckOutcome>> {
        let states = CheckStateMachine::new();
        for check in registry.checks() {
            states.register(&check.id, target.id.as_str())?;
        }

        let started = Instant::now();
        let checks: Vec<(usize, Check)> = registry.checks().iter().cloned().enumerate().collect();
        let states = &states;
        let mut results: Vec<(usize, CheckOutcome)> = stream::iter(checks)
            .map(|(index, check)| async move {
                let outcome = self.run_check(&check, target, run_id, states).await?;
                Ok::<_, FleetError>((index, outcome))
            })
            .buffer_unordered(self.concurrency)
            .try_collect()
            .await?;
        results.sort_by_key(|(index, _)| *index);

        info!(
            target_id = %target.id,
            checks = results.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Diagnostics finished"
        );
        Ok(results.into_iter().map(|(_, outcome)| outcome).collect())
    }

    async fn run_check(
        &self,
        check: &Check,
        target: &Target,
        run_id: &RunId,
        states: &CheckStateMachine,
    ) -> Result<CheckOutcome> {
        states.transition(&check.id, target.id.as_str(), CheckEvent::Start)?;
        let started = Instant::now();

        let mut sections = Vec::with_capacity(check.probes.len());
        let mut attempts = 0;
        for probe in &check.probes {
            let timeout = self
                .timeouts
                .get(&check.id)
                .copied()
                .unwrap_or_else(|| self.executor.timeout_for(probe));
            let outcome = self.retry.execute(&self.executor, target, probe, timeout).await;
            attempts += outcome.attempts;
            sections.push(EvidenceSection::new(
                outcome.command,
                outcome.exit_status,
                outcome.stdout,
                outcome.stderr,
            ));
        }

        let verification =
            match std::panic::catch_unwind(AssertUnwindSafe(|| check.verify(&sections))) {
                Ok(verification) => verification,
                Err(_) => Verification::fail("verifier failed on unexpected output"),
            };

        let mut outcome = Outcome::classified(
            target.id.clone(),
            &check.id,
            verification.classification,
            summarize(&verification.summary, SUMMARY_MAX_CHARS),
        )
        .with_command(
            sections
                .iter()
                .map(|s| s.command.as_str())
                .collect::<Vec<_>>()
                .join(" ; "),
        )
        .with_attempts(attempts.max(1))
        .with_elapsed(started.elapsed());
        if let Some(last) = sections.last() {
            outcome =
                outcome.with_output(last.exit_status, last.stdout.clone(), last.stderr.clone());
        }

        let key = if target.is_local() {
            format!("{} {}", check.id, check.name)
        } else {
            format!("{} {}", check.id, target.name)
        };
        let record = EvidenceRecord {
            check_id: key,
            sections,
        };
        let evidence = self.store.persist_record(run_id, &record).inspect_err(|e| {
            log_error("evidence", "persist_record", &e.to_string(), Some(&check.id));
        })?;
        outcome = outcome.with_evidence(evidence);

        states.transition(
            &check.id,
            target.id.as_str(),
            CheckEvent::Complete(outcome.classification),
        )?;
        log_outcome(&outcome);

        Ok(CheckOutcome {
            check_id: check.id.clone(),
            name: check.name.clone(),
            category: check.category.clone(),
            scope: check.scope,
            remediation: remediation::resolve(&check.id, check.remediation.as_deref()),
            outcome,
        })
    }
}
