//! Fan-out Coordinator.
//!
//! Dispatches one job per target on a bounded worker pool and gathers every
//! result. A failing, slow or panicking target never cancels or blocks its
//! siblings, and the coordinator always returns exactly one result per
//! target. Results arrive in completion order; sort them before rendering.

use futures::FutureExt;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info};

use super::executor::RemoteExecutor;
use super::retry::RetryPolicy;
use crate::config::FanoutConfig;
use crate::logging::log_outcome;
use crate::models::{Operation, OperationSequence, Outcome, Target, TargetId};

#[derive(Debug, Clone)]
pub struct FanoutCoordinator {
    executor: RemoteExecutor,
    retry: RetryPolicy,
    pool_size: usize,
}

impl FanoutCoordinator {
    pub fn new(executor: RemoteExecutor, retry: RetryPolicy, config: &FanoutConfig) -> Self {
        Self {
            executor,
            retry,
            pool_size: config.pool_size.max(1),
        }
    }

    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size.max(1);
        self
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Worker count actually used for `target_count` targets
    pub fn effective_pool_size(&self, target_count: usize) -> usize {
        self.pool_size.min(target_count).max(1)
    }

    pub fn executor(&self) -> &RemoteExecutor {
        &self.executor
    }

    pub fn retry(&self) -> RetryPolicy {
        self.retry
    }

    /// Run `operation` (retry-wrapped) on every target
    pub async fn dispatch(&self, targets: &[Target], operation: &Operation) -> Vec<Outcome> {
        let operation = Arc::new(operation.clone());
        let label = operation.name.clone();
        let outcomes = self
            .fan_out(
                targets,
                {
                    let operation = Arc::clone(&operation);
                    move |executor: RemoteExecutor, retry: RetryPolicy, target: Target| {
                        let operation = Arc::clone(&operation);
                        async move {
                            let timeout = executor.timeout_for(&operation);
                            retry.execute(&executor, &target, &operation, timeout).await
                        }
                    }
                },
                move |target: &Target, reason: String| {
                    Outcome::fail(target.id.clone(), &label, reason)
                },
            )
            .await;
        outcomes.iter().for_each(log_outcome);
        outcomes
    }

    /// Run `sequence` on every target, stopping each target at its first failed step
    pub async fn dispatch_sequence(
        &self,
        targets: &[Target],
        sequence: &OperationSequence,
    ) -> Vec<Outcome> {
        let sequence = Arc::new(sequence.clone());
        let label = sequence.name.clone();
        let outcomes = self
            .fan_out(
                targets,
                {
                    let sequence = Arc::clone(&sequence);
                    move |executor: RemoteExecutor, retry: RetryPolicy, target: Target| {
                        let sequence = Arc::clone(&sequence);
                        async move { run_sequence(&executor, retry, &target, &sequence).await }
                    }
                },
                move |target: &Target, reason: String| {
                    Outcome::fail(target.id.clone(), &label, reason)
                },
            )
            .await;
        outcomes.iter().for_each(log_outcome);
        outcomes
    }

    /// Bounded fan-out of an arbitrary per-target job.
    ///
    /// `lost` builds the result for a target whose task panicked or was
    /// cancelled, so the result count always equals `targets.len()`.
    pub async fn fan_out<T, F, Fut, L>(&self, targets: &[Target], job: F, lost: L) -> Vec<T>
    where
        T: Send + 'static,
        F: Fn(RemoteExecutor, RetryPolicy, Target) -> Fut,
        Fut: Future<Output = T> + Send + 'static,
        L: Fn(&Target, String) -> T,
    {
        if targets.is_empty() {
            return Vec::new();
        }

        let workers = self.effective_pool_size(targets.len());
        let semaphore = Arc::new(Semaphore::new(workers));
        let started = Instant::now();
        info!(
            targets = targets.len(),
            workers = workers,
            "Fan-out started"
        );

        let mut pending: HashMap<usize, Target> = HashMap::with_capacity(targets.len());
        let mut tasks = JoinSet::new();
        for (index, target) in targets.iter().enumerate() {
            pending.insert(index, target.clone());
            let work = job(self.executor.clone(), self.retry, target.clone());
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let result = AssertUnwindSafe(work).catch_unwind().await;
                (index, result.map_err(panic_message))
            });
        }

        let mut results = Vec::with_capacity(targets.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, Ok(result))) => {
                    pending.remove(&index);
                    results.push(result);
                }
                Ok((index, Err(reason))) => {
                    if let Some(target) = pending.remove(&index) {
                        error!(target_id = %target.id, reason = %reason, "Worker panicked");
                        results.push(lost(&target, format!("worker panicked: {reason}")));
                    }
                }
                Err(join_error) => {
                    error!(error = %join_error, "Worker task failed to join");
                }
            }
        }

        // Tasks that failed to join are accounted for here
        let mut leftovers: Vec<(usize, Target)> = pending.into_iter().collect();
        leftovers.sort_by_key(|(index, _)| *index);
        for (_, target) in leftovers {
            results.push(lost(&target, "worker task was lost".to_string()));
        }

        info!(
            targets = targets.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Fan-out finished"
        );
        results
    }
}

async fn run_sequence(
    executor: &RemoteExecutor,
    retry: RetryPolicy,
    target: &Target,
    sequence: &OperationSequence,
) -> Outcome {
    let started = Instant::now();
    let mut attempts = 0;
    let mut last: Option<Outcome> = None;

    for step in &sequence.steps {
        let timeout = executor.timeout_for(step);
        let outcome = retry.execute(executor, target, step, timeout).await;
        attempts += outcome.attempts;
        if !outcome.is_ok() {
            let summary = format!("step '{}' failed: {}", step.name, outcome.summary);
            return Outcome::fail(target.id.clone(), &sequence.name, summary)
                .with_command(outcome.command)
                .with_output(outcome.exit_status, outcome.stdout, outcome.stderr)
                .with_failed_step(&step.name)
                .with_attempts(attempts)
                .with_elapsed(started.elapsed());
        }
        last = Some(outcome);
    }

    let summary = format!("{} steps completed", sequence.steps.len());
    let outcome = Outcome::ok(target.id.clone(), &sequence.name, summary)
        .with_attempts(attempts.max(1))
        .with_elapsed(started.elapsed());
    match last {
        Some(step) => outcome
            .with_command(step.command)
            .with_output(step.exit_status, step.stdout, step.stderr),
        None => outcome,
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Sort outcomes for presentation: failures first, then by target id
pub fn sort_for_report(outcomes: &mut [Outcome]) {
    outcomes.sort_by(|a, b| a.is_ok().cmp(&b.is_ok()).then_with(|| a.target.cmp(&b.target)));
}

/// Sort outcomes by target id only
pub fn sort_by_target(outcomes: &mut [Outcome]) {
    outcomes.sort_by(|a, b| a.target.cmp(&b.target));
}

/// Elapsed time of the slowest target
pub fn slowest(outcomes: &[Outcome]) -> Option<(&TargetId, Duration)> {
    outcomes
        .iter()
        .max_by_key(|o| o.elapsed)
        .map(|o| (&o.target, o.elapsed))
}
