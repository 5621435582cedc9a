//! Remote Executor: one operation against one target, bounded in time.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use super::runner::{CommandRunner, RawOutput};
use crate::config::ExecutorConfig;
use crate::constants::{defaults, TIMEOUT_EXIT_STATUS};
use crate::models::{Operation, Outcome, Target};
use crate::utils::text::summarize;

/// Executes operations through a [`CommandRunner`] and converts every
/// failure mode into a classified [`Outcome`].
///
/// `execute` never returns an error: timeouts, spawn failures, connection
/// failures, non-zero exits and unmet output predicates all become `FAIL`
/// outcomes carrying the raw error text.
#[derive(Clone)]
pub struct RemoteExecutor {
    runner: Arc<dyn CommandRunner>,
    default_timeout: Duration,
    /// Extra budget granted to non-local targets for connection setup
    connect_allowance: Duration,
}

impl std::fmt::Debug for RemoteExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteExecutor")
            .field("default_timeout", &self.default_timeout)
            .field("connect_allowance", &self.connect_allowance)
            .finish_non_exhaustive()
    }
}

impl RemoteExecutor {
    pub fn new(runner: Arc<dyn CommandRunner>, config: &ExecutorConfig) -> Self {
        Self {
            runner,
            default_timeout: config.timeout(),
            connect_allowance: config.connect_allowance(),
        }
    }

    pub fn with_connect_allowance(mut self, allowance: Duration) -> Self {
        self.connect_allowance = allowance;
        self
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Timeout an operation runs with when the caller does not pass one
    pub fn timeout_for(&self, operation: &Operation) -> Duration {
        operation.timeout.unwrap_or(self.default_timeout)
    }

    /// Render and run `operation` against `target` within `timeout`.
    pub async fn execute(
        &self,
        target: &Target,
        operation: &Operation,
        timeout: Duration,
    ) -> Outcome {
        let command = operation.render(target);
        let started = Instant::now();
        let deadline = if target.is_local() {
            timeout
        } else {
            timeout + self.connect_allowance
        };

        let run = self.runner.run(target, &command);
        let outcome = match tokio::time::timeout(deadline, run).await {
            Err(_) => {
                let message = format!("TIMEOUT after {}ms", timeout.as_millis());
                Outcome::fail(target.id.clone(), &operation.name, &message)
                    .with_output(Some(TIMEOUT_EXIT_STATUS), "", message)
            }
            Ok(Err(transport)) => {
                let message = transport.to_string();
                let summary = summarize(&message, defaults::SUMMARY_MAX_CHARS);
                Outcome::fail(target.id.clone(), &operation.name, summary)
                    .with_output(None, "", message)
            }
            Ok(Ok(raw)) => Self::classify(target, operation, raw),
        };

        let outcome = outcome.with_command(command).with_elapsed(started.elapsed());
        debug!(
            target_id = %outcome.target,
            operation = %outcome.operation,
            classification = %outcome.classification,
            elapsed_ms = outcome.elapsed.as_millis() as u64,
            "Attempt finished"
        );
        outcome
    }

    /// Run with the operation's own timeout, or the executor default
    pub async fn execute_default(&self, target: &Target, operation: &Operation) -> Outcome {
        self.execute(target, operation, self.timeout_for(operation)).await
    }

    fn classify(target: &Target, operation: &Operation, raw: RawOutput) -> Outcome {
        let RawOutput {
            exit_status,
            stdout,
            stderr,
        } = raw;

        let outcome = if exit_status != Some(0) {
            let reason = match stderr.trim() {
                "" => match exit_status {
                    Some(code) => format!("exit status {code}"),
                    None => "terminated by signal".to_string(),
                },
                text => text.to_string(),
            };
            Outcome::fail(
                target.id.clone(),
                &operation.name,
                summarize(&reason, defaults::SUMMARY_MAX_CHARS),
            )
        } else {
            match &operation.expect {
                Some(expect) if !expect.matches(&stdout) => Outcome::fail(
                    target.id.clone(),
                    &operation.name,
                    summarize(
                        &format!("expected {expect}; got: {}", stdout.trim()),
                        defaults::SUMMARY_MAX_CHARS,
                    ),
                ),
                _ => {
                    let summary = match stdout.trim() {
                        "" => "exit status 0".to_string(),
                        text => summarize(text, defaults::SUMMARY_MAX_CHARS),
                    };
                    Outcome::ok(target.id.clone(), &operation.name, summary)
                }
            }
        };
        outcome.with_output(exit_status, stdout, stderr)
    }
}
