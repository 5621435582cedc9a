use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use super::executor::RemoteExecutor;
use crate::config::RetryConfig;
use crate::models::{Operation, Outcome, Target};

/// Bounded retry with constant backoff.
///
/// The final outcome is the last attempt's outcome verbatim, stamped with the
/// number of attempts made. `max_attempts == 1` disables retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    /// `max_attempts` below 1 is treated as 1
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, config.backoff())
    }

    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    /// Drive `attempt` until it succeeds or attempts run out.
    /// The closure receives the 1-based attempt number.
    ///
    /// ```rust
    /// use std::time::Duration;
    /// use fleetcheck_core::execution::RetryPolicy;
    /// use fleetcheck_core::models::{Outcome, TargetId};
    ///
    /// # tokio_test::block_on(async {
    /// let policy = RetryPolicy::new(3, Duration::from_millis(1));
    /// let outcome = policy
    ///     .run(|n| async move {
    ///         if n < 2 {
    ///             Outcome::fail(TargetId::new("cp-1"), "probe", "refused")
    ///         } else {
    ///             Outcome::ok(TargetId::new("cp-1"), "probe", "up")
    ///         }
    ///     })
    ///     .await;
    /// assert!(outcome.is_ok());
    /// assert_eq!(outcome.attempts, 2);
    /// # });
    /// ```
    pub async fn run<F, Fut>(&self, mut attempt: F) -> Outcome
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Outcome>,
    {
        let mut number = 1;
        loop {
            let outcome = attempt(number).await;
            if outcome.is_ok() || number >= self.max_attempts {
                return outcome.with_attempts(number);
            }
            warn!(
                target_id = %outcome.target,
                operation = %outcome.operation,
                attempt = number,
                max_attempts = self.max_attempts,
                backoff_ms = self.backoff.as_millis() as u64,
                summary = %outcome.summary,
                "Attempt failed, retrying"
            );
            tokio::time::sleep(self.backoff).await;
            number += 1;
            debug!(attempt = number, "Starting retry attempt");
        }
    }

    /// Retry-wrapped [`RemoteExecutor::execute`]
    pub async fn execute(
        &self,
        executor: &RemoteExecutor,
        target: &Target,
        operation: &Operation,
        timeout: Duration,
    ) -> Outcome {
        self.run(|_| executor.execute(target, operation, timeout)).await
    }
}
