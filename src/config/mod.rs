//! # Fleetcheck Configuration System
//!
//! One explicit configuration structure is built at startup and handed to the
//! executor, retry policy, coordinator, diagnostic engine, evidence store and
//! report builder. Nothing reads ambient globals after that point, so tests
//! substitute values freely.
//!
//! ## Sources
//!
//! Layered by [`loader::load`], lowest to highest precedence:
//!
//! 1. Built-in defaults ([`FleetConfig::default`])
//! 2. TOML file (`--config PATH`, else `./fleetcheck.toml` when present)
//! 3. Environment variables, `FLEETCHECK__<SECTION>__<KEY>`
//!
//! ## Usage
//!
//! ```rust,no_run
//! use fleetcheck_core::config::FleetConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = FleetConfig::load(None)?;
//! let timeout = config.executor.timeout();
//! let attempts = config.retry.max_attempts;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{cluster_checks, defaults};

pub use error::{ConfigResult, ConfigurationError};

/// Root configuration structure mirroring `fleetcheck.toml`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct FleetConfig {
    /// Per-call execution limits
    pub executor: ExecutorConfig,
    /// Retry policy applied around every executor call
    pub retry: RetryConfig,
    /// Fan-out worker pool
    pub fanout: FanoutConfig,
    /// SSH transport parameters for remote targets
    pub ssh: SshConfig,
    /// Cluster and node diagnostics
    pub diagnostics: DiagnosticsConfig,
    /// Evidence persistence
    pub evidence: EvidenceConfig,
    /// Report rendering
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Deadline for one remote or local command, in milliseconds
    pub timeout_ms: u64,
    /// Extra time granted for connection setup on top of `timeout_ms`
    pub connect_allowance_ms: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            timeout_ms: defaults::EXECUTOR_TIMEOUT_MS,
            connect_allowance_ms: defaults::CONNECT_ALLOWANCE_MS,
        }
    }
}

impl ExecutorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn connect_allowance(&self) -> Duration {
        Duration::from_millis(self.connect_allowance_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts including the first one; 1 disables retrying
    pub max_attempts: u32,
    /// Constant sleep between attempts
    pub backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: defaults::RETRY_MAX_ATTEMPTS,
            backoff_ms: defaults::RETRY_BACKOFF_MS,
        }
    }
}

impl RetryConfig {
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FanoutConfig {
    /// Upper bound on concurrent workers; the effective size is
    /// `min(pool_size, target_count)`
    pub pool_size: usize,
}

impl Default for FanoutConfig {
    fn default() -> Self {
        Self {
            pool_size: defaults::FANOUT_POOL_SIZE,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SshConfig {
    pub user: String,
    pub port: u16,
    /// Private key passed with `-i`; agent/default keys are used when unset
    pub identity_file: Option<PathBuf>,
    pub connect_timeout_secs: u64,
    /// Value for `-o StrictHostKeyChecking=`
    pub strict_host_key_checking: String,
    /// Additional `-o` options, verbatim
    pub extra_options: Vec<String>,
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            user: defaults::SSH_USER.to_string(),
            port: defaults::SSH_PORT,
            identity_file: None,
            connect_timeout_secs: defaults::SSH_CONNECT_TIMEOUT_SECS,
            strict_host_key_checking: "accept-new".to_string(),
            extra_options: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Explicit cluster CLI path; otherwise `$KUBECTL`, then `PATH`
    pub kubectl: Option<PathBuf>,
    /// Check ids whose failure makes the cluster unavailable
    pub critical_checks: Vec<String>,
    /// Namespaces whose warning events count against the cluster
    pub infra_namespaces: Vec<String>,
    /// Image used by the throwaway DNS probe pod
    pub dns_probe_image: String,
    /// Checks run concurrently against the cluster
    pub check_concurrency: usize,
    /// Per-check timeout overrides in milliseconds, keyed by check id
    pub check_timeouts_ms: HashMap<String, u64>,
    /// Expected timezone for node preflight
    pub timezone: String,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            kubectl: None,
            critical_checks: cluster_checks::CRITICAL.iter().map(|s| s.to_string()).collect(),
            infra_namespaces: vec!["kube-system".to_string()],
            dns_probe_image: defaults::DNS_PROBE_IMAGE.to_string(),
            check_concurrency: defaults::CHECK_CONCURRENCY,
            check_timeouts_ms: HashMap::new(),
            timezone: defaults::TIMEZONE.to_string(),
        }
    }
}

impl DiagnosticsConfig {
    pub fn check_timeout(&self, check_id: &str) -> Option<Duration> {
        self.check_timeouts_ms
            .get(check_id)
            .copied()
            .map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EvidenceConfig {
    /// Directory under which `evidence_<run_id>/` folders are created
    pub root_dir: PathBuf,
}

impl Default for EvidenceConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Directory receiving `report_<run_id>.txt`
    pub output_dir: PathBuf,
    pub colored_output: bool,
    pub excerpt_max_lines: usize,
    pub excerpt_max_chars: usize,
    pub stderr_excerpt_max_lines: usize,
    /// Not-applicable items listed before collapsing into a count
    pub not_applicable_limit: usize,
    pub finding_max_chars: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            colored_output: true,
            excerpt_max_lines: defaults::EXCERPT_MAX_LINES,
            excerpt_max_chars: defaults::EXCERPT_MAX_CHARS,
            stderr_excerpt_max_lines: defaults::STDERR_EXCERPT_MAX_LINES,
            not_applicable_limit: defaults::NOT_APPLICABLE_LIMIT,
            finding_max_chars: defaults::FINDING_MAX_CHARS,
        }
    }
}

impl FleetConfig {
    /// Load layered configuration; see [`loader::load`].
    pub fn load(path: Option<&std::path::Path>) -> ConfigResult<Self> {
        loader::load(path)
    }

    /// Reject values the engine cannot honor.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.executor.timeout_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "executor.timeout_ms",
                self.executor.timeout_ms,
                "timeout must be greater than zero",
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigurationError::invalid_value(
                "retry.max_attempts",
                self.retry.max_attempts,
                "at least one attempt is required",
            ));
        }
        if self.fanout.pool_size == 0 {
            return Err(ConfigurationError::invalid_value(
                "fanout.pool_size",
                self.fanout.pool_size,
                "pool size must be at least 1",
            ));
        }
        if self.diagnostics.check_concurrency == 0 {
            return Err(ConfigurationError::invalid_value(
                "diagnostics.check_concurrency",
                self.diagnostics.check_concurrency,
                "check concurrency must be at least 1",
            ));
        }
        if let Some((id, ms)) = self
            .diagnostics
            .check_timeouts_ms
            .iter()
            .find(|(_, ms)| **ms == 0)
        {
            return Err(ConfigurationError::invalid_value(
                format!("diagnostics.check_timeouts_ms.{id}"),
                ms,
                "timeout must be greater than zero",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = FleetConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.retry.max_attempts, 1);
        assert_eq!(config.fanout.pool_size, 8);
        assert_eq!(config.diagnostics.critical_checks, vec!["2.1", "2.2", "2.3"]);
        assert_eq!(config.executor.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let mut config = FleetConfig::default();
        config.retry.max_attempts = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("retry.max_attempts"));
    }

    #[test]
    fn test_zero_check_timeout_rejected() {
        let mut config = FleetConfig::default();
        config
            .diagnostics
            .check_timeouts_ms
            .insert("2.1".to_string(), 0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_check_timeout_override() {
        let mut config = FleetConfig::default();
        config
            .diagnostics
            .check_timeouts_ms
            .insert("4.2".to_string(), 90_000);
        assert_eq!(
            config.diagnostics.check_timeout("4.2"),
            Some(Duration::from_secs(90))
        );
        assert_eq!(config.diagnostics.check_timeout("2.1"), None);
    }
}
