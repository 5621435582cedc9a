//! # System Constants
//!
//! Exit codes, default limits and fixed identifiers shared by the engine,
//! the check registries and the CLI.

/// Process exit codes. Any in-scope failure yields a non-zero code.
pub mod exit_codes {
    /// Cluster operational / every fan-out target succeeded
    pub const OPERATIONAL: i32 = 0;
    /// Cluster degraded / some fan-out targets failed
    pub const DEGRADED: i32 = 1;
    /// Cluster unavailable / every fan-out target failed
    pub const UNAVAILABLE: i32 = 2;
    /// Required tool missing or not executable
    pub const ENVIRONMENT_ERROR: i32 = 3;
    /// Invalid configuration or CLI usage
    pub const CONFIGURATION_ERROR: i32 = 4;
}

/// Default values used by [`FleetConfig`](crate::config::FleetConfig).
pub mod defaults {
    pub const EXECUTOR_TIMEOUT_MS: u64 = 60_000;
    pub const CONNECT_ALLOWANCE_MS: u64 = 12_000;
    pub const RETRY_MAX_ATTEMPTS: u32 = 1;
    pub const RETRY_BACKOFF_MS: u64 = 2_000;
    pub const FANOUT_POOL_SIZE: usize = 8;
    pub const SSH_USER: &str = "root";
    pub const SSH_PORT: u16 = 22;
    pub const SSH_CONNECT_TIMEOUT_SECS: u64 = 12;
    pub const CHECK_CONCURRENCY: usize = 4;
    pub const DNS_PROBE_IMAGE: &str = "busybox:1.36";
    pub const EXCERPT_MAX_LINES: usize = 14;
    pub const EXCERPT_MAX_CHARS: usize = 2_200;
    pub const STDERR_EXCERPT_MAX_LINES: usize = 6;
    pub const NOT_APPLICABLE_LIMIT: usize = 3;
    pub const FINDING_MAX_CHARS: usize = 240;
    pub const SUMMARY_MAX_CHARS: usize = 180;
    pub const TIMEZONE: &str = "America/Santiago";
}

/// Exit status reported for a call that hit its deadline.
pub const TIMEOUT_EXIT_STATUS: i32 = 124;

/// Exit status the `ssh` client uses for its own (connection) failures.
pub const SSH_TRANSPORT_EXIT_STATUS: i32 = 255;

/// Check ids of the cluster health registry.
pub mod cluster_checks {
    pub const NODES_READY: &str = "2.1";
    pub const CONTROL_PLANE: &str = "2.2";
    pub const ETCD: &str = "2.3";
    pub const NODE_PRESSURE: &str = "3.2";
    pub const DNS_RESOLUTION: &str = "4.2";
    pub const DNS_ENDPOINTS: &str = "4.3";
    pub const INFRA_EVENTS: &str = "5.1";
    pub const VERSION_CONSISTENCY: &str = "6.1";

    /// Foundational checks whose failure makes the platform unavailable.
    pub const CRITICAL: [&str; 3] = [NODES_READY, CONTROL_PLANE, ETCD];
}

/// Check ids of the node preflight registry.
pub mod preflight_checks {
    pub const SWAP_DISABLED: &str = "node.swap";
    pub const KERNEL_MODULES: &str = "node.kernel_modules";
    pub const NETWORK_SYSCTL: &str = "node.network_sysctl";
    pub const RKE2_SYSCTL: &str = "node.rke2_sysctl";
    pub const JOURNAL_DIR: &str = "node.journal";
    pub const HOSTNAME: &str = "node.hostname";
    pub const TIMEZONE: &str = "node.timezone";
    pub const SERVICES: &str = "node.services";
    pub const LONGHORN_MOUNT: &str = "node.longhorn_mount";
    pub const CONNECTIVITY: &str = "node.connectivity";
    pub const KUBECTL: &str = "node.kubectl";
    pub const HELM: &str = "node.helm";

    pub const CRITICAL: [&str; 3] = [SWAP_DISABLED, KERNEL_MODULES, NETWORK_SYSCTL];
}

/// Evidence ids written outside of the check registries.
pub mod evidence_ids {
    pub const ENV_DEBUG: &str = "00_env_debug";
    pub const KUBECTL_CHECK: &str = "00_kubectl_check";
    pub const REPORT_COPY: &str = "report";
}

/// Environment variable naming an explicit kubectl binary.
pub const KUBECTL_ENV_VAR: &str = "KUBECTL";

/// Prefix for configuration overrides (`FLEETCHECK__RETRY__MAX_ATTEMPTS=3`).
pub const CONFIG_ENV_PREFIX: &str = "FLEETCHECK";

/// Default configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "fleetcheck.toml";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct() {
        let codes = [
            exit_codes::OPERATIONAL,
            exit_codes::DEGRADED,
            exit_codes::UNAVAILABLE,
            exit_codes::ENVIRONMENT_ERROR,
            exit_codes::CONFIGURATION_ERROR,
        ];
        let unique: std::collections::HashSet<_> = codes.iter().collect();
        assert_eq!(unique.len(), codes.len());
        assert_eq!(exit_codes::OPERATIONAL, 0);
    }

    #[test]
    fn test_critical_checks_are_foundational() {
        assert!(cluster_checks::CRITICAL.contains(&cluster_checks::NODES_READY));
        assert!(!cluster_checks::CRITICAL.contains(&cluster_checks::DNS_RESOLUTION));
    }
}
