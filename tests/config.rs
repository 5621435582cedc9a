//! Configuration Module Tests
//!
//! Tests for layered loading of FleetConfig from TOML files.

use std::time::Duration;

use fleetcheck_core::config::ConfigurationError;
use fleetcheck_core::FleetConfig;

#[test]
fn defaults_match_documented_values() {
    let config = FleetConfig::default();
    assert_eq!(config.executor.timeout(), Duration::from_secs(60));
    assert_eq!(config.retry.max_attempts, 1);
    assert_eq!(config.fanout.pool_size, 8);
    assert_eq!(config.ssh.user, "root");
    assert_eq!(config.diagnostics.critical_checks, vec!["2.1", "2.2", "2.3"]);
    assert_eq!(config.report.excerpt_max_lines, 14);
    assert_eq!(config.report.excerpt_max_chars, 2200);
}

#[test]
fn toml_file_overrides_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fleetcheck.toml");
    std::fs::write(
        &path,
        r#"
[executor]
timeout_ms = 15000

[retry]
max_attempts = 3
backoff_ms = 500

[fanout]
pool_size = 2

[diagnostics]
critical_checks = ["2.1", "2.3"]
infra_namespaces = ["kube-system", "longhorn-system"]

[diagnostics.check_timeouts_ms]
"4.2" = 120000
"#,
    )
    .unwrap();

    let config = FleetConfig::load(Some(path.as_path())).unwrap();
    assert_eq!(config.executor.timeout_ms, 15_000);
    assert_eq!(config.retry.max_attempts, 3);
    assert_eq!(config.retry.backoff(), Duration::from_millis(500));
    assert_eq!(config.fanout.pool_size, 2);
    assert_eq!(config.diagnostics.critical_checks, vec!["2.1", "2.3"]);
    assert_eq!(config.diagnostics.infra_namespaces.len(), 2);
    assert_eq!(
        config.diagnostics.check_timeout("4.2"),
        Some(Duration::from_secs(120))
    );
    // Untouched sections keep their defaults
    assert_eq!(config.ssh.port, 22);
}

#[test]
fn explicit_missing_file_is_an_error() {
    let err = FleetConfig::load(Some(std::path::Path::new("/nonexistent/fleetcheck.toml")))
        .unwrap_err();
    assert!(matches!(err, ConfigurationError::FileNotFound { .. }));
}

#[test]
fn invalid_values_are_rejected_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "[fanout]\npool_size = 0\n").unwrap();
    let err = FleetConfig::load(Some(path.as_path())).unwrap_err();
    assert!(err.to_string().contains("fanout.pool_size"));
}
