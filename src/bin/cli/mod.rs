//! CLI module for the fleetcheck tool
//!
//! Command handlers plus the wiring shared by them: runners, executor,
//! evidence store and target selection.

pub mod commands;

use std::path::Path;
use std::sync::Arc;

use fleetcheck_core::config::FleetConfig;
use fleetcheck_core::constants::exit_codes;
use fleetcheck_core::diagnostics::preflight::{KUBECTL, SSH};
use fleetcheck_core::diagnostics::{discover_targets, locate_tool};
use fleetcheck_core::evidence::EvidenceStore;
use fleetcheck_core::execution::{
    LocalCommandRunner, RemoteExecutor, RetryPolicy, RoutingRunner, SshCommandRunner,
};
use fleetcheck_core::models::{Operation, Target};
use fleetcheck_core::report::Style;
use fleetcheck_core::utils::text::shell_quote;
use fleetcheck_core::FleetError;

pub use commands::{handle_exec_command, handle_health_command, handle_preflight_command};

/// Hosts named on the command line and/or discovered from the cluster
#[derive(Debug, Clone, Default)]
pub struct TargetSelection {
    pub hosts: Vec<String>,
    pub discover: Option<String>,
}

/// Per-invocation overrides of the loaded configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides {
    pub pool_size: Option<usize>,
    pub attempts: Option<u32>,
    pub backoff_ms: Option<u64>,
    pub timeout_ms: Option<u64>,
}

impl Overrides {
    pub fn apply(&self, config: &mut FleetConfig) -> Result<(), FleetError> {
        if let Some(pool_size) = self.pool_size {
            config.fanout.pool_size = pool_size;
        }
        if let Some(attempts) = self.attempts {
            config.retry.max_attempts = attempts;
        }
        if let Some(backoff_ms) = self.backoff_ms {
            config.retry.backoff_ms = backoff_ms;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.executor.timeout_ms = timeout_ms;
        }
        config.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ExecOptions {
    pub command: String,
    pub name: String,
    pub expect_contains: Option<String>,
    pub json_report: Option<std::path::PathBuf>,
    pub selection: TargetSelection,
    pub overrides: Overrides,
}

/// Components built once per invocation from the configuration
pub struct Services {
    pub executor: RemoteExecutor,
    pub retry: RetryPolicy,
    pub store: Arc<EvidenceStore>,
    pub style: Style,
}

impl Services {
    /// `ssh_program` replaces the `ssh` looked up on PATH at execution time
    pub fn new(config: &FleetConfig, ssh_program: Option<&Path>) -> Self {
        let mut ssh = SshCommandRunner::new(config.ssh.clone());
        if let Some(program) = ssh_program {
            ssh = ssh.with_program(program.display().to_string());
        }
        let runner = RoutingRunner::new(Arc::new(LocalCommandRunner::new()), Arc::new(ssh));
        Self {
            executor: RemoteExecutor::new(Arc::new(runner), &config.executor),
            retry: RetryPolicy::from_config(&config.retry),
            store: Arc::new(EvidenceStore::from_config(&config.evidence)),
            style: Style::new(config.report.colored_output),
        }
    }

    /// Locate `ssh` before building services for remote work
    pub fn remote(config: &FleetConfig) -> Result<Self, FleetError> {
        let ssh = locate_tool(&SSH, None)?;
        Ok(Self::new(config, Some(&ssh)))
    }
}

/// Resolve the selection into targets, querying the cluster for `--discover`
pub async fn resolve_targets(
    selection: &TargetSelection,
    config: &FleetConfig,
    executor: &RemoteExecutor,
) -> Result<Vec<Target>, FleetError> {
    let mut targets = Vec::with_capacity(selection.hosts.len());
    for spec in &selection.hosts {
        let target = Target::parse_host_spec(spec)
            .ok_or_else(|| FleetError::Validation(format!("invalid host spec '{spec}'")))?;
        targets.push(target);
    }

    if let Some(role) = &selection.discover {
        let kubectl = locate_tool(&KUBECTL, config.diagnostics.kubectl.as_deref())?;
        let nodes = Operation::new(
            "get_nodes_wide",
            format!("{} get nodes -o wide", shell_quote(&kubectl.display().to_string())),
        );
        let outcome = executor.execute_default(&Target::local("local"), &nodes).await;
        if !outcome.is_ok() {
            return Err(FleetError::Validation(format!(
                "cannot discover '{role}' nodes: {}",
                outcome.summary
            )));
        }
        for target in discover_targets(&outcome.stdout, role) {
            if !targets.iter().any(|t| t.address == target.address) {
                targets.push(target);
            }
        }
    }

    if targets.is_empty() {
        return Err(FleetError::Validation(
            "no targets: pass --host or --discover".to_string(),
        ));
    }
    Ok(targets)
}

/// Print a run-level failure and return the exit code for it
pub fn report_failure(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<FleetError>() {
        Some(fleet_error) => {
            eprintln!("fleetcheck: {fleet_error}");
            if let Some(remediation) = fleet_error.remediation() {
                eprintln!("  fix: {remediation}");
            }
            fleet_error.exit_code()
        }
        None => {
            eprintln!("fleetcheck: {error:#}");
            exit_codes::UNAVAILABLE
        }
    }
}
