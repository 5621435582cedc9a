//! # Fleetcheck CLI
//!
//! Cluster health checks, node preflight and ad-hoc fan-out of commands to
//! cluster hosts. Exit codes follow the verdict: 0 operational, 1 degraded,
//! 2 unavailable, 3 environment error, 4 configuration error.

mod cli;

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use fleetcheck_core::config::FleetConfig;
use fleetcheck_core::constants::exit_codes;
use fleetcheck_core::logging::{init_structured_logging, LogFormat};

use cli::{handle_exec_command, handle_health_command, handle_preflight_command, report_failure};

#[derive(Parser, Debug)]
#[command(name = "fleetcheck")]
#[command(about = "Parallel remote execution and diagnostics for RKE2 clusters")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Configuration file path (default: ./fleetcheck.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output level (use multiple times for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON on stderr
    #[arg(long, global = true)]
    json_logs: bool,

    /// Disable ANSI colors on stdout
    #[arg(long, global = true)]
    no_color: bool,

    /// Subcommands
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the cluster health checks and write report + evidence
    Health {
        /// kubectl binary (default: $KUBECTL, then PATH)
        #[arg(long, env = "FLEETCHECK_KUBECTL")]
        kubectl: Option<PathBuf>,

        /// Report title
        #[arg(long, default_value = "RKE2 cluster health report")]
        title: String,
    },

    /// Run one command on every host concurrently
    Exec {
        /// Command template; `{name}` and `{address}` are substituted per host
        command: String,

        /// Target host: `address`, `name=address` or `name=user@address:port`
        #[arg(long = "host", value_name = "SPEC")]
        hosts: Vec<String>,

        /// Add every node whose ROLES contain this role (from `kubectl get nodes -o wide`)
        #[arg(long, value_name = "ROLE")]
        discover: Option<String>,

        /// Operation name shown in the summary
        #[arg(long, default_value = "exec")]
        name: String,

        /// Succeed only when stdout contains this text
        #[arg(long)]
        expect_contains: Option<String>,

        #[arg(long)]
        pool_size: Option<usize>,

        /// Total attempts per host, including the first
        #[arg(long)]
        attempts: Option<u32>,

        #[arg(long)]
        backoff_ms: Option<u64>,

        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Write the fleet summary as JSON to this path
        #[arg(long, value_name = "PATH")]
        json_report: Option<PathBuf>,
    },

    /// Run the read-only node preflight checks on every host
    Preflight {
        /// Target host: `address`, `name=address` or `name=user@address:port`
        #[arg(long = "host", value_name = "SPEC")]
        hosts: Vec<String>,

        /// Add every node whose ROLES contain this role
        #[arg(long, value_name = "ROLE")]
        discover: Option<String>,

        #[arg(long)]
        pool_size: Option<usize>,
    },
}

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            std::process::exit(usage_exit_code(e.kind()));
        }
    };

    let format = if cli.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Human
    };
    init_structured_logging(format, cli.verbose);

    let mut config = match FleetConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("fleetcheck: {e}");
            std::process::exit(exit_codes::CONFIGURATION_ERROR);
        }
    };
    if cli.no_color {
        config.report.colored_output = false;
    }

    info!(
        timeout_ms = config.executor.timeout_ms,
        max_attempts = config.retry.max_attempts,
        pool_size = config.fanout.pool_size,
        "fleetcheck starting"
    );

    let result = match cli.command {
        Commands::Health { kubectl, title } => {
            handle_health_command(&config, kubectl, title).await
        }
        Commands::Exec {
            command,
            hosts,
            discover,
            name,
            expect_contains,
            pool_size,
            attempts,
            backoff_ms,
            timeout_ms,
            json_report,
        } => {
            let options = cli::ExecOptions {
                command,
                name,
                expect_contains,
                json_report,
                selection: cli::TargetSelection { hosts, discover },
                overrides: cli::Overrides {
                    pool_size,
                    attempts,
                    backoff_ms,
                    timeout_ms,
                },
            };
            handle_exec_command(config, options).await
        }
        Commands::Preflight {
            hosts,
            discover,
            pool_size,
        } => {
            let overrides = cli::Overrides {
                pool_size,
                ..cli::Overrides::default()
            };
            handle_preflight_command(config, cli::TargetSelection { hosts, discover }, overrides)
                .await
        }
    };

    let code = match result {
        Ok(code) => code,
        Err(e) => report_failure(&e),
    };
    std::process::exit(code);
}

/// Help and version requests succeed; every other parse error is a usage
/// error and shares the configuration exit code.
fn usage_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => exit_codes::OPERATIONAL,
        _ => exit_codes::CONFIGURATION_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn exit_code_for(args: &[&str]) -> Option<i32> {
        Cli::try_parse_from(args)
            .err()
            .map(|e| usage_exit_code(e.kind()))
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_usage_errors_exit_with_configuration_code() {
        assert_eq!(exit_code_for(&["fleetcheck", "exec"]), Some(4));
        assert_eq!(
            exit_code_for(&["fleetcheck", "exec", "--pool-size", "abc", "true"]),
            Some(4)
        );
        assert_eq!(exit_code_for(&["fleetcheck", "--no-such-flag", "health"]), Some(4));
        assert_eq!(exit_code_for(&["fleetcheck"]), Some(4));
    }

    #[test]
    fn test_help_and_version_exit_zero() {
        assert_eq!(exit_code_for(&["fleetcheck", "--help"]), Some(0));
        assert_eq!(exit_code_for(&["fleetcheck", "--version"]), Some(0));
        assert_eq!(exit_code_for(&["fleetcheck", "exec", "--help"]), Some(0));
    }

    #[test]
    fn test_valid_invocation_parses() {
        assert_eq!(
            exit_code_for(&["fleetcheck", "exec", "uptime", "--host", "cp-1=10.0.0.11"]),
            None
        );
    }
}
