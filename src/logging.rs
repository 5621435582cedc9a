//! # Structured Logging Module
//!
//! Environment-aware structured logging for fan-out jobs and diagnostic runs.
//! Logs go to stderr so that reports printed on stdout stay clean.

use std::sync::OnceLock;
use std::time::Duration;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::models::{Classification, Outcome};
use crate::state_machine::CheckState;

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Output format for the console subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Human,
    Json,
}

/// Initialize structured logging with environment-specific configuration.
///
/// `verbosity` raises the default level (0 = environment default, 1 = debug,
/// 2+ = trace). `RUST_LOG` always wins when set. Safe to call more than once.
pub fn init_structured_logging(format: LogFormat, verbosity: u8) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let log_level = match verbosity {
            0 => get_log_level(&environment),
            1 => "debug".to_string(),
            _ => "trace".to_string(),
        };
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level.clone()));

        let layer = match format {
            LogFormat::Human => fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true)
                .with_ansi(true)
                .with_filter(filter)
                .boxed(),
            LogFormat::Json => fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true)
                .with_ansi(false)
                .json()
                .with_filter(filter)
                .boxed(),
        };

        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            tracing::debug!(
                "Global tracing subscriber already initialized - continuing with existing subscriber"
            );
        }

        tracing::debug!(
            environment = %environment,
            log_level = %log_level,
            "Structured logging initialized"
        );
    });
}

/// Get current environment from environment variables
fn get_environment() -> String {
    std::env::var("FLEETCHECK_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "production".to_string())
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> String {
    match environment {
        "test" | "development" => "debug".to_string(),
        _ => "info".to_string(),
    }
}

/// Log the final outcome of one operation against one target
pub fn log_outcome(outcome: &Outcome) {
    let elapsed_ms = duration_ms(outcome.elapsed);
    match outcome.classification {
        Classification::Ok => tracing::info!(
            target_id = %outcome.target,
            operation = %outcome.operation,
            attempts = outcome.attempts,
            elapsed_ms = elapsed_ms,
            "OUTCOME ok"
        ),
        Classification::NotApplicable => tracing::info!(
            target_id = %outcome.target,
            operation = %outcome.operation,
            summary = %outcome.summary,
            "OUTCOME not applicable"
        ),
        Classification::Fail => tracing::warn!(
            target_id = %outcome.target,
            operation = %outcome.operation,
            attempts = outcome.attempts,
            elapsed_ms = elapsed_ms,
            exit_status = outcome.exit_status,
            summary = %outcome.summary,
            "OUTCOME fail"
        ),
    }
}

/// Log a check state transition
pub fn log_check_transition(check_id: &str, target: &str, from: CheckState, to: CheckState) {
    tracing::debug!(
        check_id = %check_id,
        target_id = %target,
        from = %from,
        to = %to,
        "CHECK_TRANSITION"
    );
}

/// Log error with full context
pub fn log_error(component: &str, operation: &str, error: &str, context: Option<&str>) {
    tracing::error!(
        component = %component,
        operation = %operation,
        error = %error,
        context = context,
        "ERROR"
    );
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
