//! Error types for the fleetcheck engine.
//!
//! Per-target and per-check failures never surface here: the executor turns
//! them into [`Outcome`](crate::models::Outcome) values. These errors cover
//! the run-level failures that abort or degrade a whole invocation.

use thiserror::Error;

use crate::config::ConfigurationError;
use crate::state_machine::CheckStateError;

#[derive(Debug, Error)]
pub enum FleetError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// A required tool is missing or cannot run. Fatal to the whole run.
    #[error("Environment error: {tool} unavailable: {reason}")]
    Environment {
        tool: String,
        reason: String,
        remediation: String,
    },

    #[error("Evidence store error: {0}")]
    Evidence(String),

    #[error("Report error: {0}")]
    Report(String),

    #[error("State transition error: {0}")]
    StateTransition(#[from] CheckStateError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FleetError {
    pub fn environment(
        tool: impl Into<String>,
        reason: impl Into<String>,
        remediation: impl Into<String>,
    ) -> Self {
        Self::Environment {
            tool: tool.into(),
            reason: reason.into(),
            remediation: remediation.into(),
        }
    }

    /// Remediation text for environment errors, if any.
    pub fn remediation(&self) -> Option<&str> {
        match self {
            Self::Environment { remediation, .. } => Some(remediation.as_str()),
            _ => None,
        }
    }

    /// Process exit code the CLI should use for this error.
    pub fn exit_code(&self) -> i32 {
        use crate::constants::exit_codes;
        match self {
            Self::Environment { .. } => exit_codes::ENVIRONMENT_ERROR,
            Self::Configuration(_) | Self::Validation(_) => exit_codes::CONFIGURATION_ERROR,
            _ => exit_codes::UNAVAILABLE,
        }
    }
}

impl From<serde_json::Error> for FleetError {
    fn from(error: serde_json::Error) -> Self {
        FleetError::Report(format!("JSON serialization error: {error}"))
    }
}

pub type Result<T> = std::result::Result<T, FleetError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::exit_codes;

    #[test]
    fn test_environment_error_carries_remediation() {
        let err = FleetError::environment(
            "kubectl",
            "not found in PATH",
            "export KUBECTL=/usr/local/bin/kubectl",
        );
        assert_eq!(err.remediation(), Some("export KUBECTL=/usr/local/bin/kubectl"));
        assert_eq!(err.exit_code(), exit_codes::ENVIRONMENT_ERROR);
        assert!(err.to_string().contains("kubectl unavailable"));
    }

    #[test]
    fn test_validation_error_maps_to_configuration_exit_code() {
        let err = FleetError::Validation("no targets".to_string());
        assert_eq!(err.exit_code(), exit_codes::CONFIGURATION_ERROR);
        assert!(err.remediation().is_none());
    }
}
