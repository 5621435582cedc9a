use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::Classification;

/// Lifecycle of one check (or one preflight probe) on one target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckState {
    /// Registered, not yet started
    Pending,
    /// Probes are executing
    Running,
    /// Verified healthy
    Ok,
    /// Verified unhealthy
    Fail,
    /// Could not be evaluated in this environment
    NotApplicable,
}

impl CheckState {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ok | Self::Fail | Self::NotApplicable)
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Terminal state for a verification result
    pub fn from_classification(classification: Classification) -> Self {
        match classification {
            Classification::Ok => Self::Ok,
            Classification::Fail => Self::Fail,
            Classification::NotApplicable => Self::NotApplicable,
        }
    }
}

impl fmt::Display for CheckState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Ok => write!(f, "ok"),
            Self::Fail => write!(f, "fail"),
            Self::NotApplicable => write!(f, "not_applicable"),
        }
    }
}

impl std::str::FromStr for CheckState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "ok" => Ok(Self::Ok),
            "fail" => Ok(Self::Fail),
            "not_applicable" => Ok(Self::NotApplicable),
            _ => Err(format!("Invalid check state: {s}")),
        }
    }
}
