use serde::{Deserialize, Serialize};
use std::fmt;

/// Aggregate cluster severity, totally ordered by severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Operational,
    Degraded,
    Unavailable,
}

impl Verdict {
    pub fn exit_code(&self) -> i32 {
        use crate::constants::exit_codes;
        match self {
            Self::Operational => exit_codes::OPERATIONAL,
            Self::Degraded => exit_codes::DEGRADED,
            Self::Unavailable => exit_codes::UNAVAILABLE,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Operational => "PLATFORM OPERATIONAL",
            Self::Degraded => "PLATFORM DEGRADED",
            Self::Unavailable => "PLATFORM UNAVAILABLE",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Operational => write!(f, "OPERATIONAL"),
            Self::Degraded => write!(f, "DEGRADED"),
            Self::Unavailable => write!(f, "UNAVAILABLE"),
        }
    }
}

/// Aggregate result of a fan-out job
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FleetVerdict {
    Ok,
    PartialFailure,
    TotalFailure,
}

impl FleetVerdict {
    /// Reduce success counts; an empty job is vacuously `Ok`.
    pub fn from_counts(succeeded: usize, total: usize) -> Self {
        if succeeded == total {
            Self::Ok
        } else if succeeded == 0 {
            Self::TotalFailure
        } else {
            Self::PartialFailure
        }
    }

    pub fn exit_code(&self) -> i32 {
        use crate::constants::exit_codes;
        match self {
            Self::Ok => exit_codes::OPERATIONAL,
            Self::PartialFailure => exit_codes::DEGRADED,
            Self::TotalFailure => exit_codes::UNAVAILABLE,
        }
    }
}

impl fmt::Display for FleetVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::PartialFailure => write!(f, "PARTIAL_FAILURE"),
            Self::TotalFailure => write!(f, "TOTAL_FAILURE"),
        }
    }
}
