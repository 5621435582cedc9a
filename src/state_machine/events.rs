use serde::{Deserialize, Serialize};

use crate::models::Classification;

/// Events that drive a check through its lifecycle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum CheckEvent {
    /// Probes dispatched
    Start,
    /// Verifier produced a classification
    Complete(Classification),
}

impl CheckEvent {
    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Complete(_) => "complete",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete(_))
    }
}
