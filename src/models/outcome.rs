use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use super::evidence::EvidenceRef;
use super::target::TargetId;

/// Per-item classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    Ok,
    Fail,
    /// Recorded and shown but never counted against the verdict
    NotApplicable,
}

impl Classification {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Fail => "FAIL",
            Self::NotApplicable => "N/A",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of executing one operation against one target.
///
/// Created once per attempt and never mutated afterwards; the retry policy
/// surfaces only the last attempt, stamped with the attempt count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub target: TargetId,
    pub operation: String,
    pub success: bool,
    pub classification: Classification,
    /// One-line human summary
    pub summary: String,
    /// Rendered command that produced this outcome
    pub command: String,
    /// `None` when the process never produced an exit status (spawn failure)
    pub exit_status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    #[serde(rename = "elapsed_ms", with = "crate::utils::serde::duration_millis")]
    pub elapsed: Duration,
    pub attempts: u32,
    /// Step of an operation sequence that failed, if any
    pub failed_step: Option<String>,
    pub evidence: Option<EvidenceRef>,
}

impl Outcome {
    pub fn ok(
        target: TargetId,
        operation: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self::classified(target, operation, Classification::Ok, summary)
    }

    pub fn fail(
        target: TargetId,
        operation: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self::classified(target, operation, Classification::Fail, summary)
    }

    pub fn not_applicable(
        target: TargetId,
        operation: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self::classified(target, operation, Classification::NotApplicable, summary)
    }

    pub fn classified(
        target: TargetId,
        operation: impl Into<String>,
        classification: Classification,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            target,
            operation: operation.into(),
            success: classification.is_ok(),
            classification,
            summary: summary.into(),
            command: String::new(),
            exit_status: None,
            stdout: String::new(),
            stderr: String::new(),
            elapsed: Duration::ZERO,
            attempts: 1,
            failed_step: None,
            evidence: None,
        }
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    pub fn with_output(
        mut self,
        exit_status: Option<i32>,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        self.exit_status = exit_status;
        self.stdout = stdout.into();
        self.stderr = stderr.into();
        self
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn with_failed_step(mut self, step: impl Into<String>) -> Self {
        self.failed_step = Some(step.into());
        self
    }

    pub fn with_evidence(mut self, evidence: EvidenceRef) -> Self {
        self.evidence = Some(evidence);
        self
    }

    pub fn is_ok(&self) -> bool {
        self.classification.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_set_success_from_classification() {
        let target = TargetId::new("a");
        assert!(Outcome::ok(target.clone(), "op", "fine").success);
        assert!(!Outcome::fail(target.clone(), "op", "boom").success);
        let na = Outcome::not_applicable(target, "op", "rbac");
        assert!(!na.success);
        assert_eq!(na.classification, Classification::NotApplicable);
    }

    #[test]
    fn test_outcome_serializes_elapsed_as_millis() {
        let outcome = Outcome::fail(TargetId::new("b"), "echo", "TIMEOUT after 100ms")
            .with_elapsed(Duration::from_millis(1250))
            .with_attempts(3);
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["elapsed_ms"], 1250);
        assert_eq!(json["classification"], "FAIL");
        assert_eq!(json["attempts"], 3);
    }
}
