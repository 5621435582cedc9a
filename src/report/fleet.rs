//! Fan-out job summary: counts, fleet verdict and per-target outcomes.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs;
use std::path::Path;
use uuid::Uuid;

use super::style::Style;
use crate::error::{FleetError, Result};
use crate::execution::{slowest, sort_for_report};
use crate::models::{FleetVerdict, Outcome, TargetId};
use crate::utils::text::summarize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlowestTarget {
    pub target: TargetId,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FleetSummary {
    pub job_id: Uuid,
    pub generated_at: DateTime<Local>,
    pub operation: String,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub verdict: FleetVerdict,
    pub slowest: Option<SlowestTarget>,
    /// Failed targets first, then by target id
    pub outcomes: Vec<Outcome>,
}

impl FleetSummary {
    pub fn new(operation: impl Into<String>, mut outcomes: Vec<Outcome>) -> Self {
        sort_for_report(&mut outcomes);
        let total = outcomes.len();
        let succeeded = outcomes.iter().filter(|o| o.is_ok()).count();
        let slowest_target = slowest(&outcomes).map(|(target, elapsed)| SlowestTarget {
            target: target.clone(),
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        });
        Self {
            job_id: Uuid::new_v4(),
            generated_at: Local::now(),
            operation: operation.into(),
            total,
            succeeded,
            failed: total - succeeded,
            verdict: FleetVerdict::from_counts(succeeded, total),
            slowest: slowest_target,
            outcomes,
        }
    }

    pub fn failed_targets(&self) -> impl Iterator<Item = &TargetId> {
        self.outcomes
            .iter()
            .filter(|o| !o.is_ok())
            .map(|o| &o.target)
    }

    /// `2/3 succeeded; failed: B`
    pub fn summary_line(&self) -> String {
        let line = format!("{}/{} succeeded", self.succeeded, self.total);
        if self.failed == 0 {
            return line;
        }
        let failed: Vec<&str> = self.failed_targets().map(TargetId::as_str).collect();
        format!("{line}; failed: {}", failed.join(", "))
    }

    pub fn exit_code(&self) -> i32 {
        self.verdict.exit_code()
    }

    pub fn render(&self, style: Style) -> String {
        let mut lines = vec![format!(
            "{} [{}] {}",
            style.bold(&self.operation),
            style.fleet_verdict(self.verdict),
            self.summary_line()
        )];
        for outcome in &self.outcomes {
            let mut line = format!(
                "  {} {:<20} {:>6}ms  {}",
                style.mark(outcome.is_ok()),
                outcome.target.as_str(),
                outcome.elapsed.as_millis(),
                summarize(&outcome.summary, 120),
            );
            if outcome.attempts > 1 {
                line.push_str(&format!(" (attempts: {})", outcome.attempts));
            }
            lines.push(line);
        }
        lines.join("\n")
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
            .map_err(|e| FleetError::Report(format!("cannot write {}: {e}", path.display())))
    }
}
