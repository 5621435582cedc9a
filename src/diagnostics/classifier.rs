use std::collections::BTreeSet;

use super::registry::{CheckOutcome, CheckScope};
use crate::config::DiagnosticsConfig;
use crate::constants::cluster_checks;
use crate::models::{Classification, Verdict};

/// Reduces check outcomes to one [`Verdict`].
///
/// Any in-scope non-OK critical check ⇒ `Unavailable`; else any in-scope
/// non-OK check ⇒ `Degraded`; else `Operational`. Out-of-scope and
/// not-applicable outcomes never change the verdict. The reduction is
/// order-independent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeverityClassifier {
    critical: BTreeSet<String>,
}

impl Default for SeverityClassifier {
    fn default() -> Self {
        Self::new(cluster_checks::CRITICAL)
    }
}

impl SeverityClassifier {
    pub fn new<I, S>(critical: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            critical: critical.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_config(config: &DiagnosticsConfig) -> Self {
        Self::new(config.critical_checks.iter().cloned())
    }

    pub fn is_critical(&self, check_id: &str) -> bool {
        self.critical.contains(check_id)
    }

    pub fn critical_checks(&self) -> impl Iterator<Item = &str> {
        self.critical.iter().map(String::as_str)
    }

    pub fn classify(&self, outcomes: &[CheckOutcome]) -> Verdict {
        outcomes
            .iter()
            .filter(|item| item.is_in_scope_failure())
            .map(|item| {
                if self.is_critical(&item.check_id) {
                    Verdict::Unavailable
                } else {
                    Verdict::Degraded
                }
            })
            .max()
            .unwrap_or(Verdict::Operational)
    }

    pub fn tally(&self, outcomes: &[CheckOutcome]) -> Tally {
        let mut tally = Tally::default();
        for item in outcomes {
            match (item.effective_scope(), item.classification()) {
                (CheckScope::OutOfScope, _) => tally.not_applicable += 1,
                (CheckScope::InScope, Classification::Ok) => tally.ok += 1,
                (CheckScope::InScope, _) => {
                    tally.failed += 1;
                    if self.is_critical(&item.check_id) {
                        tally.critical_failed += 1;
                    }
                }
            }
        }
        tally
    }
}

/// Counts shown in the report summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub ok: usize,
    pub failed: usize,
    pub critical_failed: usize,
    pub not_applicable: usize,
}

impl Tally {
    pub fn total(&self) -> usize {
        self.ok + self.failed + self.not_applicable
    }
}
