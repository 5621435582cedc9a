//! Check definitions and the registry that holds them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::error::{FleetError, Result};
use crate::models::{Classification, EvidenceRef, EvidenceSection, Operation, Outcome};

/// Whether a check's result counts toward the aggregate verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckScope {
    InScope,
    OutOfScope,
}

impl fmt::Display for CheckScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InScope => write!(f, "IN_SCOPE"),
            Self::OutOfScope => write!(f, "OUT_OF_SCOPE"),
        }
    }
}

/// Result of a verifier: exactly one classification plus a one-line summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub classification: Classification,
    pub summary: String,
}

impl Verification {
    pub fn ok(summary: impl Into<String>) -> Self {
        Self {
            classification: Classification::Ok,
            summary: summary.into(),
        }
    }

    pub fn fail(summary: impl Into<String>) -> Self {
        Self {
            classification: Classification::Fail,
            summary: summary.into(),
        }
    }

    pub fn not_applicable(summary: impl Into<String>) -> Self {
        Self {
            classification: Classification::NotApplicable,
            summary: summary.into(),
        }
    }
}

/// Maps the raw output of every probe, in probe order, to a verification.
/// Must be total: empty or malformed output is a `FAIL`, never a panic.
pub type Verifier = Arc<dyn Fn(&[EvidenceSection]) -> Verification + Send + Sync>;

/// One registered diagnostic
#[derive(Clone)]
pub struct Check {
    pub id: String,
    pub name: String,
    pub category: String,
    pub scope: CheckScope,
    /// Commands run in order against the shared target
    pub probes: Vec<Operation>,
    /// Displayed next to a failure; falls back to the static hint table
    pub remediation: Option<String>,
    verify: Verifier,
}

impl Check {
    pub fn new<V>(
        id: impl Into<String>,
        name: impl Into<String>,
        category: impl Into<String>,
        probes: Vec<Operation>,
        verify: V,
    ) -> Self
    where
        V: Fn(&[EvidenceSection]) -> Verification + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            name: name.into(),
            category: category.into(),
            scope: CheckScope::InScope,
            probes,
            remediation: None,
            verify: Arc::new(verify),
        }
    }

    pub fn out_of_scope(mut self) -> Self {
        self.scope = CheckScope::OutOfScope;
        self
    }

    pub fn with_remediation(mut self, remediation: impl Into<String>) -> Self {
        self.remediation = Some(remediation.into());
        self
    }

    pub fn verify(&self, sections: &[EvidenceSection]) -> Verification {
        (self.verify)(sections)
    }
}

impl fmt::Debug for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Check")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("category", &self.category)
            .field("scope", &self.scope)
            .field("probes", &self.probes.len())
            .finish_non_exhaustive()
    }
}

/// Ordered set of checks with unique ids
#[derive(Debug, Clone, Default)]
pub struct CheckRegistry {
    checks: Vec<Check>,
}

impl CheckRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, check: Check) -> Result<()> {
        if self.get(&check.id).is_some() {
            return Err(FleetError::Validation(format!(
                "check id '{}' is already registered",
                check.id
            )));
        }
        self.checks.push(check);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Check> {
        self.checks.iter().find(|check| check.id == id)
    }

    pub fn checks(&self) -> &[Check] {
        &self.checks
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.checks.iter().map(|check| check.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}

/// A check's final outcome together with its registry metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub check_id: String,
    pub name: String,
    pub category: String,
    pub scope: CheckScope,
    pub remediation: String,
    pub outcome: Outcome,
}

impl CheckOutcome {
    pub fn classification(&self) -> Classification {
        self.outcome.classification
    }

    /// Out of scope when the check is tagged so or could not be evaluated
    pub fn effective_scope(&self) -> CheckScope {
        match (self.scope, self.outcome.classification) {
            (CheckScope::OutOfScope, _) | (_, Classification::NotApplicable) => {
                CheckScope::OutOfScope
            }
            _ => CheckScope::InScope,
        }
    }

    pub fn is_in_scope_failure(&self) -> bool {
        self.effective_scope() == CheckScope::InScope && !self.outcome.is_ok()
    }

    pub fn evidence(&self) -> Option<&EvidenceRef> {
        self.outcome.evidence.as_ref()
    }
}
