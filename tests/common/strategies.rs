//! Proptest strategies for outcome sets.

use proptest::prelude::*;

use fleetcheck_core::diagnostics::{CheckOutcome, CheckScope};
use fleetcheck_core::models::{Classification, Outcome, TargetId};

pub fn classification_strategy() -> impl Strategy<Value = Classification> {
    prop_oneof![
        Just(Classification::Ok),
        Just(Classification::Fail),
        Just(Classification::NotApplicable),
    ]
}

pub fn scope_strategy() -> impl Strategy<Value = CheckScope> {
    prop_oneof![4 => Just(CheckScope::InScope), 1 => Just(CheckScope::OutOfScope)]
}

/// Check ids drawn from a small pool so critical ids show up often
pub fn check_id_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("2.1".to_string()),
        Just("2.2".to_string()),
        Just("2.3".to_string()),
        Just("3.2".to_string()),
        Just("4.2".to_string()),
        Just("4.3".to_string()),
        Just("5.1".to_string()),
        Just("6.1".to_string()),
    ]
}

pub fn check_outcome_strategy() -> impl Strategy<Value = CheckOutcome> {
    (check_id_strategy(), classification_strategy(), scope_strategy()).prop_map(
        |(id, classification, scope)| CheckOutcome {
            name: format!("check {id}"),
            category: "generated".to_string(),
            scope,
            remediation: String::new(),
            outcome: Outcome::classified(TargetId::new("ctx"), &id, classification, "generated"),
            check_id: id,
        },
    )
}

pub fn check_outcomes_strategy() -> impl Strategy<Value = Vec<CheckOutcome>> {
    prop::collection::vec(check_outcome_strategy(), 0..16)
}
