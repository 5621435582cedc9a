use dashmap::DashMap;
use thiserror::Error;

use super::events::CheckEvent;
use super::states::CheckState;
use crate::logging::log_check_transition;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CheckStateError {
    #[error("Check {check_id} on {target} is not registered")]
    Unknown { check_id: String, target: String },

    #[error("Check {check_id} on {target} is already registered")]
    AlreadyRegistered { check_id: String, target: String },

    #[error("Invalid transition for {check_id} on {target}: {from} --{event}-->")]
    InvalidTransition {
        check_id: String,
        target: String,
        from: CheckState,
        event: &'static str,
    },
}

/// Tracks the state of every (check, target) pair in a run.
///
/// Each check leaves `Pending` exactly once and reaches exactly one terminal
/// state. Concurrent checks update disjoint keys.
#[derive(Debug, Default)]
pub struct CheckStateMachine {
    states: DashMap<(String, String), CheckState>,
}

impl CheckStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, check_id: &str, target: &str) -> Result<(), CheckStateError> {
        let key = (check_id.to_string(), target.to_string());
        if self.states.contains_key(&key) {
            return Err(CheckStateError::AlreadyRegistered {
                check_id: check_id.to_string(),
                target: target.to_string(),
            });
        }
        self.states.insert(key, CheckState::Pending);
        Ok(())
    }

    /// Apply an event and return the new state
    pub fn transition(
        &self,
        check_id: &str,
        target: &str,
        event: CheckEvent,
    ) -> Result<CheckState, CheckStateError> {
        let key = (check_id.to_string(), target.to_string());
        let mut entry = self
            .states
            .get_mut(&key)
            .ok_or_else(|| CheckStateError::Unknown {
                check_id: check_id.to_string(),
                target: target.to_string(),
            })?;
        let from = *entry;
        let to = match (from, &event) {
            (CheckState::Pending, CheckEvent::Start) => CheckState::Running,
            (CheckState::Running, CheckEvent::Complete(classification)) => {
                CheckState::from_classification(*classification)
            }
            _ => {
                return Err(CheckStateError::InvalidTransition {
                    check_id: check_id.to_string(),
                    target: target.to_string(),
                    from,
                    event: event.event_type(),
                })
            }
        };
        *entry = to;
        drop(entry);
        log_check_transition(check_id, target, from, to);
        Ok(to)
    }

    pub fn state(&self, check_id: &str, target: &str) -> Option<CheckState> {
        self.states
            .get(&(check_id.to_string(), target.to_string()))
            .map(|entry| *entry)
    }

    /// Whether every registered check reached a terminal state
    pub fn all_terminal(&self) -> bool {
        self.states.iter().all(|entry| entry.value().is_terminal())
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
