// Check lifecycle state machine
//
// Pending -> Running -> {Ok, Fail, NotApplicable}. Transitions are validated and
// logged; terminal states are final.

pub mod check_state_machine;
pub mod events;
pub mod states;

pub use check_state_machine::{CheckStateError, CheckStateMachine};
pub use events::CheckEvent;
pub use states::CheckState;
