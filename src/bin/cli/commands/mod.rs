//! Command handlers. Each returns the process exit code on success.

mod exec;
mod health;
mod preflight;

pub use exec::handle_exec_command;
pub use health::handle_health_command;
pub use preflight::handle_preflight_command;
