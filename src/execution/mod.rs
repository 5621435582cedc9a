//! Remote execution: runners, the bounded executor, retry and fan-out.
//!
//! ```text
//! FanoutCoordinator ──► RetryPolicy ──► RemoteExecutor ──► CommandRunner
//!      (pool)            (constant        (timeout,          (sh -c / ssh)
//!                         backoff)         classification)
//! ```

pub mod executor;
pub mod fanout;
pub mod retry;
pub mod runner;

pub use executor::RemoteExecutor;
pub use fanout::{slowest, sort_by_target, sort_for_report, FanoutCoordinator};
pub use retry::RetryPolicy;
pub use runner::{
    CommandRunner, LocalCommandRunner, RawOutput, RoutingRunner, SshCommandRunner, TransportError,
};
