#![allow(clippy::doc_markdown)] // Allow technical terms like RKE2, CoreDNS in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Fleetcheck Core
//!
//! Parallel remote execution and aggregated diagnostics for small
//! self-managed RKE2 clusters.
//!
//! ## Overview
//!
//! The crate fans idempotent operations out to a set of hosts under a
//! bounded worker pool, enforces a per-call timeout and a constant-backoff
//! retry, and gathers exactly one [`Outcome`](models::Outcome) per target. The
//! same machinery drives a check registry: each check runs its probes
//! against a shared target (the local cluster context or a remote node),
//! persists the raw output as evidence and verifies it into `OK`, `FAIL` or
//! `N/A`. A severity classifier reduces the results to one
//! [`Verdict`](models::Verdict) and the report builder renders the run.
//!
//! ## Data Flow
//!
//! ```text
//! FanoutCoordinator / DiagnosticEngine
//!        │
//!        ▼
//!   RetryPolicy ──► RemoteExecutor ──► CommandRunner (sh -c | ssh)
//!        │
//!        ▼
//!   Outcome ──► EvidenceStore ──► SeverityClassifier ──► ReportBuilder
//! ```
//!
//! ## Module Organization
//!
//! - [`models`] - Targets, operations, outcomes, verdicts, evidence records
//! - [`execution`] - Command runners, executor, retry policy, fan-out
//! - [`diagnostics`] - Check registries, diagnostic engine, classifier
//! - [`evidence`] - Append-only evidence store
//! - [`report`] - Health report, fleet summary and preflight listings
//! - [`state_machine`] - Per-check lifecycle
//! - [`config`] - Layered configuration
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use fleetcheck_core::config::FleetConfig;
//! use fleetcheck_core::execution::{FanoutCoordinator, RemoteExecutor, RetryPolicy, RoutingRunner};
//! use fleetcheck_core::models::{Operation, Target};
//! use fleetcheck_core::report::FleetSummary;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = FleetConfig::load(None)?;
//! let runner = Arc::new(RoutingRunner::from_config(&config.ssh));
//! let executor = RemoteExecutor::new(runner, &config.executor);
//! let fanout = FanoutCoordinator::new(
//!     executor,
//!     RetryPolicy::from_config(&config.retry),
//!     &config.fanout,
//! );
//!
//! let targets = vec![Target::ssh("cp-1", "10.0.0.11"), Target::ssh("cp-2", "10.0.0.12")];
//! let outcomes = fanout.dispatch(&targets, &Operation::new("uptime", "uptime")).await;
//! println!("{}", FleetSummary::new("uptime", outcomes).summary_line());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod diagnostics;
pub mod error;
pub mod evidence;
pub mod execution;
pub mod logging;
pub mod models;
pub mod report;
pub mod state_machine;
pub mod utils;

pub use config::FleetConfig;
pub use diagnostics::{
    CheckOutcome, CheckRegistry, DiagnosticEngine, SeverityClassifier, Verification,
};
pub use error::{FleetError, Result};
pub use evidence::EvidenceStore;
pub use execution::{CommandRunner, FanoutCoordinator, RemoteExecutor, RetryPolicy};
pub use models::{
    Classification, FleetVerdict, Operation, Outcome, RunId, RunMetadata, Target, Verdict,
};
pub use report::{FleetSummary, Report, ReportBuilder};
