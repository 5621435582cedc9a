//! Check registry, diagnostic engine and severity classification.
//!
//! A check is `(id, category, probes, verify)`. The engine executes every
//! probe of every registered check against one shared target, persists the
//! raw output as evidence and hands it to the check's verifier. The
//! [`SeverityClassifier`] then reduces the results to one
//! [`Verdict`](crate::models::Verdict).

pub mod classifier;
pub mod cluster_checks;
pub mod discovery;
pub mod engine;
pub mod hosts;
pub mod node_checks;
pub mod preflight;
pub mod registry;
pub mod remediation;
pub mod table;

pub use classifier::{SeverityClassifier, Tally};
pub use cluster_checks::cluster_registry;
pub use discovery::discover_targets;
pub use engine::DiagnosticEngine;
pub use hosts::{fleet_verdict, run_on_hosts, HostReport};
pub use node_checks::node_registry;
pub use preflight::{locate_tool, preflight_cluster, ExternalTool};
pub use registry::{Check, CheckOutcome, CheckRegistry, CheckScope, Verification, Verifier};
pub use table::Table;
