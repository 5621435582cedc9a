//! Durable evidence artifacts, one file per check (and host) per run.

pub mod store;

pub use store::EvidenceStore;
