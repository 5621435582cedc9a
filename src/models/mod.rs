//! Data model shared by the executor, diagnostics and reporting layers.
//!
//! Every type here is plain data: immutable once produced and safe to move
//! across tasks.

pub mod evidence;
pub mod operation;
pub mod outcome;
pub mod run;
pub mod target;
pub mod verdict;

pub use evidence::{EvidenceRecord, EvidenceRef, EvidenceSection};
pub use operation::{ExpectedOutput, Operation, OperationSequence};
pub use outcome::{Classification, Outcome};
pub use run::{RunId, RunMetadata};
pub use target::{SshParams, Target, TargetId, Transport};
pub use verdict::{FleetVerdict, Verdict};
