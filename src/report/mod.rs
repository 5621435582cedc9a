//! Human-readable artifacts: the cluster health report, fan-out summaries
//! and per-host preflight listings.

pub mod builder;
pub mod fleet;
pub mod preflight;
pub mod style;

pub use builder::{extract_blocks, EvidenceBlock, Excerpt, ExcerptBlock, Report, ReportBuilder};
pub use fleet::{FleetSummary, SlowestTarget};
pub use preflight::render_host_reports;
pub use style::Style;
