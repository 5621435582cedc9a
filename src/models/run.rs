use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Identifier of one diagnostic run, derived from its start time
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    pub fn from_timestamp(started_at: &DateTime<Local>) -> Self {
        Self(started_at.format("%Y%m%d_%H%M%S").to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Context captured at the start of a run and shown in the report header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub run_id: RunId,
    pub started_at: DateTime<Local>,
    pub title: String,
    /// Current kubectl context, when it could be read
    pub context: Option<String>,
    /// Kubectl binary the run used
    pub kubectl: Option<PathBuf>,
    /// `get nodes -o wide` captured during preflight
    pub nodes_wide: Option<String>,
}

impl RunMetadata {
    pub fn new(title: impl Into<String>) -> Self {
        let started_at = Local::now();
        Self {
            run_id: RunId::from_timestamp(&started_at),
            started_at,
            title: title.into(),
            context: None,
            kubectl: None,
            nodes_wide: None,
        }
    }

    pub fn with_run_id(mut self, run_id: RunId) -> Self {
        self.run_id = run_id;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_run_id_format() {
        let ts = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(RunId::from_timestamp(&ts).as_str(), "20240309_070501");
    }
}
