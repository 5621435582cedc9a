use parking_lot::Mutex;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::EvidenceConfig;
use crate::error::{FleetError, Result};
use crate::models::{EvidenceRecord, EvidenceRef, EvidenceSection, RunId};
use crate::utils::text::slugify;

const MAX_NAME_SUFFIX: usize = 1_000;

/// Append-only store of raw command output.
///
/// Every record lands in `<root>/evidence_<run_id>/<slug>.txt`. Files are
/// created exclusively, so an existing artifact is never overwritten: a
/// second record with the same slug in the same run gets `<slug>.1.txt`.
/// Content is written verbatim; truncation is a presentation concern.
#[derive(Debug)]
pub struct EvidenceStore {
    root: PathBuf,
    written: Mutex<Vec<EvidenceRef>>,
}

impl EvidenceStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            written: Mutex::new(Vec::new()),
        }
    }

    pub fn from_config(config: &EvidenceConfig) -> Self {
        Self::new(config.root_dir.clone())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn run_dir(&self, run_id: &RunId) -> PathBuf {
        self.root.join(format!("evidence_{run_id}"))
    }

    /// Persist one command's raw output
    pub fn persist(
        &self,
        run_id: &RunId,
        check_id: &str,
        command: &str,
        exit_status: Option<i32>,
        stdout: &str,
        stderr: &str,
    ) -> Result<EvidenceRef> {
        let record = EvidenceRecord::new(check_id).with_section(EvidenceSection::new(
            command,
            exit_status,
            stdout,
            stderr,
        ));
        self.persist_record(run_id, &record)
    }

    /// Persist every section of a record into a single artifact
    pub fn persist_record(&self, run_id: &RunId, record: &EvidenceRecord) -> Result<EvidenceRef> {
        self.persist_text(run_id, &record.check_id, &record.render())
    }

    /// Persist arbitrary text (e.g. a copy of the report) under `name`
    pub fn persist_text(&self, run_id: &RunId, name: &str, content: &str) -> Result<EvidenceRef> {
        let dir = self.run_dir(run_id);
        fs::create_dir_all(&dir).map_err(|e| {
            FleetError::Evidence(format!("cannot create {}: {e}", dir.display()))
        })?;

        let slug = slugify(name);
        let path = create_exclusive(&dir, &slug, content)?;
        debug!(
            check_id = %name,
            path = %path.display(),
            bytes = content.len(),
            "Evidence persisted"
        );

        let evidence = EvidenceRef {
            check_id: name.to_string(),
            path,
        };
        self.written.lock().push(evidence.clone());
        Ok(evidence)
    }

    pub fn read_raw(&self, evidence: &EvidenceRef) -> Result<String> {
        fs::read_to_string(&evidence.path).map_err(|e| {
            FleetError::Evidence(format!("cannot read {}: {e}", evidence.path.display()))
        })
    }

    /// References written through this store, in write order
    pub fn written(&self) -> Vec<EvidenceRef> {
        self.written.lock().clone()
    }
}

fn create_exclusive(dir: &Path, slug: &str, content: &str) -> Result<PathBuf> {
    for suffix in 0..MAX_NAME_SUFFIX {
        let file_name = match suffix {
            0 => format!("{slug}.txt"),
            n => format!("{slug}.{n}.txt"),
        };
        let path = dir.join(file_name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(content.as_bytes()).map_err(|e| {
                    FleetError::Evidence(format!("cannot write {}: {e}", path.display()))
                })?;
                return Ok(path);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => {
                return Err(FleetError::Evidence(format!(
                    "cannot create {}: {e}",
                    path.display()
                )))
            }
        }
    }
    Err(FleetError::Evidence(format!(
        "too many artifacts named {slug} in {}",
        dir.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persist_writes_verbatim_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let store = EvidenceStore::new(dir.path());
        let run = RunId::new("20240101_000000");
        let stdout = "x".repeat(10_000);
        let evidence = store
            .persist(&run, "2.1 Nodes Ready", "kubectl get nodes", Some(0), &stdout, "")
            .unwrap();
        assert_eq!(
            evidence.path,
            dir.path().join("evidence_20240101_000000").join("2_1_nodes_ready.txt")
        );
        let raw = store.read_raw(&evidence).unwrap();
        assert!(raw.starts_with("CMD: kubectl get nodes\nRC: 0\n\nSTDOUT:\n"));
        assert!(raw.contains(&stdout));
    }

    #[test]
    fn test_same_slug_in_same_run_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = EvidenceStore::new(dir.path());
        let run = RunId::new("r1");
        let first = store.persist(&run, "2.1", "a", Some(0), "first", "").unwrap();
        let second = store.persist(&run, "2.1", "b", Some(1), "second", "").unwrap();
        assert_ne!(first.path, second.path);
        assert!(store.read_raw(&first).unwrap().contains("first"));
        assert!(store.read_raw(&second).unwrap().contains("second"));
        assert_eq!(store.written().len(), 2);
    }
}
