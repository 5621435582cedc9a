use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// One executed command captured as evidence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceSection {
    pub command: String,
    pub exit_status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl EvidenceSection {
    pub fn new(
        command: impl Into<String>,
        exit_status: Option<i32>,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        Self {
            command: command.into(),
            exit_status,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Render in the on-disk block format, byte-for-byte over stdout and stderr
    pub fn render(&self) -> String {
        let rc = self
            .exit_status
            .map_or_else(|| "none".to_string(), |rc| rc.to_string());
        format!(
            "CMD: {}\nRC: {}\n\nSTDOUT:\n{}\n\nSTDERR:\n{}\n",
            self.command, rc, self.stdout, self.stderr
        )
    }
}

/// Raw output of every probe of one check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceRecord {
    pub check_id: String,
    pub sections: Vec<EvidenceSection>,
}

impl EvidenceRecord {
    pub fn new(check_id: impl Into<String>) -> Self {
        Self {
            check_id: check_id.into(),
            sections: Vec::new(),
        }
    }

    pub fn push(&mut self, section: EvidenceSection) {
        self.sections.push(section);
    }

    pub fn with_section(mut self, section: EvidenceSection) -> Self {
        self.sections.push(section);
        self
    }

    pub fn render(&self) -> String {
        self.sections
            .iter()
            .map(EvidenceSection::render)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Stable reference to a persisted evidence record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EvidenceRef {
    pub check_id: String,
    pub path: PathBuf,
}

impl EvidenceRef {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for EvidenceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_render_keeps_output_verbatim() {
        let section = EvidenceSection::new("kubectl get nodes", Some(0), "  NAME\n", "");
        assert_eq!(
            section.render(),
            "CMD: kubectl get nodes\nRC: 0\n\nSTDOUT:\n  NAME\n\n\nSTDERR:\n\n"
        );
    }

    #[test]
    fn test_section_without_exit_status() {
        let section = EvidenceSection::new("ssh n1 true", None, "", "spawn failed");
        assert!(section.render().starts_with("CMD: ssh n1 true\nRC: none\n"));
    }
}
