//! Report Builder
//!
//! Turns one run's check outcomes into a plain-text report with a fixed
//! section order: header, summary, node overview, failures, not-applicable
//! items, evidence excerpts and a scope statement. Excerpts are capped by
//! line and character count; the evidence files themselves stay complete.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use super::style::Style;
use crate::config::ReportConfig;
use crate::constants::defaults::SUMMARY_MAX_CHARS;
use crate::constants::evidence_ids;
use crate::diagnostics::CheckOutcome;
use crate::error::{FleetError, Result};
use crate::evidence::EvidenceStore;
use crate::models::{Classification, EvidenceRef, RunMetadata, Verdict};
use crate::utils::text::{clip_lines, summarize, Clipped};

const RULE: &str = "==========================================================================";
const NOT_APPLICABLE_SUMMARY_CHARS: usize = 120;

/// One `CMD:` block parsed back out of an evidence file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceBlock {
    pub command: String,
    pub exit_status: String,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockPart {
    Header,
    Stdout,
    Stderr,
}

/// Split an evidence file into its command blocks.
///
/// A new block starts at a `CMD:` line outside of an stdout section. Text
/// without any `CMD:` line yields no blocks.
pub fn extract_blocks(raw: &str) -> Vec<EvidenceBlock> {
    let mut blocks: Vec<EvidenceBlock> = Vec::new();
    let mut part: Option<BlockPart> = None;

    for line in raw.lines() {
        if part != Some(BlockPart::Stdout) {
            if let Some(command) = line.strip_prefix("CMD: ") {
                blocks.push(EvidenceBlock {
                    command: command.to_string(),
                    exit_status: String::new(),
                    stdout: String::new(),
                    stderr: String::new(),
                });
                part = Some(BlockPart::Header);
                continue;
            }
        }
        let Some(block) = blocks.last_mut() else {
            continue;
        };
        match part {
            Some(BlockPart::Header) => {
                if let Some(rc) = line.strip_prefix("RC: ") {
                    block.exit_status = rc.trim().to_string();
                } else if line == "STDOUT:" {
                    part = Some(BlockPart::Stdout);
                }
            }
            Some(BlockPart::Stdout) => {
                if line == "STDERR:" {
                    part = Some(BlockPart::Stderr);
                } else {
                    push_line(&mut block.stdout, line);
                }
            }
            Some(BlockPart::Stderr) => push_line(&mut block.stderr, line),
            None => {}
        }
    }
    blocks
}

fn push_line(buffer: &mut String, line: &str) {
    if !buffer.is_empty() {
        buffer.push('\n');
    }
    buffer.push_str(line);
}

/// Capped view of one evidence block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcerptBlock {
    pub command: String,
    pub exit_status: String,
    pub stdout: Clipped,
    pub stderr: Clipped,
}

/// Capped view of one check's evidence artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Excerpt {
    pub check_id: String,
    pub name: String,
    pub classification: Classification,
    pub evidence: EvidenceRef,
    pub blocks: Vec<ExcerptBlock>,
    /// Set when the artifact could not be read back
    pub error: Option<String>,
}

/// Snapshot of one diagnostic run. Never changes after [`ReportBuilder::build`].
#[derive(Debug, Clone)]
pub struct Report {
    run: RunMetadata,
    verdict: Verdict,
    checks: Vec<CheckOutcome>,
    failures: Vec<CheckOutcome>,
    not_applicable: Vec<CheckOutcome>,
    excerpts: Vec<Excerpt>,
    evidence_dir: PathBuf,
    path: PathBuf,
    not_applicable_limit: usize,
    finding_max_chars: usize,
}

impl Report {
    pub fn run(&self) -> &RunMetadata {
        &self.run
    }

    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    /// In-scope failures, in registration order
    pub fn failures(&self) -> &[CheckOutcome] {
        &self.failures
    }

    /// Checks excluded from the verdict that did not pass
    pub fn not_applicable(&self) -> &[CheckOutcome] {
        &self.not_applicable
    }

    pub fn excerpts(&self) -> &[Excerpt] {
        &self.excerpts
    }

    pub fn evidence(&self) -> impl Iterator<Item = &EvidenceRef> {
        self.checks.iter().filter_map(CheckOutcome::evidence)
    }

    pub fn evidence_dir(&self) -> &Path {
        &self.evidence_dir
    }

    /// Where [`Report::write`] puts the report file
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exit_code(&self) -> i32 {
        self.verdict.exit_code()
    }

    pub fn render(&self, style: Style) -> String {
        let mut lines: Vec<String> = Vec::new();
        self.render_header(style, &mut lines);
        self.render_summary(style, &mut lines);
        self.render_nodes(style, &mut lines);
        self.render_failures(style, &mut lines);
        self.render_not_applicable(style, &mut lines);
        self.render_excerpts(style, &mut lines);
        self.render_scope(style, &mut lines);
        let mut text = lines.join("\n");
        text.push('\n');
        text
    }

    /// Write the plain report to its path and copy it into the evidence directory
    pub fn write(&self, store: &EvidenceStore) -> Result<PathBuf> {
        let text = self.render(Style::plain());
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                FleetError::Report(format!("cannot create {}: {e}", parent.display()))
            })?;
        }
        fs::write(&self.path, &text).map_err(|e| {
            FleetError::Report(format!("cannot write {}: {e}", self.path.display()))
        })?;
        store.persist_text(&self.run.run_id, evidence_ids::REPORT_COPY, &text)?;

        info!(
            path = %self.path.display(),
            verdict = %self.verdict,
            failures = self.failures.len(),
            "Report written"
        );
        Ok(self.path.clone())
    }

    fn render_header(&self, style: Style, lines: &mut Vec<String>) {
        lines.push(RULE.to_string());
        lines.push(format!(" {}", style.bold(&self.run.title)));
        lines.push(RULE.to_string());
        lines.push(format!(
            "Generated : {}",
            self.run.started_at.format("%Y-%m-%d %H:%M:%S %z")
        ));
        lines.push(format!(
            "Context   : {}",
            self.run.context.as_deref().unwrap_or("(unknown)")
        ));
        lines.push(format!(
            "kubectl   : {}",
            self.run
                .kubectl
                .as_ref()
                .map_or_else(|| "(not located)".to_string(), |p| p.display().to_string())
        ));
        lines.push(format!("Evidence  : {}", self.evidence_dir.display()));
        lines.push(format!("Report    : {}", self.path.display()));
        lines.push(String::new());
        lines.push(format!("VERDICT: {}", style.verdict(self.verdict)));
    }

    fn render_summary(&self, style: Style, lines: &mut Vec<String>) {
        let count = |c: Classification| {
            self.checks
                .iter()
                .filter(|check| check.classification() == c)
                .count()
        };
        section(style, lines, "Summary");
        lines.push(format!(
            "  Checks: {}  OK: {}  FAIL: {}  N/A: {}",
            self.checks.len(),
            count(Classification::Ok),
            count(Classification::Fail),
            count(Classification::NotApplicable),
        ));
        lines.push(String::new());
        for check in &self.checks {
            let status = check.classification();
            let pad = " ".repeat(4usize.saturating_sub(status.as_str().len()));
            lines.push(format!(
                "  [{}]{pad} {:<5} {:<26} {}",
                style.classification(status),
                check.check_id,
                check.name,
                summarize(&check.outcome.summary, SUMMARY_MAX_CHARS),
            ));
        }
    }

    fn render_nodes(&self, style: Style, lines: &mut Vec<String>) {
        section(style, lines, "Nodes");
        match self.run.nodes_wide.as_deref().map(str::trim) {
            Some(nodes) if !nodes.is_empty() => {
                lines.extend(nodes.lines().map(|line| format!("  {line}")));
            }
            _ => lines.push("  (node overview unavailable)".to_string()),
        }
    }

    fn render_failures(&self, style: Style, lines: &mut Vec<String>) {
        section(style, lines, "Failures");
        if self.failures.is_empty() {
            lines.push("  No findings: every in-scope check passed.".to_string());
            return;
        }
        for check in &self.failures {
            lines.push(format!(
                "  [{}] {} {} ({})",
                style.classification(check.classification()),
                check.check_id,
                check.name,
                check.category,
            ));
            lines.push(format!(
                "      Finding : {}",
                summarize(&check.outcome.summary, self.finding_max_chars)
            ));
            lines.push(format!("      Fix     : {}", check.remediation));
            if let Some(evidence) = check.evidence() {
                lines.push(format!("      Evidence: {}", evidence.path.display()));
            }
        }
    }

    fn render_not_applicable(&self, style: Style, lines: &mut Vec<String>) {
        section(style, lines, "Not applicable");
        if self.not_applicable.is_empty() {
            lines.push("  None.".to_string());
            return;
        }
        for check in self.not_applicable.iter().take(self.not_applicable_limit) {
            lines.push(format!(
                "  [{}] {} {}: {}",
                style.classification(check.classification()),
                check.check_id,
                check.name,
                summarize(&check.outcome.summary, NOT_APPLICABLE_SUMMARY_CHARS),
            ));
        }
        let hidden = self
            .not_applicable
            .len()
            .saturating_sub(self.not_applicable_limit);
        if hidden > 0 {
            lines.push(format!("  (+{hidden} more N/A checks)"));
        }
    }

    fn render_excerpts(&self, style: Style, lines: &mut Vec<String>) {
        section(style, lines, "Evidence excerpts");
        if self.excerpts.is_empty() {
            lines.push("  (no evidence recorded)".to_string());
            return;
        }
        for excerpt in &self.excerpts {
            lines.push(format!(
                "--- {} {} [{}] {}",
                excerpt.check_id,
                excerpt.name,
                style.classification(excerpt.classification),
                excerpt.evidence.path.display(),
            ));
            if let Some(error) = &excerpt.error {
                lines.push(format!("  (evidence unreadable: {error})"));
                continue;
            }
            for block in &excerpt.blocks {
                lines.push(format!("$ {}  (rc={})", block.command, block.exit_status));
                push_clipped(lines, &block.stdout, "(no stdout)");
                if !block.stderr.is_empty() {
                    lines.push("stderr:".to_string());
                    push_clipped(lines, &block.stderr, "");
                }
            }
        }
    }

    fn render_scope(&self, style: Style, lines: &mut Vec<String>) {
        section(style, lines, "Scope");
        lines.push(
            "  Read-only checks against the cluster context above. Only in-scope checks"
                .to_string(),
        );
        lines.push(
            "  count toward the verdict; N/A items are recorded with evidence but excluded."
                .to_string(),
        );
        lines.push(format!(
            "  Excerpts are capped; full raw output is kept in {}",
            self.evidence_dir.display()
        ));
    }
}

fn section(style: Style, lines: &mut Vec<String>, title: &str) {
    lines.push(String::new());
    lines.push(style.heading(&format!("## {title}")));
}

fn push_clipped(lines: &mut Vec<String>, clipped: &Clipped, empty: &str) {
    if clipped.is_empty() {
        if !empty.is_empty() {
            lines.push(empty.to_string());
        }
        return;
    }
    lines.extend(clipped.text.lines().map(str::to_string));
    if clipped.omitted_lines > 0 {
        lines.push(format!("... (+{} more lines)", clipped.omitted_lines));
    } else if clipped.truncated {
        lines.push("... (truncated)".to_string());
    }
}

/// Builds [`Report`]s with the configured presentation caps
#[derive(Debug, Clone)]
pub struct ReportBuilder {
    config: ReportConfig,
}

impl ReportBuilder {
    pub fn new(config: &ReportConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn report_path(&self, run: &RunMetadata) -> PathBuf {
        self.config
            .output_dir
            .join(format!("report_{}.txt", run.run_id))
    }

    /// Assemble the report for one run. Evidence artifacts are read back
    /// through `store` to produce the excerpts.
    pub fn build(
        &self,
        run: &RunMetadata,
        outcomes: &[CheckOutcome],
        verdict: Verdict,
        store: &EvidenceStore,
    ) -> Report {
        let failures: Vec<CheckOutcome> = outcomes
            .iter()
            .filter(|check| check.is_in_scope_failure())
            .cloned()
            .collect();
        let not_applicable: Vec<CheckOutcome> = outcomes
            .iter()
            .filter(|check| !check.is_in_scope_failure() && !check.outcome.is_ok())
            .cloned()
            .collect();
        let excerpts = self
            .preflight_excerpts(run, store)
            .into_iter()
            .chain(outcomes.iter().filter_map(|check| self.excerpt(store, check)))
            .collect();

        Report {
            run: run.clone(),
            verdict,
            checks: outcomes.to_vec(),
            failures,
            not_applicable,
            excerpts,
            evidence_dir: store.run_dir(&run.run_id),
            path: self.report_path(run),
            not_applicable_limit: self.config.not_applicable_limit,
            finding_max_chars: self.config.finding_max_chars,
        }
    }

    /// The kubectl client check persisted during preflight, shown first
    fn preflight_excerpts(&self, run: &RunMetadata, store: &EvidenceStore) -> Vec<Excerpt> {
        let run_dir = store.run_dir(&run.run_id);
        store
            .written()
            .into_iter()
            .filter(|evidence| {
                evidence.check_id == evidence_ids::KUBECTL_CHECK
                    && evidence.path.starts_with(&run_dir)
            })
            .map(|evidence| {
                self.read_excerpt(
                    store,
                    evidence,
                    evidence_ids::KUBECTL_CHECK,
                    "kubectl client",
                    Classification::Ok,
                )
            })
            .collect()
    }

    fn excerpt(&self, store: &EvidenceStore, check: &CheckOutcome) -> Option<Excerpt> {
        let evidence = check.evidence()?.clone();
        Some(self.read_excerpt(
            store,
            evidence,
            &check.check_id,
            &check.name,
            check.classification(),
        ))
    }

    fn read_excerpt(
        &self,
        store: &EvidenceStore,
        evidence: EvidenceRef,
        check_id: &str,
        name: &str,
        classification: Classification,
    ) -> Excerpt {
        let (blocks, error) = match store.read_raw(&evidence) {
            Ok(raw) => (
                extract_blocks(&raw)
                    .into_iter()
                    .map(|block| self.clip(block))
                    .collect(),
                None,
            ),
            Err(e) => (Vec::new(), Some(e.to_string())),
        };
        Excerpt {
            check_id: check_id.to_string(),
            name: name.to_string(),
            classification,
            evidence,
            blocks,
            error,
        }
    }

    fn clip(&self, block: EvidenceBlock) -> ExcerptBlock {
        ExcerptBlock {
            stdout: clip_lines(
                &block.stdout,
                self.config.excerpt_max_lines,
                self.config.excerpt_max_chars,
            ),
            stderr: clip_lines(
                &block.stderr,
                self.config.stderr_excerpt_max_lines,
                self.config.excerpt_max_chars,
            ),
            command: block.command,
            exit_status: block.exit_status,
        }
    }
}
