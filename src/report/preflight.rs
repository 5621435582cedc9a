//! Per-host rendering of node preflight results.

use super::style::Style;
use crate::diagnostics::HostReport;
use crate::models::Verdict;
use crate::utils::text::summarize;

pub fn render_host_reports(reports: &[HostReport], verdict: Verdict, style: Style) -> String {
    let mut lines = Vec::new();
    for report in reports {
        lines.push(format!(
            "{} {} ({})  {}",
            style.heading("==>"),
            style.bold(&report.target.name),
            report.target.address,
            style.verdict(report.verdict),
        ));
        if let Some(error) = &report.error {
            lines.push(format!("  {} checks did not run: {error}", style.mark(false)));
            continue;
        }
        for check in &report.checks {
            lines.push(format!(
                "  {} {:<28} {}",
                style.mark(check.outcome.is_ok()),
                check.name,
                summarize(&check.outcome.summary, 120),
            ));
            if check.is_in_scope_failure() {
                lines.push(format!("      fix: {}", check.remediation));
            }
        }
    }
    let failing = reports
        .iter()
        .filter(|report| report.verdict != Verdict::Operational)
        .count();
    lines.push(String::new());
    lines.push(format!(
        "{}/{} hosts ready; overall {}",
        reports.len() - failing,
        reports.len(),
        style.verdict(verdict),
    ));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{CheckOutcome, CheckScope};
    use crate::models::{Outcome, Target, TargetId};

    fn swap_failure() -> CheckOutcome {
        CheckOutcome {
            check_id: "node.swap".to_string(),
            name: "Swap disabled".to_string(),
            category: "Node preflight".to_string(),
            scope: CheckScope::InScope,
            remediation: "swapoff -a".to_string(),
            outcome: Outcome::fail(TargetId::new("w-1"), "node.swap", "swap active: /swap.img"),
        }
    }

    #[test]
    fn test_failures_carry_remediation() {
        let reports = vec![
            HostReport {
                target: Target::ssh("w-1", "10.0.0.21"),
                checks: vec![swap_failure()],
                verdict: Verdict::Unavailable,
                error: None,
            },
            HostReport {
                target: Target::ssh("w-2", "10.0.0.22"),
                checks: Vec::new(),
                verdict: Verdict::Unavailable,
                error: Some("worker panicked: boom".to_string()),
            },
        ];
        let text = render_host_reports(&reports, Verdict::Unavailable, Style::plain());
        assert!(text.contains("✗ Swap disabled"));
        assert!(text.contains("fix: swapoff -a"));
        assert!(text.contains("checks did not run: worker panicked: boom"));
        assert!(text.contains("0/2 hosts ready"));
    }
}
