//! ANSI styling for terminal output. Files are always written plain.

use crate::models::{Classification, FleetVerdict, Verdict};

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Style {
    colored: bool,
}

impl Style {
    pub fn plain() -> Self {
        Self { colored: false }
    }

    pub fn colored() -> Self {
        Self { colored: true }
    }

    pub fn new(colored: bool) -> Self {
        Self { colored }
    }

    pub fn is_colored(&self) -> bool {
        self.colored
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.colored {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    pub fn bold(&self, text: &str) -> String {
        self.paint(BOLD, text)
    }

    pub fn heading(&self, text: &str) -> String {
        self.paint(CYAN, text)
    }

    pub fn classification(&self, classification: Classification) -> String {
        let code = match classification {
            Classification::Ok => GREEN,
            Classification::Fail => RED,
            Classification::NotApplicable => YELLOW,
        };
        self.paint(code, classification.as_str())
    }

    pub fn verdict(&self, verdict: Verdict) -> String {
        let code = match verdict {
            Verdict::Operational => GREEN,
            Verdict::Degraded => YELLOW,
            Verdict::Unavailable => RED,
        };
        self.paint(&format!("{BOLD}{code}"), verdict.label())
    }

    pub fn fleet_verdict(&self, verdict: FleetVerdict) -> String {
        let code = match verdict {
            FleetVerdict::Ok => GREEN,
            FleetVerdict::PartialFailure => YELLOW,
            FleetVerdict::TotalFailure => RED,
        };
        self.paint(&format!("{BOLD}{code}"), &verdict.to_string())
    }

    /// `✓` or `✗`
    pub fn mark(&self, ok: bool) -> String {
        if ok {
            self.paint(GREEN, "✓")
        } else {
            self.paint(RED, "✗")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_style_emits_no_escapes() {
        let style = Style::plain();
        assert_eq!(style.verdict(Verdict::Degraded), "PLATFORM DEGRADED");
        assert_eq!(style.classification(Classification::NotApplicable), "N/A");
        assert!(!style.mark(false).contains('\x1b'));
    }

    #[test]
    fn test_colored_style_wraps_text() {
        let painted = Style::colored().classification(Classification::Fail);
        assert!(painted.starts_with("\x1b[31m"));
        assert!(painted.ends_with(RESET));
    }
}
