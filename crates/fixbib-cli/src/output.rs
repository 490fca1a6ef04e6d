//! Output formatting for the CLI.

use colored::*;
use fixbib_domain::MatchDecision;
use fixbib_reconciler::EntryOutcome;

/// Output formatter.
pub struct Formatter {
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(color_enabled: bool) -> Self {
        Self { color_enabled }
    }

    /// Report line for one reconciled entry.
    pub fn outcome_line(&self, outcome: &EntryOutcome) -> String {
        match &outcome.decision {
            MatchDecision::AcceptedPrimary => self.success(&format!("{}: corrected", outcome.key)),
            MatchDecision::AcceptedFallback => {
                self.success(&format!("{}: corrected (via DOI fallback)", outcome.key))
            }
            MatchDecision::Rejected(reason) => {
                self.warning(&format!("{}: unresolved ({})", outcome.key, reason))
            }
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixbib_domain::RejectReason;

    fn outcome(decision: MatchDecision) -> EntryOutcome {
        EntryOutcome {
            index: 0,
            key: "smith2020".to_string(),
            decision,
            score: None,
            changed_fields: Vec::new(),
        }
    }

    #[test]
    fn test_corrected_lines() {
        let formatter = Formatter::new(false);
        assert_eq!(
            formatter.outcome_line(&outcome(MatchDecision::AcceptedPrimary)),
            "✓ smith2020: corrected"
        );
        assert_eq!(
            formatter.outcome_line(&outcome(MatchDecision::AcceptedFallback)),
            "✓ smith2020: corrected (via DOI fallback)"
        );
    }

    #[test]
    fn test_unresolved_line_names_reason() {
        let formatter = Formatter::new(false);
        let line = formatter.outcome_line(&outcome(MatchDecision::Rejected(RejectReason::NoMatch)));
        assert_eq!(line, "⚠ smith2020: unresolved (no confident match)");
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(false);
        assert_eq!(formatter.success("test"), "✓ test");
        assert_eq!(formatter.error("test"), "✗ test");
        assert_eq!(formatter.info("test"), "ℹ test");
    }
}
