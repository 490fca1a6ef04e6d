//! Run summary - counts of reconciliation outcomes

use crate::engine::EntryOutcome;
use fixbib_domain::{MatchDecision, RejectReason};

/// Counts collected over one reconciliation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Entries in the input file
    pub total: usize,

    /// Entries that passed the filter
    pub eligible: usize,

    /// Entries corrected from the top search result
    pub corrected_primary: usize,

    /// Entries corrected through the DOI fallback
    pub corrected_fallback: usize,

    /// Entries without a confident match
    pub unresolved: usize,

    /// Entries left alone because the registry failed
    pub registry_unavailable: usize,

    /// Entries that ran out of time
    pub timed_out: usize,
}

impl RunSummary {
    /// Create an empty summary for a file of `total` entries
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    /// Build a summary from the outcomes of a run
    pub fn from_outcomes(total: usize, outcomes: &[EntryOutcome]) -> Self {
        let mut summary = Self::new(total);
        for outcome in outcomes {
            summary.record(&outcome.decision);
        }
        summary
    }

    /// Record one terminal decision
    pub fn record(&mut self, decision: &MatchDecision) {
        self.eligible += 1;
        match decision {
            MatchDecision::AcceptedPrimary => self.corrected_primary += 1,
            MatchDecision::AcceptedFallback => self.corrected_fallback += 1,
            MatchDecision::Rejected(RejectReason::RegistryUnavailable(_)) => {
                self.registry_unavailable += 1
            }
            MatchDecision::Rejected(RejectReason::TimedOut) => self.timed_out += 1,
            MatchDecision::Rejected(_) => self.unresolved += 1,
        }
    }

    /// Entries corrected by either path
    pub fn corrected(&self) -> usize {
        self.corrected_primary + self.corrected_fallback
    }

    /// Entries not touched by the filter
    pub fn skipped(&self) -> usize {
        self.total.saturating_sub(self.eligible)
    }

    /// Generate a summary report
    pub fn summary(&self) -> String {
        let mut lines = vec![
            format!("Entries: {} ({} eligible, {} skipped)", self.total, self.eligible, self.skipped()),
            format!(
                "Corrected: {} ({} by search, {} via DOI fallback)",
                self.corrected(),
                self.corrected_primary,
                self.corrected_fallback
            ),
            format!("Unresolved: {}", self.unresolved),
        ];

        if self.registry_unavailable > 0 {
            lines.push(format!("Registry unavailable: {}", self.registry_unavailable));
        }
        if self.timed_out > 0 {
            lines.push(format!("Timed out: {}", self.timed_out));
        }

        lines.join("\n")
    }
}
