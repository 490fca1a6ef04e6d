//! Match decisions - terminal states of reconciling one entry

use std::fmt;

/// Why an entry was left unmodified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// No candidate was similar enough and no DOI fallback succeeded
    NoMatch,

    /// The registry could not be reached or answered with an error
    RegistryUnavailable(String),

    /// The entry has no title to search for
    MissingTitle,

    /// Reconciliation did not finish within the per-entry time budget
    TimedOut,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::NoMatch => write!(f, "no confident match"),
            RejectReason::RegistryUnavailable(msg) => write!(f, "registry unavailable: {}", msg),
            RejectReason::MissingTitle => write!(f, "entry has no title"),
            RejectReason::TimedOut => write!(f, "timed out"),
        }
    }
}

/// Outcome of the per-entry reconciliation state machine
///
/// `Accepted*` means the entry was mutated; `Rejected` means it was left
/// exactly as parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchDecision {
    /// The top search result was accepted
    AcceptedPrimary,

    /// The search result was not accepted, but the DOI lookup was
    AcceptedFallback,

    /// Nothing was merged
    Rejected(RejectReason),
}

impl MatchDecision {
    /// Whether the entry was corrected
    pub fn is_accepted(&self) -> bool {
        matches!(self, MatchDecision::AcceptedPrimary | MatchDecision::AcceptedFallback)
    }

    /// The rejection reason, if any
    pub fn reject_reason(&self) -> Option<&RejectReason> {
        match self {
            MatchDecision::Rejected(reason) => Some(reason),
            _ => None,
        }
    }
}
