//! Error types for reconciliation runs

use thiserror::Error;

/// Errors that abort a reconciliation run
///
/// Per-entry registry failures are not errors at this level: they end up as
/// a rejected `MatchDecision` and the run continues.
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// The bibliography file could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Reading or writing a bibliography file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}
