//! fixbib Domain Layer
//!
//! Core value types shared by the registry client, the reconciliation engine
//! and the command-line front end. This crate has no external dependencies;
//! infrastructure (HTTP, BibTeX parsing) lives in other crates and meets the
//! domain through the traits in [`traits`].
//!
//! ## Key Concepts
//!
//! - **Candidate Record**: a registry result that might describe the same work
//!   as a local bibliography entry
//! - **Metadata Query**: the noisy search built from a local entry
//! - **Match Decision**: the terminal state of reconciling one entry

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod candidate;
pub mod decision;
pub mod query;
pub mod traits;

// Re-exports for convenience
pub use candidate::{CandidateRecord, Contributor};
pub use decision::{MatchDecision, RejectReason};
pub use query::MetadataQuery;
pub use traits::Registry;
