//! fixbib Reconciliation Engine
//!
//! Reads a bibliography, selects the journal articles worth correcting, and
//! reconciles each one against a metadata [`Registry`](fixbib_domain::Registry).
//!
//! # Pipeline
//!
//! 1. **Parse**: [`BibFile::parse`] turns source text into
//!    [`ReferenceEntry`] values (a parse failure aborts before any request)
//! 2. **Filter**: [`is_eligible`] keeps `@article` entries that are not
//!    preprints
//! 3. **Query**: author surnames, title and optional ISSN/year filters are
//!    sent to the registry
//! 4. **Judge**: the top candidate's title is scored with
//!    [`SimilarityJudge`]; below [`SIMILARITY_THRESHOLD`] the DOI fallback
//!    is tried and judged the same way
//! 5. **Merge**: accepted registry fields overwrite the local ones
//!
//! Entries are processed concurrently; outcomes and output keep file order.
//! Written files differ from the input only in the corrected values.

#![warn(missing_docs)]

pub mod bibliography;
pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod merge;
pub mod similarity;
mod source;
pub mod summary;

pub use bibliography::{
    parse_bibliography, read_bibliography, serialize_entries, write_bibliography, BibFile,
    ReferenceEntry,
};
pub use config::{ReconcileConfig, DEFAULT_REGISTRY_URL};
pub use engine::{EntryOutcome, Reconciler};
pub use error::ReconcileError;
pub use filter::{is_eligible, is_preprint, select_eligible};
pub use merge::merge_candidate;
pub use similarity::{
    normalize_title, title_similarity, NormalizedLevenshtein, SimilarityJudge, SimilarityMeasure,
    SIMILARITY_THRESHOLD,
};
pub use summary::RunSummary;
