//! Trait definitions for external interactions
//!
//! These traits define the boundary between reconciliation logic and the
//! network. Implementations live in `fixbib-registry`.

use crate::{CandidateRecord, MetadataQuery};
use std::fmt::Display;

/// A bibliographic metadata registry
///
/// Implementations keep no state between calls other than a connection pool,
/// and never retry internally: a failure is reported to the caller as is.
#[allow(async_fn_in_trait)]
pub trait Registry {
    /// Error type for registry operations
    type Error: Display;

    /// Search works by author surnames and title, best match first
    async fn search_by_metadata(
        &self,
        query: &MetadataQuery,
    ) -> Result<Vec<CandidateRecord>, Self::Error>;

    /// Resolve a DOI; `Ok(None)` when the identifier is unknown
    async fn lookup_by_identifier(&self, doi: &str) -> Result<Option<CandidateRecord>, Self::Error>;
}
