//! fixbib Registry Layer
//!
//! Implementations of the `Registry` trait from `fixbib-domain`.
//!
//! # Registries
//!
//! - `CrossrefClient`: the Crossref REST API (`api.crossref.org`)
//! - `MockRegistry`: deterministic in-memory registry for testing
//!
//! # Examples
//!
//! ```
//! use fixbib_registry::MockRegistry;
//! use fixbib_domain::{CandidateRecord, MetadataQuery, Registry};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let registry = MockRegistry::new();
//! registry.add_search_results("Deep learning", vec![CandidateRecord::titled("Deep learning")]);
//!
//! let results = registry
//!     .search_by_metadata(&MetadataQuery::new("Deep learning"))
//!     .await
//!     .unwrap();
//! assert_eq!(results.len(), 1);
//! # }
//! ```

#![warn(missing_docs)]

pub mod crossref;

use fixbib_domain::{CandidateRecord, MetadataQuery, Registry};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

pub use crossref::CrossrefClient;

/// Errors that can occur while talking to a registry
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Network or connection failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// The registry answered with a non-success status
    #[error("HTTP {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body or reason phrase
        message: String,
    },

    /// The response body could not be decoded
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The client could not be constructed
    #[error("Client configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for RegistryError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            RegistryError::InvalidResponse(e.to_string())
        } else if let Some(status) = e.status() {
            RegistryError::Status {
                status: status.as_u16(),
                message: e.to_string(),
            }
        } else {
            RegistryError::Transport(e.to_string())
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    search_results: HashMap<String, Vec<CandidateRecord>>,
    failing_searches: HashSet<String>,
    records: HashMap<String, CandidateRecord>,
    failing_lookups: HashSet<String>,
    latency: HashMap<String, Duration>,
    queries: Vec<MetadataQuery>,
    lookups: Vec<String>,
}

/// In-memory registry for deterministic testing
///
/// Search results are keyed by the exact query title and DOI records by
/// DOI. Unknown titles return no candidates and unknown DOIs resolve to
/// nothing. Clones share state, so a test can keep a handle and inspect the
/// calls made through another clone.
///
/// # Examples
///
/// ```
/// use fixbib_registry::MockRegistry;
/// use fixbib_domain::{CandidateRecord, Registry};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let registry = MockRegistry::new();
/// registry.add_record("10.1000/xyz", CandidateRecord::titled("A resolved work"));
///
/// let record = registry.lookup_by_identifier("10.1000/xyz").await.unwrap();
/// assert!(record.is_some());
/// assert_eq!(registry.lookup_calls(), 1);
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockRegistry {
    state: Arc<Mutex<MockState>>,
}

impl MockRegistry {
    /// Create an empty mock registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the candidates returned when searching for `title`
    pub fn add_search_results(&self, title: impl Into<String>, results: Vec<CandidateRecord>) {
        self.state
            .lock()
            .unwrap()
            .search_results
            .insert(title.into(), results);
    }

    /// Make searches for `title` fail with a transport error
    pub fn fail_search(&self, title: impl Into<String>) {
        self.state.lock().unwrap().failing_searches.insert(title.into());
    }

    /// Register the record a DOI resolves to
    pub fn add_record(&self, doi: impl Into<String>, record: CandidateRecord) {
        self.state.lock().unwrap().records.insert(doi.into(), record);
    }

    /// Make lookups of `doi` fail with a server error
    pub fn fail_lookup(&self, doi: impl Into<String>) {
        self.state.lock().unwrap().failing_lookups.insert(doi.into());
    }

    /// Delay searches for `title` by `delay`
    pub fn set_latency(&self, title: impl Into<String>, delay: Duration) {
        self.state.lock().unwrap().latency.insert(title.into(), delay);
    }

    /// Number of metadata searches issued
    pub fn search_calls(&self) -> usize {
        self.state.lock().unwrap().queries.len()
    }

    /// Number of DOI lookups issued
    pub fn lookup_calls(&self) -> usize {
        self.state.lock().unwrap().lookups.len()
    }

    /// Every metadata query received, in arrival order
    pub fn queries(&self) -> Vec<MetadataQuery> {
        self.state.lock().unwrap().queries.clone()
    }

    /// Every DOI looked up, in arrival order
    pub fn lookups(&self) -> Vec<String> {
        self.state.lock().unwrap().lookups.clone()
    }
}

impl Registry for MockRegistry {
    type Error = RegistryError;

    async fn search_by_metadata(
        &self,
        query: &MetadataQuery,
    ) -> Result<Vec<CandidateRecord>, Self::Error> {
        let delay = {
            let mut state = self.state.lock().unwrap();
            state.queries.push(query.clone());
            state.latency.get(&query.title).copied()
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let state = self.state.lock().unwrap();
        if state.failing_searches.contains(&query.title) {
            return Err(RegistryError::Transport("mock connection refused".to_string()));
        }
        Ok(state
            .search_results
            .get(&query.title)
            .cloned()
            .unwrap_or_default())
    }

    async fn lookup_by_identifier(&self, doi: &str) -> Result<Option<CandidateRecord>, Self::Error> {
        let mut state = self.state.lock().unwrap();
        state.lookups.push(doi.to_string());

        if state.failing_lookups.contains(doi) {
            return Err(RegistryError::Status {
                status: 503,
                message: "mock service unavailable".to_string(),
            });
        }
        Ok(state.records.get(doi).cloned())
    }
}
