//! Crossref Registry Implementation
//!
//! Queries the Crossref REST API for journal article metadata.
//!
//! # Features
//!
//! - Bibliographic search (`/works?query.bibliographic=...`) with optional
//!   ISSN and publication-date filters
//! - DOI resolution (`/works/{doi}`)
//! - "Polite pool" support: when a contact address is configured it is sent
//!   in the `User-Agent` header and as the `mailto` parameter
//!
//! No retries are performed; transport and status errors are returned to the
//! caller unchanged.
//!
//! # Examples
//!
//! ```no_run
//! use fixbib_registry::CrossrefClient;
//!
//! let client = CrossrefClient::default_endpoint(Some("me@example.org".to_string()))
//!     .expect("client")
//!     .with_rows(3);
//! ```

use crate::RegistryError;
use fixbib_domain::{CandidateRecord, Contributor, MetadataQuery, Registry};
use serde::Deserialize;
use std::time::Duration;

/// Default Crossref API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.crossref.org";

/// Default timeout for a single request (20 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Default number of search results requested
pub const DEFAULT_ROWS: usize = 5;

/// Crossref API client
pub struct CrossrefClient {
    endpoint: String,
    mailto: Option<String>,
    rows: usize,
    client: reqwest::Client,
}

/// `{"status": "ok", "message": ...}` wrapper of every Crossref response
#[derive(Deserialize)]
struct Envelope<T> {
    message: T,
}

#[derive(Deserialize)]
struct WorkList {
    #[serde(default)]
    items: Vec<CrossrefWork>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct CrossrefWork {
    title: Vec<String>,
    author: Vec<CrossrefAuthor>,
    #[serde(rename = "container-title")]
    container_title: Vec<String>,
    #[serde(rename = "ISSN")]
    issn: Vec<String>,
    issued: Option<CrossrefDate>,
    #[serde(rename = "DOI")]
    doi: Option<String>,
    #[serde(rename = "URL")]
    url: Option<String>,
    volume: Option<String>,
    issue: Option<String>,
    page: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct CrossrefAuthor {
    family: Option<String>,
    given: Option<String>,
    name: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct CrossrefDate {
    #[serde(rename = "date-parts")]
    date_parts: Vec<Vec<Option<i32>>>,
}

impl From<CrossrefWork> for CandidateRecord {
    fn from(work: CrossrefWork) -> Self {
        let authors = work
            .author
            .into_iter()
            .filter_map(|a| match (a.family, a.name) {
                (Some(family), _) => Some(Contributor::Person {
                    family,
                    given: a.given,
                }),
                (None, Some(name)) => Some(Contributor::Organization(name)),
                (None, None) => None,
            })
            .collect();

        let year = work
            .issued
            .and_then(|d| d.date_parts.into_iter().next())
            .and_then(|parts| parts.into_iter().next())
            .flatten();

        CandidateRecord {
            title: work.title.into_iter().next(),
            authors,
            container_title: work.container_title.into_iter().next(),
            issn: work.issn,
            year,
            doi: work.doi,
            url: work.url,
            volume: work.volume,
            issue: work.issue,
            page: work.page,
        }
    }
}

impl CrossrefClient {
    /// Create a new Crossref client
    ///
    /// # Parameters
    ///
    /// - `endpoint`: API base URL (e.g., "https://api.crossref.org")
    /// - `mailto`: optional contact address for the polite pool
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Config`] if the HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>, mailto: Option<String>) -> Result<Self, RegistryError> {
        let mailto = mailto.filter(|m| !m.trim().is_empty());
        let client = build_http_client(mailto.as_deref(), Duration::from_secs(DEFAULT_TIMEOUT_SECS))?;

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            mailto,
            rows: DEFAULT_ROWS,
            client,
        })
    }

    /// Create a client for the public Crossref endpoint
    pub fn default_endpoint(mailto: Option<String>) -> Result<Self, RegistryError> {
        Self::new(DEFAULT_ENDPOINT, mailto)
    }

    /// Set the number of search results requested per query
    pub fn with_rows(mut self, rows: usize) -> Self {
        self.rows = rows.max(1);
        self
    }

    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, RegistryError> {
        self.client = build_http_client(self.mailto.as_deref(), timeout)?;
        Ok(self)
    }

    /// The configured contact address, if any
    pub fn mailto(&self) -> Option<&str> {
        self.mailto.as_deref()
    }

    /// `{endpoint}/works/{doi}` with every DOI segment percent-encoded
    ///
    /// SICI-style DOIs contain `#`, `<` and `>`, which would otherwise end
    /// the path early.
    fn work_url(&self, doi: &str) -> Result<reqwest::Url, RegistryError> {
        let mut url = reqwest::Url::parse(&format!("{}/works", self.endpoint))
            .map_err(|e| RegistryError::Config(format!("Invalid endpoint '{}': {}", self.endpoint, e)))?;
        url.path_segments_mut()
            .map_err(|_| RegistryError::Config(format!("Endpoint cannot take a path: {}", self.endpoint)))?
            .extend(doi.split('/'));
        Ok(url)
    }

    /// Query parameters of a bibliographic search
    fn search_params(&self, query: &MetadataQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("query.bibliographic", query.title.clone()),
            ("rows", self.rows.to_string()),
        ];

        if !query.authors.is_empty() {
            params.push(("query.author", query.authors.join(" ")));
        }

        let mut filters = Vec::new();
        if let Some(issn) = &query.issn {
            filters.push(format!("issn:{}", issn));
        }
        if let Some(year) = &query.year {
            filters.push(format!("from-pub-date:{}", year));
        }
        if !filters.is_empty() {
            params.push(("filter", filters.join(",")));
        }

        if let Some(mailto) = &self.mailto {
            params.push(("mailto", mailto.clone()));
        }
        params
    }

    /// Search works by bibliographic metadata
    ///
    /// # Errors
    ///
    /// Returns error if the request fails, the registry answers with a
    /// non-success status, or the body is not a Crossref work list.
    pub async fn search(&self, query: &MetadataQuery) -> Result<Vec<CandidateRecord>, RegistryError> {
        let url = format!("{}/works", self.endpoint);
        tracing::debug!(title = %query.title, authors = ?query.authors, "crossref search");

        let response = self
            .client
            .get(&url)
            .query(&self.search_params(query))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(RegistryError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body: Envelope<WorkList> = response
            .json()
            .await
            .map_err(|e| RegistryError::InvalidResponse(format!("Failed to parse work list: {}", e)))?;

        Ok(body.message.items.into_iter().map(CandidateRecord::from).collect())
    }

    /// Resolve a single DOI
    ///
    /// Returns `Ok(None)` when Crossref does not know the identifier.
    pub async fn work(&self, doi: &str) -> Result<Option<CandidateRecord>, RegistryError> {
        let doi = normalize_doi(doi);
        let url = self.work_url(doi)?;
        tracing::debug!(%doi, "crossref lookup");

        let mut request = self.client.get(url);
        if let Some(mailto) = &self.mailto {
            request = request.query(&[("mailto", mailto)]);
        }
        let response = request.send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(RegistryError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body: Envelope<CrossrefWork> = response
            .json()
            .await
            .map_err(|e| RegistryError::InvalidResponse(format!("Failed to parse work: {}", e)))?;

        Ok(Some(body.message.into()))
    }
}

impl Registry for CrossrefClient {
    type Error = RegistryError;

    async fn search_by_metadata(
        &self,
        query: &MetadataQuery,
    ) -> Result<Vec<CandidateRecord>, Self::Error> {
        self.search(query).await
    }

    async fn lookup_by_identifier(&self, doi: &str) -> Result<Option<CandidateRecord>, Self::Error> {
        self.work(doi).await
    }
}

/// `User-Agent` value, carrying the contact address when one is known
pub fn user_agent(mailto: Option<&str>) -> String {
    match mailto {
        Some(mailto) => format!("fixbib/{} (mailto:{})", env!("CARGO_PKG_VERSION"), mailto),
        None => format!("fixbib/{}", env!("CARGO_PKG_VERSION")),
    }
}

/// Strip resolver prefixes (`https://doi.org/`, `doi:`) from a DOI
pub fn normalize_doi(doi: &str) -> &str {
    let doi = doi.trim();
    for prefix in [
        "https://doi.org/",
        "http://doi.org/",
        "https://dx.doi.org/",
        "http://dx.doi.org/",
        "doi:",
    ] {
        match doi.get(..prefix.len()) {
            Some(head) if head.eq_ignore_ascii_case(prefix) => return &doi[prefix.len()..],
            _ => {}
        }
    }
    doi
}

fn build_http_client(mailto: Option<&str>, timeout: Duration) -> Result<reqwest::Client, RegistryError> {
    reqwest::Client::builder()
        .user_agent(user_agent(mailto))
        .timeout(timeout)
        .build()
        .map_err(|e| RegistryError::Config(e.to_string()))
}
