//! Metadata search queries built from local entries

/// A bibliographic search against the registry
///
/// Optional filters are only populated when the source entry carries the
/// corresponding field, so a noisy entry never over-constrains its query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataQuery {
    /// Author surnames, in entry order
    pub authors: Vec<String>,

    /// Title as written in the local entry
    pub title: String,

    /// ISSN filter
    pub issn: Option<String>,

    /// Publication year filter
    pub year: Option<String>,
}

impl MetadataQuery {
    /// Create a query from a title alone
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Builder-style author setter
    pub fn with_authors(mut self, authors: Vec<String>) -> Self {
        self.authors = authors;
        self
    }

    /// Builder-style ISSN filter
    pub fn with_issn(mut self, issn: Option<String>) -> Self {
        self.issn = issn;
        self
    }

    /// Builder-style year filter
    pub fn with_year(mut self, year: Option<String>) -> Self {
        self.year = year;
        self
    }

    /// Whether any registry-side filter applies
    pub fn has_filters(&self) -> bool {
        self.issn.is_some() || self.year.is_some()
    }
}
