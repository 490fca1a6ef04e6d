//! Candidate records returned by the metadata registry

use std::fmt;

/// A contributor (author) as reported by the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Contributor {
    /// A natural person with a family name and optional given names
    Person {
        /// Family name (surname)
        family: String,
        /// Given names, if the registry provided them
        given: Option<String>,
    },

    /// A corporate author (consortium, working group, ...)
    Organization(String),
}

impl Contributor {
    /// Create a person contributor
    pub fn person(family: impl Into<String>, given: Option<&str>) -> Self {
        Contributor::Person {
            family: family.into(),
            given: given.map(str::to_string),
        }
    }

    /// Render the contributor the way BibTeX name lists expect it
    ///
    /// Persons become `Family, Given`; organisations are wrapped in braces so
    /// name parsers treat them as a single last name.
    ///
    /// # Examples
    ///
    /// ```
    /// use fixbib_domain::Contributor;
    ///
    /// let p = Contributor::person("Curie", Some("Marie"));
    /// assert_eq!(p.to_bibtex_name(), "Curie, Marie");
    ///
    /// let org = Contributor::Organization("ATLAS Collaboration".into());
    /// assert_eq!(org.to_bibtex_name(), "{ATLAS Collaboration}");
    /// ```
    pub fn to_bibtex_name(&self) -> String {
        match self {
            Contributor::Person { family, given: Some(given) } if !given.is_empty() => {
                format!("{}, {}", family, given)
            }
            Contributor::Person { family, .. } => family.clone(),
            Contributor::Organization(name) => format!("{{{}}}", name),
        }
    }
}

impl fmt::Display for Contributor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Contributor::Person { family, given: Some(given) } if !given.is_empty() => {
                write!(f, "{} {}", given, family)
            }
            Contributor::Person { family, .. } => write!(f, "{}", family),
            Contributor::Organization(name) => write!(f, "{}", name),
        }
    }
}

/// A registry search result considered as a possible correction
///
/// Every field is optional: the registry is free to omit any of them, and a
/// missing field must never erase the corresponding value of a local entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateRecord {
    /// Work title
    pub title: Option<String>,

    /// Ordered contributor list
    pub authors: Vec<Contributor>,

    /// Journal (container) title
    pub container_title: Option<String>,

    /// ISSNs of the container, print first when known
    pub issn: Vec<String>,

    /// Year of publication
    pub year: Option<i32>,

    /// Digital Object Identifier
    pub doi: Option<String>,

    /// Landing page URL
    pub url: Option<String>,

    /// Journal volume
    pub volume: Option<String>,

    /// Journal issue
    pub issue: Option<String>,

    /// Page range as reported by the registry (e.g. `101-117`)
    pub page: Option<String>,
}

impl CandidateRecord {
    /// Create a record carrying only a title
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    /// Builder-style DOI setter
    pub fn with_doi(mut self, doi: impl Into<String>) -> Self {
        self.doi = Some(doi.into());
        self
    }

    /// Builder-style author setter
    pub fn with_authors(mut self, authors: Vec<Contributor>) -> Self {
        self.authors = authors;
        self
    }

    /// Title of the record, or the empty string when the registry gave none
    pub fn title_or_empty(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_person_without_given_name() {
        let p = Contributor::person("Knuth", None);
        assert_eq!(p.to_bibtex_name(), "Knuth");
        assert_eq!(p.to_string(), "Knuth");
    }

    #[test]
    fn test_person_with_empty_given_name() {
        let p = Contributor::person("Knuth", Some(""));
        assert_eq!(p.to_bibtex_name(), "Knuth");
    }

    #[test]
    fn test_display_person() {
        let p = Contributor::person("Lovelace", Some("Ada"));
        assert_eq!(p.to_string(), "Ada Lovelace");
    }

    #[test]
    fn test_record_builders() {
        let record = CandidateRecord::titled("On Computable Numbers")
            .with_doi("10.1112/plms/s2-42.1.230")
            .with_authors(vec![Contributor::person("Turing", Some("Alan"))]);

        assert_eq!(record.title_or_empty(), "On Computable Numbers");
        assert_eq!(record.doi.as_deref(), Some("10.1112/plms/s2-42.1.230"));
        assert_eq!(record.authors.len(), 1);
        assert!(record.container_title.is_none());
    }

    #[test]
    fn test_title_or_empty_default() {
        assert_eq!(CandidateRecord::default().title_or_empty(), "");
    }
}
