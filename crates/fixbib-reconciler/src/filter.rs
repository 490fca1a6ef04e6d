//! Entry filter - selects journal articles eligible for correction

use crate::bibliography::ReferenceEntry;

/// Venue names of preprint servers (lowercase substrings)
const PREPRINT_VENUES: &[&str] = &[
    "arxiv",
    "biorxiv",
    "medrxiv",
    "chemrxiv",
    "ssrn",
    "research square",
    "preprints.org",
    "preprint",
];

/// DOI prefixes registered by preprint servers
const PREPRINT_DOI_PREFIXES: &[&str] = &[
    "10.48550/", // arXiv
    "10.1101/",  // bioRxiv, medRxiv
    "10.26434/", // chemRxiv
    "10.2139/",  // SSRN
    "10.21203/", // Research Square
];

/// Publication states that mean "not published yet"
const UNPUBLISHED_STATES: &[&str] = &["preprint", "submitted", "inpreparation", "inpress"];

/// Whether an entry may be corrected
///
/// Only `@article` entries qualify, and only if nothing marks them as a
/// preprint. Every other type, including unknown ones, is excluded.
pub fn is_eligible(entry: &ReferenceEntry) -> bool {
    entry.is_article() && !is_preprint(entry)
}

/// Eligible entries, in file order
pub fn select_eligible(entries: &[ReferenceEntry]) -> Vec<&ReferenceEntry> {
    entries.iter().filter(|e| is_eligible(e)).collect()
}

/// Whether an entry carries a preprint marker
pub fn is_preprint(entry: &ReferenceEntry) -> bool {
    if entry.has_field("eprinttype") || entry.has_field("archiveprefix") {
        return true;
    }

    if let Some(state) = entry.field("pubstate") {
        let state = state.to_lowercase();
        if UNPUBLISHED_STATES.iter().any(|s| state == *s) {
            return true;
        }
    }

    let venue = entry.field("journal").or_else(|| entry.field("journaltitle"));
    if let Some(venue) = venue {
        let venue = venue.to_lowercase();
        if PREPRINT_VENUES.iter().any(|v| venue.contains(v)) {
            return true;
        }
    }

    if let Some(doi) = entry.doi() {
        let doi = doi.to_lowercase();
        if PREPRINT_DOI_PREFIXES.iter().any(|p| doi.starts_with(p)) {
            return true;
        }
    }

    false
}
