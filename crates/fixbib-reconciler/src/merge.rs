//! Sparse overlay of registry records onto local entries

use crate::bibliography::ReferenceEntry;
use biblatex::Chunk;
use fixbib_domain::{CandidateRecord, Contributor};

/// Overlay a registry record onto an entry
///
/// Registry values overwrite the corresponding local fields; fields the
/// record does not carry are left untouched. Fields whose plain-text value
/// is already equal are not rewritten, so local brace protection survives.
/// The citation key is never modified.
///
/// A non-empty registry author list always replaces the local one, even
/// when it is shorter. A registry record that truncates long author lists
/// therefore drops local co-authors; keeping local authors whenever the
/// counts differ would instead leave misspelled names uncorrected.
///
/// Returns the names of the fields that changed.
pub fn merge_candidate(entry: &mut ReferenceEntry, record: &CandidateRecord) -> Vec<String> {
    let mut changed = Vec::new();

    if let Some(title) = non_empty(&record.title) {
        overlay(entry, "title", title, &mut changed);
    }

    if !record.authors.is_empty() {
        let (plain, chunks) = author_list(&record.authors);
        if entry.field("author").as_deref() != Some(plain.as_str()) {
            entry.set_chunks("author", chunks);
            changed.push("author".to_string());
        }
    }

    if let Some(journal) = non_empty(&record.container_title) {
        // Keep the entry's own dialect (BibTeX `journal` vs BibLaTeX `journaltitle`)
        let field = if entry.has_field("journaltitle") && !entry.has_field("journal") {
            "journaltitle"
        } else {
            "journal"
        };
        overlay(entry, field, journal, &mut changed);
    }

    if let Some(issn) = record.issn.iter().map(|s| s.trim()).find(|s| !s.is_empty()) {
        overlay(entry, "issn", issn, &mut changed);
    }

    if let Some(year) = record.year {
        overlay(entry, "year", &year.to_string(), &mut changed);
    }

    if let Some(doi) = non_empty(&record.doi) {
        overlay(entry, "doi", doi, &mut changed);
    }

    if let Some(url) = non_empty(&record.url) {
        overlay(entry, "url", url, &mut changed);
    }

    if let Some(volume) = non_empty(&record.volume) {
        overlay(entry, "volume", volume, &mut changed);
    }

    if let Some(issue) = non_empty(&record.issue) {
        overlay(entry, "number", issue, &mut changed);
    }

    if let Some(page) = non_empty(&record.page) {
        let pages = page_range(page);
        // The parser may have resolved `--` to an en dash
        if entry.field("pages").map(|p| page_range(&p)).as_deref() != Some(pages.as_str()) {
            entry.set_field("pages", &pages);
            changed.push("pages".to_string());
        }
    }

    changed
}

/// Normalise a page range to BibTeX's double hyphen (`101-117` -> `101--117`)
pub fn page_range(page: &str) -> String {
    let page = page.trim().replace(['\u{2013}', '\u{2014}'], "--");
    if page.contains("--") {
        page
    } else {
        page.replace('-', "--")
    }
}

fn overlay(entry: &mut ReferenceEntry, field: &str, value: &str, changed: &mut Vec<String>) {
    if entry.field(field).as_deref() != Some(value) {
        entry.set_field(field, value);
        changed.push(field.to_string());
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// `Family, Given and ...` as plain text and as chunks
///
/// Organisation names become verbatim chunks so the writer braces them and
/// name parsers keep them whole.
fn author_list(authors: &[Contributor]) -> (String, Vec<Chunk>) {
    let mut plain = String::new();
    let mut chunks = Vec::new();
    let mut pending = String::new();

    for (i, author) in authors.iter().enumerate() {
        if i > 0 {
            plain.push_str(" and ");
            pending.push_str(" and ");
        }
        match author {
            Contributor::Organization(name) => {
                plain.push_str(name);
                if !pending.is_empty() {
                    chunks.push(Chunk::Normal(std::mem::take(&mut pending)));
                }
                chunks.push(Chunk::Verbatim(name.clone()));
            }
            person => {
                let name = person.to_bibtex_name();
                plain.push_str(&name);
                pending.push_str(&name);
            }
        }
    }
    if !pending.is_empty() {
        chunks.push(Chunk::Normal(pending));
    }

    (plain, chunks)
}
