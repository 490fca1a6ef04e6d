//! Bibliography files and reference entries
//!
//! Field values are read through the `biblatex` crate, which resolves
//! `@string` macros and brace groups. Writing goes back to the source text:
//! an entry is reproduced byte for byte except for the fields that were set,
//! and `@preamble`, `@string` and `@comment` blocks are kept as written. A
//! textual diff of the original and the reconciled file therefore only
//! shows corrected fields.

use crate::error::ReconcileError;
use crate::source::{self, RawEntry, Segment};
use biblatex::{Bibliography, Chunk, Entry, EntryType, Spanned};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// One bibliographic record of the input file
///
/// The citation key is fixed at parse time; only field values change.
#[derive(Debug, Clone)]
pub struct ReferenceEntry {
    entry: Entry,
    raw: Option<RawEntry>,
    dirty: BTreeSet<String>,
}

impl ReferenceEntry {
    /// Citation key, unique within the file
    pub fn key(&self) -> &str {
        &self.entry.key
    }

    /// Entry type as declared in the file
    pub fn entry_type(&self) -> &EntryType {
        &self.entry.entry_type
    }

    /// Whether this is an `@article`
    pub fn is_article(&self) -> bool {
        self.entry.entry_type == EntryType::Article
    }

    /// Raw chunks of a field, matching the name case-insensitively
    fn chunks(&self, name: &str) -> Option<&[Spanned<Chunk>]> {
        self.entry
            .fields
            .get(name)
            .or_else(|| {
                self.entry
                    .fields
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(name))
                    .map(|(_, v)| v)
            })
            .map(|chunks| chunks.as_slice())
    }

    /// Field value flattened to plain text; `None` if missing or blank
    pub fn field(&self, name: &str) -> Option<String> {
        self.chunks(name)
            .map(chunks_to_string)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    /// Whether the field is present at all
    pub fn has_field(&self, name: &str) -> bool {
        self.chunks(name).is_some()
    }

    /// Replace a field with a plain-text value
    pub fn set_field(&mut self, name: &str, value: &str) {
        self.set_chunks(name, vec![Chunk::Normal(value.to_string())]);
    }

    /// Replace a field with pre-built chunks (`Verbatim` chunks keep braces)
    pub fn set_chunks(&mut self, name: &str, chunks: Vec<Chunk>) {
        let key = self
            .entry
            .fields
            .keys()
            .find(|k| k.eq_ignore_ascii_case(name))
            .cloned()
            .unwrap_or_else(|| name.to_string());
        let spanned = chunks.into_iter().map(Spanned::detached).collect();
        self.entry.fields.insert(key, spanned);
        self.dirty.insert(name.to_ascii_lowercase());
    }

    /// Title as plain text
    pub fn title(&self) -> Option<String> {
        self.field("title")
    }

    /// DOI as written in the entry
    pub fn doi(&self) -> Option<String> {
        self.field("doi")
    }

    /// Publication year, from `year` or the leading digits of `date`
    pub fn year(&self) -> Option<String> {
        self.field("year").or_else(|| {
            self.field("date")
                .map(|date| date.chars().take_while(|c| c.is_ascii_digit()).collect::<String>())
                .filter(|year| year.len() == 4)
        })
    }

    /// Author surnames in entry order
    pub fn surnames(&self) -> Vec<String> {
        self.entry
            .author()
            .map(|people| {
                people
                    .into_iter()
                    .map(|person| person.name)
                    .filter(|name| !name.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Serialize the entry
    ///
    /// Parsed entries keep their source text; only the values of fields set
    /// since parsing are rewritten, and new fields are appended after the
    /// last one. Entries built without source fall back to BibLaTeX syntax.
    pub fn to_bib_string(&self) -> String {
        let Some(raw) = &self.raw else {
            return self.entry.to_biblatex_string();
        };
        let replace: Vec<(String, String)> = self
            .dirty
            .iter()
            .filter_map(|name| {
                self.chunks(name)
                    .map(|chunks| (name.clone(), format!("{{{}}}", chunks_to_source(chunks))))
            })
            .collect();
        raw.rewrite(&replace)
    }

    fn with_source(entry: Entry, raw: RawEntry) -> Self {
        Self {
            entry,
            raw: Some(raw),
            dirty: BTreeSet::new(),
        }
    }
}

impl From<Entry> for ReferenceEntry {
    fn from(entry: Entry) -> Self {
        Self {
            entry,
            raw: None,
            dirty: BTreeSet::new(),
        }
    }
}

#[derive(Debug, Clone)]
enum Block {
    Text(String),
    Entry(usize),
}

/// A parsed bibliography file
///
/// Holds the entries in file order together with the text around them, so
/// the file can be written back with only the changed values differing.
#[derive(Debug, Clone)]
pub struct BibFile {
    blocks: Vec<Block>,
    entries: Vec<ReferenceEntry>,
}

impl BibFile {
    /// Parse bibliography source text
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::Parse`] on malformed input. Nothing is
    /// partially returned: a file either parses completely or not at all.
    pub fn parse(src: &str) -> Result<Self, ReconcileError> {
        let bibliography =
            Bibliography::parse(src).map_err(|e| ReconcileError::Parse(e.to_string()))?;
        let mut parsed: Vec<Option<Entry>> = bibliography.into_iter().map(Some).collect();

        let mut blocks = Vec::new();
        let mut entries = Vec::new();
        for segment in source::segments(src) {
            match segment {
                Segment::Text(text) => blocks.push(Block::Text(text)),
                Segment::Entry(raw) => match take_entry(&mut parsed, &raw.key) {
                    Some(entry) => {
                        blocks.push(Block::Entry(entries.len()));
                        entries.push(ReferenceEntry::with_source(entry, raw));
                    }
                    // Dropped by the parser (duplicate key); written back as is
                    None => blocks.push(Block::Text(raw.text)),
                },
            }
        }

        for entry in parsed.into_iter().flatten() {
            tracing::debug!(key = %entry.key, "entry without source span");
            blocks.push(Block::Text("\n".to_string()));
            blocks.push(Block::Entry(entries.len()));
            entries.push(ReferenceEntry::from(entry));
        }

        Ok(Self { blocks, entries })
    }

    /// Read and parse a bibliography file
    pub fn read(path: &Path) -> Result<Self, ReconcileError> {
        let src = fs::read_to_string(path)?;
        Self::parse(&src)
    }

    /// Entries in file order
    pub fn entries(&self) -> &[ReferenceEntry] {
        &self.entries
    }

    /// Entries in file order, for in-place reconciliation
    pub fn entries_mut(&mut self) -> &mut [ReferenceEntry] {
        &mut self.entries
    }

    /// Drop the surrounding text and keep the entries
    pub fn into_entries(self) -> Vec<ReferenceEntry> {
        self.entries
    }

    /// The whole file, including text between entries
    pub fn to_bib_string(&self) -> String {
        self.blocks
            .iter()
            .map(|block| match block {
                Block::Text(text) => text.clone(),
                Block::Entry(i) => self.entries[*i].to_bib_string(),
            })
            .collect()
    }

    /// Write the file, replacing it if it exists
    pub fn write(&self, path: &Path) -> Result<(), ReconcileError> {
        fs::write(path, self.to_bib_string())?;
        Ok(())
    }
}

/// Remove the first parsed entry with this key, preferring an exact match
fn take_entry(parsed: &mut [Option<Entry>], key: &str) -> Option<Entry> {
    let position = parsed
        .iter()
        .position(|e| e.as_ref().is_some_and(|e| e.key == key))
        .or_else(|| {
            parsed
                .iter()
                .position(|e| e.as_ref().is_some_and(|e| e.key.eq_ignore_ascii_case(key)))
        })?;
    parsed[position].take()
}

/// Parse bibliography source text into entries, keeping file order
///
/// # Errors
///
/// Returns [`ReconcileError::Parse`] on malformed input.
pub fn parse_bibliography(src: &str) -> Result<Vec<ReferenceEntry>, ReconcileError> {
    BibFile::parse(src).map(BibFile::into_entries)
}

/// Read and parse a bibliography file
pub fn read_bibliography(path: &Path) -> Result<BibFile, ReconcileError> {
    BibFile::read(path)
}

/// Serialize entries in order, one blank line apart
pub fn serialize_entries(entries: &[ReferenceEntry]) -> String {
    let mut out = entries
        .iter()
        .map(ReferenceEntry::to_bib_string)
        .collect::<Vec<_>>()
        .join("\n");
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

/// Write a bibliography file, replacing it if it exists
pub fn write_bibliography(path: &Path, file: &BibFile) -> Result<(), ReconcileError> {
    file.write(path)
}

fn chunks_to_string(chunks: &[Spanned<Chunk>]) -> String {
    chunks
        .iter()
        .map(|spanned| match &spanned.v {
            Chunk::Normal(s) => s.clone(),
            Chunk::Verbatim(s) => s.clone(),
            Chunk::Math(s) => format!("${}$", s),
        })
        .collect::<Vec<_>>()
        .join("")
}

/// Chunks as BibTeX value text, without the outer braces
fn chunks_to_source(chunks: &[Spanned<Chunk>]) -> String {
    let text: String = chunks
        .iter()
        .map(|spanned| match &spanned.v {
            Chunk::Normal(s) => s.clone(),
            Chunk::Verbatim(s) => format!("{{{}}}", s),
            Chunk::Math(s) => format!("${}$", s),
        })
        .collect();
    if braces_balanced(&text) {
        text
    } else {
        text.replace(['{', '}'], "")
    }
}

fn braces_balanced(text: &str) -> bool {
    let mut depth = 0i32;
    for c in text.chars() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}
