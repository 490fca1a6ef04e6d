//! Source spans of a bibliography file
//!
//! The file is split into entry blocks and everything between them.
//! `@comment`, `@string` and `@preamble` blocks, and free text outside any
//! block, are kept as opaque text. Each entry block remembers where its
//! field values sit, so a writer can replace single values in place.

use std::ops::Range;

/// Top-level piece of a bibliography file
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Segment {
    /// Text written back verbatim
    Text(String),

    /// An `@type{key, ...}` entry
    Entry(RawEntry),
}

/// Split source text into segments, in file order
///
/// Concatenating the segments' text reproduces `src` exactly.
pub(crate) fn segments(src: &str) -> Vec<Segment> {
    let bytes = src.as_bytes();
    let mut out = Vec::new();
    let mut text_start = 0;
    let mut pos = 0;

    while let Some(offset) = src[pos..].find('@') {
        let at = pos + offset;
        let Some((kind, open)) = block_header(src, at) else {
            pos = at + 1;
            continue;
        };
        let close_char = if bytes[open] == b'(' { b')' } else { b'}' };
        let Some(close) = find_close(bytes, open + 1, close_char) else {
            // Unterminated block: the parser has already rejected the file
            break;
        };

        if !is_opaque(kind) {
            if text_start < at {
                out.push(Segment::Text(src[text_start..at].to_string()));
            }
            out.push(Segment::Entry(RawEntry::scan(&src[at..=close])));
            text_start = close + 1;
        }
        pos = close + 1;
    }

    if text_start < src.len() {
        out.push(Segment::Text(src[text_start..].to_string()));
    }
    out
}

fn is_opaque(kind: &str) -> bool {
    ["comment", "string", "preamble"]
        .iter()
        .any(|k| kind.eq_ignore_ascii_case(k))
}

/// Block kind and the index of its opening delimiter
fn block_header(src: &str, at: usize) -> Option<(&str, usize)> {
    let bytes = src.as_bytes();
    let mut pos = skip_whitespace(bytes, at + 1);
    let kind_start = pos;
    while pos < bytes.len() && (bytes[pos].is_ascii_alphanumeric() || bytes[pos] == b'_') {
        pos += 1;
    }
    if pos == kind_start {
        return None;
    }
    let kind = &src[kind_start..pos];
    let open = skip_whitespace(bytes, pos);
    match bytes.get(open) {
        Some(b'{') | Some(b'(') => Some((kind, open)),
        _ => None,
    }
}

/// Index of the delimiter closing a block whose body starts at `start`
fn find_close(bytes: &[u8], start: usize, close: u8) -> Option<usize> {
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate().skip(start) {
        match b {
            b'{' => depth += 1,
            b'}' if depth > 0 => depth -= 1,
            _ if b == close && depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

fn skip_whitespace(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }
    pos
}

/// One field as written in the source
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawField {
    /// Lowercased field name
    pub name: String,

    /// Byte range of the value, delimiters included
    pub value: Range<usize>,
}

/// Source text of one entry plus the positions of its values
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawEntry {
    /// `@type{ ... }` exactly as written
    pub text: String,

    /// Citation key as written
    pub key: String,

    /// Fields in source order
    pub fields: Vec<RawField>,

    /// Where new fields go: just past the last value, or past its comma
    pub insert_at: usize,

    /// Whether the last value is followed by a comma
    pub trailing_comma: bool,

    /// Whitespace written before each field name
    pub separator: String,
}

impl RawEntry {
    /// Locate key and field values in `text` (`@type{...}` or `@type(...)`)
    pub fn scan(text: &str) -> Self {
        let bytes = text.as_bytes();
        let open = text.find(['{', '(']).unwrap_or(0);
        let close = text.len().saturating_sub(1).max(open);

        let key_end = text[open + 1..close]
            .find(',')
            .map(|i| open + 1 + i)
            .unwrap_or(close);
        let key = text[open + 1..key_end].trim().to_string();

        let mut fields = Vec::new();
        let mut separator = None;
        let mut anchor = trim_end(bytes, open + 1, key_end);
        let mut pos = key_end;

        while pos < close {
            if bytes[pos] == b',' || bytes[pos].is_ascii_whitespace() {
                pos += 1;
                continue;
            }
            let name_start = pos;
            while pos < close && bytes[pos] != b'=' && bytes[pos] != b',' {
                pos += 1;
            }
            if pos >= close || bytes[pos] != b'=' {
                break;
            }
            let name = text[name_start..pos].trim().to_ascii_lowercase();
            if separator.is_none() {
                separator = Some(separator_before(text, key_end + 1, name_start));
            }

            let value_start = skip_whitespace(bytes, pos + 1);
            let value_end = value_end(bytes, value_start, close);
            let value = value_start..trim_end(bytes, value_start, value_end);
            anchor = value.end;
            fields.push(RawField { name, value });
            pos = value_end;
        }

        let after = skip_whitespace(bytes, anchor);
        let trailing_comma = after < close && bytes[after] == b',';
        let insert_at = if trailing_comma { after + 1 } else { anchor };

        Self {
            text: text.to_string(),
            key,
            fields,
            insert_at,
            trailing_comma,
            separator: separator.unwrap_or_else(|| "\n  ".to_string()),
        }
    }

    /// First field with this (lowercased) name
    pub fn field(&self, name: &str) -> Option<&RawField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Source text with some values replaced and new fields appended
    ///
    /// `replace` holds `(name, value)` pairs; values are written as given,
    /// delimiters included.
    pub fn rewrite(&self, replace: &[(String, String)]) -> String {
        let mut edits: Vec<(Range<usize>, String)> = Vec::new();
        let mut appended = String::new();

        for (name, value) in replace {
            match self.field(name) {
                Some(field) => edits.push((field.value.clone(), value.clone())),
                None if self.trailing_comma => {
                    appended.push_str(&format!("{}{} = {},", self.separator, name, value));
                }
                None => appended.push_str(&format!(",{}{} = {}", self.separator, name, value)),
            }
        }
        if !appended.is_empty() {
            edits.push((self.insert_at..self.insert_at, appended));
        }

        edits.sort_by(|a, b| b.0.start.cmp(&a.0.start));
        let mut text = self.text.clone();
        for (range, value) in edits {
            text.replace_range(range, &value);
        }
        text
    }
}

/// End of a value starting at `start`: the next comma outside braces and quotes
fn value_end(bytes: &[u8], start: usize, close: usize) -> usize {
    let mut depth = 0usize;
    let mut quoted = false;
    let mut pos = start;
    while pos < close {
        match bytes[pos] {
            b'{' => depth += 1,
            b'}' => depth = depth.saturating_sub(1),
            b'"' if depth == 0 => quoted = !quoted,
            b',' if depth == 0 && !quoted => break,
            _ => {}
        }
        pos += 1;
    }
    pos
}

fn trim_end(bytes: &[u8], start: usize, mut end: usize) -> usize {
    while end > start && bytes[end - 1].is_ascii_whitespace() {
        end -= 1;
    }
    end
}

/// The whitespace run directly before the first field name
fn separator_before(text: &str, start: usize, name_start: usize) -> String {
    let gap = &text[start.min(name_start)..name_start];
    match gap.rfind('\n') {
        Some(i) => format!("\n{}", &gap[i + 1..]),
        None => " ".to_string(),
    }
}
