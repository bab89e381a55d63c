//! Region scanning: locating embedded-language fragments in host documents.
//!
//! The scanner recognizes two shapes of fragment:
//!
//! - **Tagged literals**: a configured tag token immediately followed by the
//!   delimiter character, e.g. ``glsl`...` ``. The fragment runs from just
//!   after the opening delimiter to the next delimiter.
//! - **Whole documents**: a document whose language id is the fragment
//!   language itself contributes a single fragment covering all of its text.
//!
//! The scanner is a single left-to-right pass over the text. It does not
//! parse the host language, so it has no notion of nesting or escaping: any
//! delimiter inside a fragment closes it. That is a documented limitation of
//! the literal syntax, not a bug to work around here.

use serde::{Deserialize, Serialize};

use crate::document::Document;

/// A half-open byte range `[start, end)` within a host document.
///
/// Spans produced by the scanner are non-empty, non-overlapping, sorted
/// ascending by start, and always fall on character boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    /// Byte offset of the first byte inside the fragment.
    pub start: usize,
    /// Byte offset one past the last byte inside the fragment.
    pub end: usize,
}

impl Span {
    /// Create a new span.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Length of the span in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the span covers zero bytes.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Whether `offset` lies strictly inside the span.
    ///
    /// Both boundaries are outside: an offset equal to `start` sits on the
    /// opening delimiter side and an offset equal to `end` sits on the
    /// closing delimiter side, and neither belongs to the fragment for the
    /// purposes of routing editor queries.
    pub fn strictly_contains(&self, offset: usize) -> bool {
        self.start < offset && offset < self.end
    }
}

/// Configuration for the region scanner.
///
/// Arrives from the editor via `initializationOptions`; every field has a
/// default so partial configuration works.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScanConfig {
    /// Tag tokens that introduce a fragment when immediately followed by the
    /// delimiter.
    pub tags: Vec<String>,
    /// The character that opens and closes a tagged literal.
    pub delimiter: char,
    /// Language id whose documents are treated as one whole fragment.
    pub fragment_language_id: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            tags: vec!["glsl".to_string()],
            delimiter: '`',
            fragment_language_id: "glsl".to_string(),
        }
    }
}

/// The scan result for one document: its text and the fragments found in it.
///
/// Rebuilt wholesale on every pass; never updated incrementally.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDocument<'a> {
    /// The document text the spans index into.
    pub source: &'a str,
    /// Fragment spans, ascending by start.
    pub spans: Vec<Span>,
}

/// Locates fragment spans in host documents.
#[derive(Debug, Clone)]
pub struct Scanner {
    config: ScanConfig,
    /// Tags ordered longest first, so the longest match wins at a position.
    ordered_tags: Vec<String>,
}

impl Scanner {
    /// Create a scanner for the given configuration.
    pub fn new(config: ScanConfig) -> Self {
        let mut ordered_tags = config.tags.clone();
        ordered_tags.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        ordered_tags.dedup();
        Self {
            config,
            ordered_tags,
        }
    }

    /// Access the scanner's configuration.
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Scan a document, returning its fragments.
    pub fn parse<'a>(&self, doc: &'a Document) -> ParsedDocument<'a> {
        ParsedDocument {
            source: doc.content(),
            spans: self.scan(doc.language_id(), doc.content()),
        }
    }

    /// Scan `text` for fragment spans.
    ///
    /// In whole-document mode (the language id is the fragment language) the
    /// result is a single span covering the entire text, or nothing for an
    /// empty text. Otherwise the text is scanned for tagged literals.
    pub fn scan(&self, language_id: &str, text: &str) -> Vec<Span> {
        if language_id == self.config.fragment_language_id {
            if text.is_empty() {
                return Vec::new();
            }
            return vec![Span::new(0, text.len())];
        }
        self.scan_tagged(text)
    }

    fn scan_tagged(&self, text: &str) -> Vec<Span> {
        let mut spans = Vec::new();
        let mut pos = 0;

        while pos < text.len() {
            let Some(tag) = self.tag_at(text, pos) else {
                // Not a fragment opener; step over one character.
                let ch_len = text[pos..]
                    .chars()
                    .next()
                    .map(char::len_utf8)
                    .unwrap_or(1);
                pos += ch_len;
                continue;
            };

            let content_start = pos + tag.len() + self.config.delimiter.len_utf8();
            match text[content_start..].find(self.config.delimiter) {
                Some(rel) => {
                    let content_end = content_start + rel;
                    // An immediately closed literal has no content and
                    // produces no span.
                    if content_end > content_start {
                        spans.push(Span::new(content_start, content_end));
                    }
                    pos = content_end + self.config.delimiter.len_utf8();
                }
                None => {
                    // Unterminated literal: everything that follows is
                    // inside it, so the rest of the text yields nothing.
                    pos = text.len();
                }
            }
        }

        spans
    }

    /// The tag opening a fragment at `pos`, if any.
    ///
    /// A tag matches when the text at `pos` starts with it, the delimiter
    /// follows immediately, and (for tags that look like identifiers) the
    /// preceding character cannot extend an identifier. The last rule keeps
    /// ``webglsl`...` `` from matching the tag `glsl` mid-word.
    fn tag_at<'t>(&'t self, text: &str, pos: usize) -> Option<&'t str> {
        let rest = &text[pos..];
        for tag in &self.ordered_tags {
            if tag.is_empty() || !rest.starts_with(tag.as_str()) {
                continue;
            }
            if !rest[tag.len()..].starts_with(self.config.delimiter) {
                continue;
            }
            if tag_starts_like_identifier(tag) {
                let preceded_by_ident = text[..pos]
                    .chars()
                    .next_back()
                    .is_some_and(is_identifier_char);
                if preceded_by_ident {
                    continue;
                }
            }
            return Some(tag.as_str());
        }
        None
    }
}

fn is_identifier_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$'
}

fn tag_starts_like_identifier(tag: &str) -> bool {
    tag.chars().next().is_some_and(is_identifier_char)
}
