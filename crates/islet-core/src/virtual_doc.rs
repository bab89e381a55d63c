//! Virtual document construction: projecting one fragment out of its host.
//!
//! A virtual document is the host text with everything outside the fragment
//! masked to whitespace. Line breaks survive masking and the byte length is
//! unchanged, so byte offsets and line numbers over the projection are
//! directly valid in the host document. UTF-16 columns are not, quite: a
//! masked character widens to one space per byte, so on a fragment's opening
//! line the projection's columns can run ahead of the host's wherever the
//! prefix holds multi-byte characters. [`ColumnShift`] measures that
//! difference so positions can be translated across the compiler seam.

use crate::line_index::LineIndex;
use crate::scan::Span;
use crate::types::{Position, Range};

/// Build the virtual document for `span` within `text`.
///
/// Characters inside the span are copied verbatim. Characters outside are
/// replaced by spaces, one per byte, except `\n` and `\r` which pass through
/// so that line numbering is preserved. The result always has exactly the
/// same byte length as the input.
///
/// Unicode line separators other than `\n`/`\r` are masked like any other
/// character; the projection only guarantees line fidelity for the line
/// breaks the scanner's host languages actually use.
pub fn virtual_document(text: &str, span: Span) -> String {
    let mut out = String::with_capacity(text.len());
    for (idx, ch) in text.char_indices() {
        if idx >= span.start && idx < span.end {
            out.push(ch);
        } else if ch == '\n' || ch == '\r' {
            out.push(ch);
        } else {
            // One space per byte keeps every byte offset stable, including
            // offsets beyond masked multi-byte characters.
            for _ in 0..ch.len_utf8() {
                out.push(' ');
            }
        }
    }
    out
}

/// UTF-16 column correction for a fragment's opening line.
///
/// The mask preserves byte offsets, not UTF-16 columns: a multi-byte
/// character before the fragment on its opening line becomes several
/// one-column spaces, so a compiler counting UTF-16 columns over the
/// projection reports columns past the host's on that line. Every other
/// line agrees already: interior lines are verbatim, and on a closing line
/// the fragment text starts at column zero.
///
/// The default value is the identity correction.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ColumnShift {
    /// Host line on which the fragment opens.
    line: u32,
    /// UTF-16 column of the fragment's first character in the host text.
    host_column: u32,
    /// UTF-16 column of that same character over the projection, where
    /// every masked prefix byte is one space.
    projected_column: u32,
}

impl ColumnShift {
    /// Measure the correction for `span` within `text`.
    pub fn measure(text: &str, span: Span, lines: &LineIndex) -> Self {
        let Some(start) = lines.position(text, span.start) else {
            return Self::default();
        };
        let line_start = text[..span.start].rfind(['\n', '\r']).map_or(0, |i| i + 1);
        Self {
            line: start.line,
            host_column: start.character,
            projected_column: (span.start - line_start) as u32,
        }
    }

    /// Map a host-document position onto the projection.
    pub fn to_projection(&self, pos: Position) -> Position {
        if pos.line == self.line && pos.character >= self.host_column {
            let delta = self.projected_column - self.host_column;
            Position::new(pos.line, pos.character + delta)
        } else {
            pos
        }
    }

    /// Map a position reported over the projection back onto the host.
    ///
    /// Positions inside the masked prefix have no exact host counterpart
    /// and clamp to the end of the host prefix.
    pub fn to_host(&self, pos: Position) -> Position {
        if pos.line != self.line {
            return pos;
        }
        if pos.character >= self.projected_column {
            let delta = self.projected_column - self.host_column;
            Position::new(pos.line, pos.character - delta)
        } else {
            Position::new(pos.line, pos.character.min(self.host_column))
        }
    }

    /// Map a range reported over the projection back onto the host.
    pub fn range_to_host(&self, range: Range) -> Range {
        Range::new(self.to_host(range.start), self.to_host(range.end))
    }
}
