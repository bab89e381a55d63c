//! Byte offset to line/character conversion.
//!
//! Span arithmetic in this crate is byte-based, while editor positions are
//! zero-based line plus UTF-16 character. This module bridges the two with a
//! one-pass line-start index and binary search lookups.

use crate::types::Position;

/// Line-start index over a text, enabling fast offset/position conversion.
///
/// The index stores byte offsets only; every lookup takes the text it was
/// built from, which must be the identical string. `\n`, `\r\n`, and a lone
/// `\r` all terminate a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    /// Byte offset where each line starts. Line 0 starts at offset 0.
    line_starts: Vec<usize>,
    /// Total length of the text in bytes.
    total_length: usize,
}

impl LineIndex {
    /// Build the index by scanning the content once.
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        let bytes = text.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\n' => line_starts.push(i + 1),
                // A lone \r terminates a line; \r\n is handled by the \n arm.
                b'\r' if bytes.get(i + 1) != Some(&b'\n') => line_starts.push(i + 1),
                _ => {}
            }
            i += 1;
        }
        LineIndex {
            line_starts,
            total_length: text.len(),
        }
    }

    /// Get the number of lines in the text.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Get the total length of the text in bytes.
    pub fn total_length(&self) -> usize {
        self.total_length
    }

    /// Convert a byte offset to a position.
    ///
    /// Returns `None` if the offset is out of bounds or does not fall on a
    /// character boundary. An offset equal to the text length maps to the
    /// position just past the final character.
    pub fn position(&self, text: &str, offset: usize) -> Option<Position> {
        if offset > self.total_length {
            return None;
        }

        // partition_point finds the first line starting after the offset;
        // the offset's line is the one before it.
        let line = self.line_starts.partition_point(|&start| start <= offset) - 1;
        let line_start = self.line_starts[line];

        let prefix = text.get(line_start..offset)?;
        let character: usize = prefix.chars().map(char::len_utf16).sum();

        Some(Position::new(line as u32, character as u32))
    }

    /// Convert a position to a byte offset.
    ///
    /// Returns `None` if the line is out of bounds. A character offset past
    /// the end of the line clamps to the line end, per the LSP position
    /// rules. A character landing inside a surrogate pair snaps back to the
    /// start of that character.
    pub fn offset(&self, text: &str, pos: Position) -> Option<usize> {
        let line = pos.line as usize;
        if line >= self.line_starts.len() {
            return None;
        }
        let line_start = self.line_starts[line];
        let line_end = self
            .line_starts
            .get(line + 1)
            .copied()
            .unwrap_or(self.total_length);

        let target = pos.character as usize;
        let mut units = 0;
        for (idx, ch) in text[line_start..line_end].char_indices() {
            if ch == '\n' || ch == '\r' {
                return Some(line_start + idx);
            }
            let width = ch.len_utf16();
            if units + width > target {
                return Some(line_start + idx);
            }
            units += width;
        }
        Some(line_end)
    }
}
