use std::sync::Arc;

use tower_lsp::lsp_types::{Position, Range};

use crate::language::ByteRange;

/// Maps byte offsets to LSP positions and back.
///
/// Columns are counted in UTF-16 code units, the LSP default encoding. Guard
/// strings and comments may hold any character.
#[derive(Debug, Clone)]
pub struct LineIndex {
    text: Arc<str>,
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = Vec::with_capacity(128);
        line_starts.push(0);
        for (idx, b) in text.as_bytes().iter().enumerate() {
            if *b == b'\n' {
                line_starts.push(idx + 1);
            }
        }
        Self {
            text: Arc::from(text),
            line_starts,
        }
    }

    pub fn offset_of(&self, position: Position) -> Option<usize> {
        let line = usize::try_from(position.line).ok()?;
        let character = usize::try_from(position.character).ok()?;
        let line_start = *self.line_starts.get(line)?;
        let line_end = self
            .line_starts
            .get(line + 1)
            .copied()
            .unwrap_or(self.text.len());

        let mut units = 0;
        for (idx, c) in self.text[line_start..line_end].char_indices() {
            if units >= character {
                // A position inside a surrogate pair is not a boundary.
                return (units == character).then_some(line_start + idx);
            }
            units += c.len_utf16();
        }
        (units == character).then_some(line_end)
    }

    pub fn position_of(&self, offset: usize) -> Position {
        let mut clamped = offset.min(self.text.len());
        while !self.text.is_char_boundary(clamped) {
            clamped -= 1;
        }
        let line = match self.line_starts.binary_search(&clamped) {
            Ok(idx) => idx,
            Err(idx) => idx.saturating_sub(1),
        };
        let line_start = self.line_starts.get(line).copied().unwrap_or(0);
        let character: usize = self.text[line_start..clamped]
            .chars()
            .map(char::len_utf16)
            .sum();
        Position {
            line: line as u32,
            character: character as u32,
        }
    }

    pub fn range_of(&self, range: ByteRange) -> Range {
        Range {
            start: self.position_of(range.start),
            end: self.position_of(range.end),
        }
    }
}
