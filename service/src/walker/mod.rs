//! Tree builders for the instance document and the schema grammar

pub mod document;
pub mod schema;

pub use document::{DocWalker, ParseFailure};
pub use schema::SchemaWalker;

use crate::encoding::LINE_BREAK;
use schemadiag_core::Position;

/// Maps byte offsets in a text to 1-indexed line/character positions
#[derive(Debug, Clone)]
pub(crate) struct LineIndex<'t> {
    text: &'t str,
    line_starts: Vec<usize>,
}

impl<'t> LineIndex<'t> {
    /// Line breaks are recognized the same way as by
    /// [`split_lines`](crate::encoding::split_lines)
    pub(crate) fn new(text: &'t str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(LINE_BREAK.find_iter(text).map(|found| found.end()))
            .collect();
        Self { text, line_starts }
    }

    /// Position of the character starting at `offset`
    ///
    /// Offsets past the end clamp to the end of the text; offsets inside a
    /// multi-byte character round down to its start.
    pub(crate) fn position(&self, offset: usize) -> Position {
        let mut offset = offset.min(self.text.len());
        while !self.text.is_char_boundary(offset) {
            offset -= 1;
        }
        let line = self.line_starts.partition_point(|start| *start <= offset) - 1;
        let column = self.text[self.line_starts[line]..offset].chars().count() + 1;
        Position::new(to_i32(line + 1), to_i32(column))
    }
}

pub(crate) fn to_i32(value: usize) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
