//! Source text positions

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 1-indexed (line, column) point in source text
///
/// Ordering is lexicographic: line first, then column. `Position::UNKNOWN`
/// (`-1, -1`) marks a position that was never set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    line: i32,
    column: i32,
}

impl Position {
    /// The unknown/unset sentinel
    pub const UNKNOWN: Self = Self {
        line: -1,
        column: -1,
    };

    /// Create a new position
    #[must_use]
    pub const fn new(line: i32, column: i32) -> Self {
        Self { line, column }
    }

    /// The 1-indexed line
    #[must_use]
    pub const fn line(&self) -> i32 {
        self.line
    }

    /// The 1-indexed column
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Whether this is a real position rather than the sentinel
    #[must_use]
    pub fn is_known(&self) -> bool {
        *self != Self::UNKNOWN
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::UNKNOWN
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

impl From<(i32, i32)> for Position {
    fn from((line, column): (i32, i32)) -> Self {
        Self::new(line, column)
    }
}
