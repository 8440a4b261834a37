//! Text ranges.
//!
//! A `Range` is half-open: `start` is inclusive, `end` is exclusive.
//! Ranges order by their start position, which is the order the
//! highlighter keeps marker lists in.

use crate::Position;
use serde::{Deserialize, Serialize};

/// A contiguous span of text between two positions.
///
/// `start` is always before or equal to `end` (normalized).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Range {
    /// Start position (inclusive)
    pub start: Position,
    /// End position (exclusive)
    pub end: Position,
}

impl Range {
    /// Creates a new range.
    ///
    /// Automatically normalizes so start <= end.
    pub fn new(start: Position, end: Position) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// Shorthand for `Range::new` from `(line, column)` pairs.
    pub fn from_coords(start: (usize, usize), end: (usize, usize)) -> Self {
        Self::new(start.into(), end.into())
    }

    /// Creates an empty range at a position.
    pub fn empty(position: Position) -> Self {
        Self {
            start: position,
            end: position,
        }
    }

    /// Returns true if the range covers no text.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns true if the range spans more than one line.
    pub fn is_multiline(&self) -> bool {
        self.start.line != self.end.line
    }

    /// Returns true if a position is within this range.
    pub fn contains(&self, pos: Position) -> bool {
        pos >= self.start && pos < self.end
    }

    /// Returns true if this range overlaps with another.
    pub fn overlaps(&self, other: &Range) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Returns true if `line` falls between the first and last line of the range.
    pub fn covers_line(&self, line: usize) -> bool {
        self.start.line <= line && line <= self.end.line
    }

    /// Returns the number of lines this range touches.
    pub fn line_count(&self) -> usize {
        self.end.line - self.start.line + 1
    }
}

impl PartialOrd for Range {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Range {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.start
            .cmp(&other.start)
            .then_with(|| self.end.cmp(&other.end))
    }
}

impl std::fmt::Display for Range {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}
