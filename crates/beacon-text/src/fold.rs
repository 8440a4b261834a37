//! Fold complements.
//!
//! Given the highlighted ranges of a document, [`complement`] computes the
//! line spans that lie *between* and *around* them. Folding each of those
//! spans leaves only the highlighted lines on screen; unfolding them
//! restores the document.
//!
//! ```text
//!   line 0  ████ highlighted
//!   line 1  ░░░░ ┐ gap      -> folded
//!   line 2  ████ highlighted
//!   line 3  ░░░░ ┐ trailing -> folded
//! ```
//!
//! Work is done in whole lines: a gap always starts at column 0 and ends at
//! the end of its last line.

use crate::{Position, Range};

/// Computes the ranges not covered by `ranges`, line by line.
///
/// `ranges` must be sorted by start position and must not overlap.
/// `line_lengths[i]` is the length of line `i` and must cover every line of
/// the document. Input that breaks these rules yields unspecified (but
/// non-panicking for in-bounds rows) output.
///
/// Returns an empty list when `ranges` or `line_lengths` is empty.
///
/// # Example
/// ```
/// use beacon_text::{complement, Range};
///
/// let highlighted = [
///     Range::from_coords((0, 0), (0, 4)),
///     Range::from_coords((2, 0), (2, 3)),
/// ];
/// let folds = complement(&highlighted, &[5, 0, 3, 6]);
/// assert_eq!(
///     folds,
///     vec![
///         Range::from_coords((1, 0), (1, 0)),
///         Range::from_coords((3, 0), (3, 6)),
///     ]
/// );
/// ```
pub fn complement(ranges: &[Range], line_lengths: &[usize]) -> Vec<Range> {
    let (Some(first), Some(last)) = (ranges.first(), ranges.last()) else {
        return Vec::new();
    };
    let Some(last_line) = line_lengths.len().checked_sub(1) else {
        return Vec::new();
    };
    let line_end = |line: usize| Position::new(line, line_lengths.get(line).copied().unwrap_or(0));

    let mut gaps = Vec::new();

    if first.start.line > 0 {
        gaps.push(Range::new(Position::ZERO, line_end(first.start.line - 1)));
    }

    for pair in ranges.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        let gap_start = prev.end.line + 1;
        // Ranges on adjacent or shared lines leave no whole line to fold.
        if next.start.line >= 1 && gap_start <= next.start.line - 1 {
            gaps.push(Range::new(
                Position::new(gap_start, 0),
                line_end(next.start.line - 1),
            ));
        }
    }

    if last.end.line < last_line {
        gaps.push(Range::new(
            Position::new(last.end.line + 1, 0),
            line_end(last_line),
        ));
    }

    gaps
}
