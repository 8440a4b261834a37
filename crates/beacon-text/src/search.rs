//! Occurrence search.
//!
//! Finds every occurrence of a single-line needle in a buffer. Matching is
//! done per line on characters, so ranges come out in line/column
//! coordinates without byte bookkeeping by the caller.

use std::collections::HashSet;

use unicode_segmentation::UnicodeSegmentation;

use crate::{Position, Range, TextBuffer};

/// How a needle is matched against text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatchOptions {
    /// Compare characters case-insensitively.
    pub ignore_case: bool,
    /// Only accept matches that start and end on a word boundary.
    pub whole_words: bool,
}

/// Returns the range of every non-overlapping occurrence of `needle`,
/// in document order.
///
/// Needles containing a line break never match; an empty needle matches
/// nothing.
pub fn find_occurrences(buffer: &TextBuffer, needle: &str, options: MatchOptions) -> Vec<Range> {
    if needle.is_empty() || needle.contains(['\n', '\r']) {
        return Vec::new();
    }
    let needle: Vec<char> = needle.chars().collect();

    let mut found = Vec::new();
    for line_idx in 0..buffer.len_lines() {
        let Ok(line) = buffer.line(line_idx) else {
            continue;
        };
        for (start, end) in find_in_line(&line, &needle, options) {
            found.push(Range::new(
                Position::new(line_idx, start),
                Position::new(line_idx, end),
            ));
        }
    }
    found
}

/// Column spans (in chars) of the matches of `needle` within `line`.
fn find_in_line(line: &str, needle: &[char], options: MatchOptions) -> Vec<(usize, usize)> {
    let chars: Vec<(usize, char)> = line.char_indices().collect();
    if chars.len() < needle.len() {
        return Vec::new();
    }

    let boundaries: HashSet<usize> = if options.whole_words {
        line.split_word_bound_indices()
            .map(|(byte, _)| byte)
            .chain(std::iter::once(line.len()))
            .collect()
    } else {
        HashSet::new()
    };
    let byte_at = |char_idx: usize| chars.get(char_idx).map_or(line.len(), |&(byte, _)| byte);

    let mut spans = Vec::new();
    let mut col = 0;
    while col + needle.len() <= chars.len() {
        let matched = chars[col..col + needle.len()]
            .iter()
            .zip(needle)
            .all(|(&(_, c), &n)| chars_equal(c, n, options.ignore_case));

        let accepted = matched
            && (!options.whole_words
                || (boundaries.contains(&byte_at(col))
                    && boundaries.contains(&byte_at(col + needle.len()))));

        if accepted {
            spans.push((col, col + needle.len()));
            col += needle.len();
        } else {
            col += 1;
        }
    }
    spans
}

fn chars_equal(a: char, b: char, ignore_case: bool) -> bool {
    a == b || (ignore_case && a.to_lowercase().eq(b.to_lowercase()))
}
