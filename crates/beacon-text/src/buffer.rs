//! Rope-backed text buffer.
//!
//! The highlighter never edits text itself; it asks line-oriented
//! questions (how long is line 7, what text lies in this range) of
//! documents that may be large. A rope answers those in O(log n) without
//! materializing the whole document.

use ropey::{Rope, RopeSlice};
use std::borrow::Cow;
use std::path::{Path, PathBuf};

use crate::{Position, Range, TextError, TextResult};

/// A text buffer backed by a rope data structure.
#[derive(Debug, Clone)]
pub struct TextBuffer {
    /// The rope holding our text content
    rope: Rope,

    /// Associated file path (if any)
    file_path: Option<PathBuf>,
}

impl TextBuffer {
    /// Creates a new empty buffer.
    ///
    /// # Example
    /// ```
    /// use beacon_text::TextBuffer;
    ///
    /// let buffer = TextBuffer::new();
    /// assert!(buffer.is_empty());
    /// assert_eq!(buffer.len_lines(), 1);
    /// ```
    pub fn new() -> Self {
        Self {
            rope: Rope::new(),
            file_path: None,
        }
    }

    /// Loads a buffer from a file.
    pub fn from_file(path: impl AsRef<Path>) -> TextResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        Ok(Self {
            rope: Rope::from_str(&content),
            file_path: Some(path.to_path_buf()),
        })
    }

    // ==================== Reading ====================

    /// Returns the entire text content.
    #[inline]
    pub fn text(&self) -> Cow<'_, str> {
        self.rope.slice(..).into()
    }

    /// Returns a line (0-indexed) without its trailing line break.
    pub fn line(&self, line_idx: usize) -> TextResult<Cow<'_, str>> {
        let slice = self.line_slice(line_idx)?;
        let len = content_len(slice);
        Ok(slice.slice(..len).into())
    }

    /// Returns the text covered by a range.
    pub fn slice(&self, range: Range) -> TextResult<String> {
        let start = self.position_to_char_idx(range.start)?;
        let end = self.position_to_char_idx(range.end)?;
        Ok(self.rope.slice(start..end).to_string())
    }

    // ==================== Measurements ====================

    /// Returns true if the buffer is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    /// Returns the number of characters in the buffer.
    #[inline]
    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    /// Returns the number of lines in the buffer.
    ///
    /// An empty buffer has 1 line. A buffer ending with `\n` counts
    /// the empty line after it.
    #[inline]
    pub fn len_lines(&self) -> usize {
        self.rope.len_lines()
    }

    /// Returns the length of a line in characters, excluding its line break.
    pub fn line_len(&self, line_idx: usize) -> TextResult<usize> {
        Ok(content_len(self.line_slice(line_idx)?))
    }

    /// Returns the length of every line, in order.
    ///
    /// This is the `line_lengths` input of [`crate::fold::complement`].
    pub fn line_lengths(&self) -> Vec<usize> {
        self.rope.lines().map(content_len).collect()
    }

    /// Returns the position just past the last character.
    pub fn end_position(&self) -> Position {
        let last = self.len_lines() - 1;
        Position::new(last, content_len(self.rope.line(last)))
    }

    // ==================== Position Conversion ====================

    /// Converts a line/column position to a character index.
    pub fn position_to_char_idx(&self, pos: Position) -> TextResult<usize> {
        let out_of_bounds = TextError::PositionOutOfBounds {
            line: pos.line,
            column: pos.column,
        };
        let line = self.line_slice(pos.line).map_err(|_| out_of_bounds)?;
        if pos.column > content_len(line) {
            return Err(TextError::PositionOutOfBounds {
                line: pos.line,
                column: pos.column,
            });
        }
        Ok(self.rope.line_to_char(pos.line) + pos.column)
    }

    /// Converts a character index to a line/column position.
    pub fn char_idx_to_position(&self, char_idx: usize) -> TextResult<Position> {
        if char_idx > self.len_chars() {
            return Err(TextError::InvalidCharIndex(char_idx));
        }
        let line = self.rope.char_to_line(char_idx);
        let column = char_idx - self.rope.line_to_char(line);
        Ok(Position::new(line, column))
    }

    /// Returns the file path, if the buffer was loaded from disk.
    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    fn line_slice(&self, line_idx: usize) -> TextResult<RopeSlice<'_>> {
        if line_idx >= self.len_lines() {
            return Err(TextError::PositionOutOfBounds {
                line: line_idx,
                column: 0,
            });
        }
        Ok(self.rope.line(line_idx))
    }
}

/// Length of a rope line minus its trailing line break (`\n`, `\r\n` or a
/// lone Unicode break).
fn content_len(line: RopeSlice<'_>) -> usize {
    let len = line.len_chars();
    if len == 0 {
        return 0;
    }
    match line.char(len - 1) {
        '\n' if len >= 2 && line.char(len - 2) == '\r' => len - 2,
        '\n' | '\r' | '\u{000B}' | '\u{000C}' | '\u{0085}' | '\u{2028}' | '\u{2029}' => len - 1,
        _ => len,
    }
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for TextBuffer {
    fn from(s: &str) -> Self {
        Self {
            rope: Rope::from_str(s),
            file_path: None,
        }
    }
}

impl From<String> for TextBuffer {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}
