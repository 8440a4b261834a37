//! # Beacon Text
//!
//! Text primitives shared by the highlight engine.
//!
//! ## Key Concepts
//!
//! - `Position` / `Range` are line/column coordinates (0-indexed, columns
//!   counted in characters).
//! - `TextBuffer` wraps a rope and answers the line-oriented questions the
//!   highlighter asks: line lengths, line text, text of a range.
//! - `fold::complement` turns a sorted list of highlighted ranges into the
//!   regions between them, which is what gets folded away.
//! - `search::find_occurrences` locates every occurrence of a needle in a
//!   buffer.

mod buffer;
pub mod fold;
mod position;
mod range;
pub mod search;

pub use buffer::TextBuffer;
pub use fold::complement;
pub use position::Position;
pub use range::Range;
pub use search::{find_occurrences, MatchOptions};

/// Result type for text operations
pub type TextResult<T> = Result<T, TextError>;

/// Errors that can occur during text operations
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    #[error("Position {line}:{column} is out of bounds")]
    PositionOutOfBounds { line: usize, column: usize },

    #[error("Invalid character index: {0}")]
    InvalidCharIndex(usize),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
