//! Deciding what to highlight.
//!
//! A [`SearchEngine`] looks at the active document's selection and returns
//! the ranges to mark, per document. It never touches layers or events;
//! the selection manager applies the outcome.

use beacon_text::{find_occurrences, MatchOptions, Range, TextBuffer};

use crate::config::HighlightConfig;
use crate::document::DocumentId;
use crate::host::DocumentHost;

/// Ranges to mark in one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentHighlights {
    pub document: DocumentId,
    /// Marked in the visible layer
    pub visible: Vec<Range>,
    /// Marked in the selected layer
    pub selected: Vec<Range>,
}

impl DocumentHighlights {
    /// Total number of ranges.
    pub fn len(&self) -> usize {
        self.visible.len() + self.selected.len()
    }

    /// Returns true if there is nothing to mark.
    pub fn is_empty(&self) -> bool {
        self.visible.is_empty() && self.selected.is_empty()
    }
}

/// Result of one search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchOutcome {
    pub documents: Vec<DocumentHighlights>,
}

impl SearchOutcome {
    /// Total number of ranges across documents.
    pub fn match_count(&self) -> usize {
        self.documents.iter().map(DocumentHighlights::len).sum()
    }
}

/// Computes highlights from the active selection.
pub trait SearchEngine {
    /// Returns what to highlight for `active`'s current selection, or
    /// `None` when the selection should not be highlighted at all.
    fn search(
        &mut self,
        host: &dyn DocumentHost,
        active: DocumentId,
        config: &HighlightConfig,
    ) -> Option<SearchOutcome>;
}

/// Highlights every occurrence of the selected word.
///
/// The most recent selection of the active document is the needle. It is
/// ignored when it is empty, spans lines, contains whitespace, or is
/// shorter than `minimum_length` characters.
#[derive(Debug, Default)]
pub struct OccurrenceSearch;

impl OccurrenceSearch {
    pub fn new() -> Self {
        Self
    }

    fn needle(host: &dyn DocumentHost, active: DocumentId, config: &HighlightConfig) -> Option<String> {
        let selection = host.selections(active).last().copied()?;
        if selection.is_empty() || selection.is_multiline() {
            return None;
        }
        let text = host.text_in_range(active, selection)?;
        if text.chars().any(char::is_whitespace) || text.chars().count() < config.minimum_length {
            return None;
        }
        Some(text)
    }
}

impl SearchEngine for OccurrenceSearch {
    fn search(
        &mut self,
        host: &dyn DocumentHost,
        active: DocumentId,
        config: &HighlightConfig,
    ) -> Option<SearchOutcome> {
        let needle = Self::needle(host, active, config)?;
        let options = MatchOptions {
            ignore_case: config.ignore_case,
            whole_words: config.only_whole_words,
        };

        let targets = if config.highlight_in_panes {
            host.visible_documents()
        } else {
            vec![active]
        };
        // Only the originating document's selections move matches to the
        // selected layer.
        let selections = host.selections(active);

        let mut outcome = SearchOutcome::default();
        for document in targets {
            let Some(buffer) = host.text(document).map(TextBuffer::from) else {
                continue;
            };

            let mut highlights = DocumentHighlights {
                document,
                ..DocumentHighlights::default()
            };
            for range in find_occurrences(&buffer, &needle, options) {
                let is_selection = document == active && selections.contains(&range);
                if config.hide_highlight_on_selected_word && is_selection {
                    highlights.selected.push(range);
                } else {
                    highlights.visible.push(range);
                }
            }
            tracing::trace!(%document, matches = highlights.len(), "searched document");
            outcome.documents.push(highlights);
        }
        Some(outcome)
    }
}
