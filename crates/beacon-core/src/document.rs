//! Documents held by the in-memory host.
//!
//! `DocumentId` is a newtype around `Uuid`: stable for as long as the
//! document is open and never reused, which is what the layer registry
//! keys on.

use beacon_text::{Position, Range, TextBuffer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use uuid::Uuid;

use crate::host::LayerId;
use crate::CoreResult;

/// Unique identifier for a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Creates a new unique document ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A document: text plus the editor-side state the highlighter touches.
///
/// Besides the buffer and selections, a document stores its marker layers
/// and folds so a caller can inspect what the highlighter did to it.
#[derive(Debug, Clone)]
pub struct Document {
    /// Unique identifier
    id: DocumentId,

    /// Display name
    name: String,

    /// The underlying text buffer
    buffer: TextBuffer,

    /// Current selections; the last one is the most recent
    selections: Vec<Range>,

    /// Marker layers by handle
    layers: BTreeMap<LayerId, Vec<Range>>,

    /// Folded ranges, in the order they were folded
    folds: Vec<Range>,

    /// Number of times a selection flash was requested
    flashes: usize,
}

impl Document {
    /// Creates a document from text.
    pub fn from_text(name: impl Into<String>, text: &str) -> Self {
        Self {
            id: DocumentId::new(),
            name: name.into(),
            buffer: TextBuffer::from(text),
            selections: vec![Range::empty(Position::ZERO)],
            layers: BTreeMap::new(),
            folds: Vec::new(),
            flashes: 0,
        }
    }

    /// Opens a document from a file.
    pub fn from_file(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        let buffer = TextBuffer::from_file(path)?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("Unknown")
            .to_string();

        Ok(Self {
            buffer,
            ..Self::from_text(name, "")
        })
    }

    // ==================== Getters ====================

    /// Returns the document ID.
    pub fn id(&self) -> DocumentId {
        self.id
    }

    /// Returns the display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the text buffer.
    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    /// Returns the selections.
    pub fn selections(&self) -> &[Range] {
        &self.selections
    }

    /// Returns the most recent selection.
    pub fn last_selection(&self) -> Option<Range> {
        self.selections.last().copied()
    }

    /// Returns the text of the most recent selection.
    pub fn selected_text(&self) -> Option<String> {
        let range = self.last_selection()?;
        self.buffer.slice(range).ok()
    }

    /// Returns the folded ranges.
    pub fn folds(&self) -> &[Range] {
        &self.folds
    }

    /// Returns true if `line` is inside a fold.
    pub fn is_line_folded(&self, line: usize) -> bool {
        self.folds.iter().any(|fold| fold.covers_line(line))
    }

    /// Returns how many selection flashes were requested.
    pub fn flashes(&self) -> usize {
        self.flashes
    }

    /// Returns the live layer handles.
    pub fn layer_ids(&self) -> impl Iterator<Item = LayerId> + '_ {
        self.layers.keys().copied()
    }

    /// Returns the markers of a layer, or `None` if the layer does not exist.
    pub fn layer(&self, layer: LayerId) -> Option<&[Range]> {
        self.layers.get(&layer).map(Vec::as_slice)
    }

    // ==================== Mutations ====================

    /// Replaces the selections. An empty list leaves a cursor at the origin.
    pub fn set_selections(&mut self, selections: Vec<Range>) {
        self.selections = if selections.is_empty() {
            vec![Range::empty(Position::ZERO)]
        } else {
            selections
        };
    }

    /// Adds a selection, making it the most recent.
    pub fn add_selection(&mut self, range: Range) {
        self.selections.push(range);
    }

    pub(crate) fn request_flash(&mut self) {
        self.flashes += 1;
    }

    pub(crate) fn insert_layer(&mut self, layer: LayerId) {
        self.layers.insert(layer, Vec::new());
    }

    pub(crate) fn layer_mut(&mut self, layer: LayerId) -> Option<&mut Vec<Range>> {
        self.layers.get_mut(&layer)
    }

    pub(crate) fn remove_layer(&mut self, layer: LayerId) {
        self.layers.remove(&layer);
    }

    pub(crate) fn fold(&mut self, range: Range) {
        self.folds.push(range);
    }

    pub(crate) fn unfold_all(&mut self) {
        self.folds.clear();
    }
}
