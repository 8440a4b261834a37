//! Interfaces to the editor hosting the highlighter.
//!
//! The highlighter owns no text, no rendering and no folding. It is handed
//! a host at construction and asks it for those through the traits below.
//! Notifications flow the other way as [`HostEvent`] values.

use beacon_text::Range;

use crate::document::DocumentId;

/// Opaque handle to a host-managed marker layer.
///
/// The registry owns the handle; the host owns the markers behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(u64);

impl LayerId {
    /// Wraps a host-side layer number.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "layer#{}", self.0)
    }
}

/// An item shown in a pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaneItem {
    /// An editable text document
    Document(DocumentId),
    /// Anything else (settings views, images, ...), named by kind
    Other(String),
}

impl PaneItem {
    /// Returns the document id if this item is a document.
    pub fn document(&self) -> Option<DocumentId> {
        match self {
            PaneItem::Document(id) => Some(*id),
            PaneItem::Other(_) => None,
        }
    }
}

/// Notifications delivered by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// A document became known to the host (opened, or already open at startup)
    DocumentObserved(DocumentId),
    /// A pane item is about to close
    ItemWillClose(PaneItem),
    /// The active pane item changed (`None` when nothing is focused)
    ActiveItemChanged(Option<PaneItem>),
    /// A selection was added to a document
    SelectionAdded(DocumentId),
    /// A selection's range changed in a document
    SelectionRangeChanged(DocumentId),
}

/// Document queries and marker-layer primitives.
pub trait DocumentHost {
    /// The document in the active pane item, if it is a document.
    fn active_document(&self) -> Option<DocumentId>;

    /// Every open document.
    fn open_documents(&self) -> Vec<DocumentId>;

    /// Documents currently shown as the active item of some pane.
    fn visible_documents(&self) -> Vec<DocumentId>;

    /// Length of every line of a document, excluding line breaks.
    ///
    /// Empty for unknown documents.
    fn line_lengths(&self, document: DocumentId) -> Vec<usize>;

    /// The document's selections; the last one is the most recent.
    fn selections(&self, document: DocumentId) -> Vec<Range>;

    /// Full text of a document.
    fn text(&self, document: DocumentId) -> Option<String>;

    /// Text covered by `range`, if the document and range are valid.
    fn text_in_range(&self, document: DocumentId, range: Range) -> Option<String>;

    /// Allocates an empty marker layer for a document.
    fn create_layer(&mut self, document: DocumentId) -> LayerId;

    /// Removes every marker from a layer, keeping the layer.
    fn clear_layer(&mut self, document: DocumentId, layer: LayerId);

    /// Releases a layer.
    fn destroy_layer(&mut self, document: DocumentId, layer: LayerId);

    /// Marks a range in a layer.
    fn add_marker(&mut self, document: DocumentId, layer: LayerId, range: Range);

    /// Ranges of every marker in a layer, in the host's iteration order.
    fn markers(&self, document: DocumentId, layer: LayerId) -> Vec<Range>;
}

/// Folding primitives.
pub trait FoldHost {
    /// Collapses a range from view.
    fn fold(&mut self, document: DocumentId, range: Range);

    /// Expands every fold in a document.
    fn unfold_all(&mut self, document: DocumentId);
}

/// Selection replacement.
pub trait SelectionHost {
    /// Replaces the document's selections, optionally flashing them.
    fn set_selected_ranges(&mut self, document: DocumentId, ranges: &[Range], flash: bool);
}

/// Everything the selection manager needs from its host.
pub trait Host: DocumentHost + FoldHost + SelectionHost {}

impl<T: DocumentHost + FoldHost + SelectionHost> Host for T {}
