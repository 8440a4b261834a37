//! In-memory host.
//!
//! `Workspace` keeps documents and panes in plain collections and
//! implements [`Host`](crate::host::Host) over them. It backs the CLI and
//! the tests. It does not emit [`HostEvent`](crate::host::HostEvent)s on
//! its own: whoever mutates it reports the change to the manager.

use beacon_text::Range;
use std::collections::HashMap;
use std::path::Path;

use crate::document::{Document, DocumentId};
use crate::host::{DocumentHost, FoldHost, LayerId, PaneItem, SelectionHost};
use crate::{CoreError, CoreResult};

/// Open documents and the panes showing them.
#[derive(Debug)]
pub struct Workspace {
    /// All open documents
    documents: HashMap<DocumentId, Document>,

    /// Order documents were opened in
    order: Vec<DocumentId>,

    /// Active item of each pane (`None` for an empty pane)
    panes: Vec<Option<PaneItem>>,

    /// Index of the focused pane
    active_pane: usize,

    /// Next layer handle to hand out
    next_layer: u64,
}

impl Workspace {
    /// Creates a workspace with a single empty pane.
    pub fn new() -> Self {
        Self {
            documents: HashMap::new(),
            order: Vec::new(),
            panes: vec![None],
            active_pane: 0,
            next_layer: 1,
        }
    }

    // ==================== Documents ====================

    /// Opens a document from text and shows it in the focused pane.
    pub fn open(&mut self, name: impl Into<String>, text: &str) -> DocumentId {
        self.add(Document::from_text(name, text))
    }

    /// Opens a file and shows it in the focused pane.
    pub fn open_file(&mut self, path: impl AsRef<Path>) -> CoreResult<DocumentId> {
        let doc = Document::from_file(path)?;
        Ok(self.add(doc))
    }

    fn add(&mut self, doc: Document) -> DocumentId {
        let id = doc.id();
        self.documents.insert(id, doc);
        self.order.push(id);
        self.panes[self.active_pane] = Some(PaneItem::Document(id));
        id
    }

    /// Closes a document. Panes showing it fall back to the most recently
    /// opened remaining document.
    pub fn close(&mut self, id: DocumentId) -> CoreResult<()> {
        if self.documents.remove(&id).is_none() {
            return Err(CoreError::DocumentNotFound(id));
        }
        self.order.retain(|&i| i != id);

        let fallback = self.order.last().copied().map(PaneItem::Document);
        for item in &mut self.panes {
            if item.as_ref().and_then(PaneItem::document) == Some(id) {
                *item = fallback.clone();
            }
        }
        Ok(())
    }

    /// Shows a document in the focused pane.
    pub fn activate(&mut self, id: DocumentId) -> CoreResult<()> {
        if !self.documents.contains_key(&id) {
            return Err(CoreError::DocumentNotFound(id));
        }
        self.panes[self.active_pane] = Some(PaneItem::Document(id));
        Ok(())
    }

    /// Shows a non-document item in the focused pane.
    pub fn show_other(&mut self, kind: impl Into<String>) {
        self.panes[self.active_pane] = Some(PaneItem::Other(kind.into()));
    }

    /// Opens a new pane showing `id` and focuses it. Returns the pane index.
    pub fn split(&mut self, id: DocumentId) -> CoreResult<usize> {
        if !self.documents.contains_key(&id) {
            return Err(CoreError::DocumentNotFound(id));
        }
        self.panes.push(Some(PaneItem::Document(id)));
        self.active_pane = self.panes.len() - 1;
        Ok(self.active_pane)
    }

    /// Focuses a pane. Out-of-range indices are ignored.
    pub fn focus_pane(&mut self, index: usize) {
        if index < self.panes.len() {
            self.active_pane = index;
        }
    }

    /// Returns the focused pane's item.
    pub fn active_item(&self) -> Option<&PaneItem> {
        self.panes[self.active_pane].as_ref()
    }

    /// Returns a document by ID.
    pub fn document(&self, id: DocumentId) -> Option<&Document> {
        self.documents.get(&id)
    }

    /// Returns a mutable document by ID.
    pub fn document_mut(&mut self, id: DocumentId) -> CoreResult<&mut Document> {
        self.documents
            .get_mut(&id)
            .ok_or(CoreError::DocumentNotFound(id))
    }

    /// Replaces a document's selections.
    pub fn set_selections(&mut self, id: DocumentId, selections: Vec<Range>) -> CoreResult<()> {
        self.document_mut(id)?.set_selections(selections);
        Ok(())
    }

    /// Returns the number of open documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Returns true if no documents are open.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentHost for Workspace {
    fn active_document(&self) -> Option<DocumentId> {
        self.active_item().and_then(PaneItem::document)
    }

    fn open_documents(&self) -> Vec<DocumentId> {
        self.order.clone()
    }

    fn visible_documents(&self) -> Vec<DocumentId> {
        let mut visible = Vec::new();
        for id in self.panes.iter().flatten().filter_map(PaneItem::document) {
            if !visible.contains(&id) {
                visible.push(id);
            }
        }
        visible
    }

    fn line_lengths(&self, document: DocumentId) -> Vec<usize> {
        self.documents
            .get(&document)
            .map(|doc| doc.buffer().line_lengths())
            .unwrap_or_default()
    }

    fn selections(&self, document: DocumentId) -> Vec<Range> {
        self.documents
            .get(&document)
            .map(|doc| doc.selections().to_vec())
            .unwrap_or_default()
    }

    fn text(&self, document: DocumentId) -> Option<String> {
        self.documents
            .get(&document)
            .map(|doc| doc.buffer().text().into_owned())
    }

    fn text_in_range(&self, document: DocumentId, range: Range) -> Option<String> {
        self.documents.get(&document)?.buffer().slice(range).ok()
    }

    fn create_layer(&mut self, document: DocumentId) -> LayerId {
        let layer = LayerId::new(self.next_layer);
        self.next_layer += 1;
        if let Some(doc) = self.documents.get_mut(&document) {
            doc.insert_layer(layer);
        }
        layer
    }

    fn clear_layer(&mut self, document: DocumentId, layer: LayerId) {
        if let Some(markers) = self
            .documents
            .get_mut(&document)
            .and_then(|doc| doc.layer_mut(layer))
        {
            markers.clear();
        }
    }

    fn destroy_layer(&mut self, document: DocumentId, layer: LayerId) {
        if let Some(doc) = self.documents.get_mut(&document) {
            doc.remove_layer(layer);
        }
    }

    fn add_marker(&mut self, document: DocumentId, layer: LayerId, range: Range) {
        if let Some(markers) = self
            .documents
            .get_mut(&document)
            .and_then(|doc| doc.layer_mut(layer))
        {
            // Kept sorted, like a host marker index.
            let at = markers.partition_point(|m| *m <= range);
            markers.insert(at, range);
        }
    }

    fn markers(&self, document: DocumentId, layer: LayerId) -> Vec<Range> {
        self.documents
            .get(&document)
            .and_then(|doc| doc.layer(layer))
            .map(<[Range]>::to_vec)
            .unwrap_or_default()
    }
}

impl FoldHost for Workspace {
    fn fold(&mut self, document: DocumentId, range: Range) {
        if let Some(doc) = self.documents.get_mut(&document) {
            doc.fold(range);
        }
    }

    fn unfold_all(&mut self, document: DocumentId) {
        if let Some(doc) = self.documents.get_mut(&document) {
            doc.unfold_all();
        }
    }
}

impl SelectionHost for Workspace {
    fn set_selected_ranges(&mut self, document: DocumentId, ranges: &[Range], flash: bool) {
        if let Some(doc) = self.documents.get_mut(&document) {
            doc.set_selections(ranges.to_vec());
            if flash {
                doc.request_flash();
            }
        }
    }
}
