//! Marker-layer registry.
//!
//! Every observed document gets a pair of host layers: `visible` for
//! auto-highlighted occurrences and `selected` for matches that coincide
//! with the selection itself. The registry is the sole owner of those
//! handles.
//!
//! Ordering rules:
//! - layers are allocated before anything can write into them;
//! - a document's layers are cleared (`remove_layers`) before its entry is
//!   dropped (`drop_entry`), which releases the handles.

use beacon_text::Range;
use std::collections::HashMap;

use crate::config::LayerPolicy;
use crate::document::DocumentId;
use crate::event::{EventBus, HighlightEvent};
use crate::host::{DocumentHost, LayerId};

/// The two highlight layers of one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerPair {
    /// Occurrences of the selected text
    pub visible: LayerId,
    /// Occurrences that are the selection itself
    pub selected: LayerId,
}

impl LayerPair {
    fn allocate(host: &mut (impl DocumentHost + ?Sized), document: DocumentId) -> Self {
        Self {
            visible: host.create_layer(document),
            selected: host.create_layer(document),
        }
    }
}

/// Maps documents to their layer pairs.
pub struct MarkerLayerRegistry {
    layers: HashMap<DocumentId, LayerPair>,
    events: EventBus,
    result_count: usize,
}

impl MarkerLayerRegistry {
    /// Creates an empty registry that reports removals on `events`.
    pub fn new(events: EventBus) -> Self {
        Self {
            layers: HashMap::new(),
            events,
            result_count: 0,
        }
    }

    /// Gives `document` a layer pair and returns it.
    ///
    /// With [`LayerPolicy::Replace`] an existing pair is destroyed on the
    /// host and a fresh, empty pair takes its place, so earlier markers
    /// neither survive nor stay on screen through an orphaned layer.
    /// With [`LayerPolicy::Reuse`] an existing pair is returned untouched.
    pub fn ensure_layers(
        &mut self,
        host: &mut (impl DocumentHost + ?Sized),
        document: DocumentId,
        policy: LayerPolicy,
    ) -> LayerPair {
        if let Some(&existing) = self.layers.get(&document) {
            match policy {
                LayerPolicy::Reuse => {
                    tracing::trace!(%document, "reusing marker layers");
                    return existing;
                }
                LayerPolicy::Replace => {
                    tracing::debug!(
                        %document,
                        visible = %existing.visible,
                        selected = %existing.selected,
                        "replacing marker layers"
                    );
                    host.destroy_layer(document, existing.visible);
                    host.destroy_layer(document, existing.selected);
                }
            }
        }

        let pair = LayerPair::allocate(host, document);
        tracing::debug!(%document, visible = %pair.visible, selected = %pair.selected, "allocated marker layers");
        self.layers.insert(document, pair);
        pair
    }

    /// Clears both layers of `document`, resets the result count and emits
    /// [`HighlightEvent::MarkerLayerRemoved`]. The entry itself stays.
    ///
    /// Returns false, doing nothing, when the document has no entry.
    pub fn remove_layers(&mut self, host: &mut (impl DocumentHost + ?Sized), document: DocumentId) -> bool {
        let Some(pair) = self.layers.get(&document) else {
            return false;
        };
        host.clear_layer(document, pair.visible);
        host.clear_layer(document, pair.selected);
        self.result_count = 0;
        self.events.emit(HighlightEvent::MarkerLayerRemoved { document });
        true
    }

    /// Removes the entry for `document` and releases its handles.
    pub fn drop_entry(&mut self, host: &mut (impl DocumentHost + ?Sized), document: DocumentId) {
        if let Some(pair) = self.layers.remove(&document) {
            host.destroy_layer(document, pair.visible);
            host.destroy_layer(document, pair.selected);
            tracing::debug!(%document, "dropped marker layers");
        }
    }

    /// Clears the layers of every known document.
    pub fn remove_all(&mut self, host: &mut (impl DocumentHost + ?Sized)) {
        for document in self.documents() {
            self.remove_layers(host, document);
        }
    }

    /// Releases every handle without emitting events. Used on teardown.
    pub fn release_all(&mut self, host: &mut (impl DocumentHost + ?Sized)) {
        for (document, pair) in self.layers.drain() {
            host.destroy_layer(document, pair.visible);
            host.destroy_layer(document, pair.selected);
        }
        self.result_count = 0;
    }

    /// Returns the layer pair of a document.
    pub fn get(&self, document: DocumentId) -> Option<LayerPair> {
        self.layers.get(&document).copied()
    }

    /// Returns true if `document` has an entry.
    pub fn contains(&self, document: DocumentId) -> bool {
        self.layers.contains_key(&document)
    }

    /// Documents with an entry, in a stable order.
    pub fn documents(&self) -> Vec<DocumentId> {
        let mut documents: Vec<DocumentId> = self.layers.keys().copied().collect();
        documents.sort();
        documents
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Returns true if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Union of the visible and selected markers of `document`, sorted by
    /// start position. Empty when the document has no entry.
    pub fn highlighted_ranges(&self, host: &(impl DocumentHost + ?Sized), document: DocumentId) -> Vec<Range> {
        let Some(pair) = self.layers.get(&document) else {
            return Vec::new();
        };
        let mut ranges = host.markers(document, pair.visible);
        ranges.extend(host.markers(document, pair.selected));
        ranges.sort();
        ranges.dedup();
        ranges
    }

    /// Number of matches marked by the last recomputation.
    pub fn result_count(&self) -> usize {
        self.result_count
    }

    pub(crate) fn set_result_count(&mut self, count: usize) {
        self.result_count = count;
    }
}
