//! Highlight lifecycle events.
//!
//! Events are values on a `tokio::sync::broadcast` channel: subscribing is
//! the observer-registration API, and dropping the receiver unsubscribes.
//! Emitting never blocks and never fails, with or without subscribers.

use beacon_text::Range;
use tokio::sync::broadcast;

use crate::document::DocumentId;

/// Events emitted while highlights are computed and cleared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HighlightEvent {
    /// Matches were marked in a document, one event per document per
    /// recomputation. `visible` and `selected` hold the ranges added to
    /// each layer, in document order.
    MarkersAdded {
        document: DocumentId,
        visible: Vec<Range>,
        selected: Vec<Range>,
    },
    /// A recomputation finished marking matches
    FinishedAddingMarkers,
    /// A document's layers were cleared
    MarkerLayerRemoved { document: DocumentId },
    /// Highlights reached their final state for one recomputation cycle.
    ///
    /// Fires exactly once per cycle (and once per `disable`), after every
    /// other event of that cycle. `before` and `after` are the match counts
    /// on either side of it.
    HighlightsSettled { before: usize, after: usize },
}

/// Event bus for broadcasting highlight events.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<HighlightEvent>,
}

impl EventBus {
    /// Creates a new event bus.
    pub fn new() -> Self {
        // A full refresh emits a few events per document, never per match.
        Self::with_capacity(1024)
    }

    /// Creates a bus buffering up to `capacity` events per slow subscriber.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Emits an event to all subscribers.
    pub fn emit(&self, event: HighlightEvent) {
        // No receivers is fine
        let _ = self.sender.send(event);
    }

    /// Subscribes to events.
    ///
    /// Returns a receiver that will get all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<HighlightEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper for processing events asynchronously.
///
/// ## Example
///
/// ```ignore
/// let mut handler = EventHandler::new(manager.subscribe());
///
/// tokio::spawn(async move {
///     while let Some(event) = handler.next().await {
///         if let HighlightEvent::HighlightsSettled { after, .. } = event {
///             status_bar.set_count(after);
///         }
///     }
/// });
/// ```
pub struct EventHandler {
    receiver: broadcast::Receiver<HighlightEvent>,
}

impl EventHandler {
    /// Creates a new event handler.
    pub fn new(receiver: broadcast::Receiver<HighlightEvent>) -> Self {
        Self { receiver }
    }

    /// Waits for the next event. Returns `None` once the bus is gone.
    pub async fn next(&mut self) -> Option<HighlightEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("Highlight event handler lagged, missed {} events", n);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Returns every event already queued, without waiting.
    pub fn drain(&mut self) -> Vec<HighlightEvent> {
        let mut events = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(event) => events.push(event),
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    tracing::warn!("Highlight event handler lagged, missed {} events", n);
                }
                Err(_) => return events,
            }
        }
    }
}
