//! The selection manager.
//!
//! `SelectionManager` ties the pieces together:
//!
//! ```text
//!  HostEvent ──▶ handle ──┬─ DocumentObserved ──▶ registry.ensure_layers
//!                         ├─ ItemWillClose ─────▶ registry.remove_layers + drop_entry
//!                         ├─ ActiveItemChanged ─▶ resubscribe + recompute (now)
//!                         └─ Selection* ────────▶ pipeline.notify ─ delay ─▶ recompute
//!
//!  recompute: clear layers ─▶ search ─▶ mark layers ─▶ HighlightsSettled ─▶ autofold
//! ```
//!
//! ## Thread Safety
//!
//! The manager is owned by one task. Host notifications, commands, config
//! changes and the debounce deadline are all serialized through
//! [`SelectionManager::run`], so no state is shared and nothing is locked.
//! Anything scheduled may find the world changed when it runs (the active
//! document closed, the manager destroyed); every entry point re-checks.

use beacon_text::{complement, Range};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::Instant;

use crate::command::Command;
use crate::config::ConfigStore;
use crate::debounce::{wait_until, SelectionPipeline};
use crate::document::DocumentId;
use crate::event::{EventBus, HighlightEvent};
use crate::host::{Host, HostEvent, PaneItem};
use crate::registry::MarkerLayerRegistry;
use crate::search::SearchEngine;

/// Messages accepted by [`SelectionManager::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// A notification from the host
    Event(HostEvent),
    /// A user or collaborator command
    Command(Command),
}

impl From<HostEvent> for Input {
    fn from(event: HostEvent) -> Self {
        Input::Event(event)
    }
}

impl From<Command> for Input {
    fn from(command: Command) -> Self {
        Input::Command(command)
    }
}

/// Tracks the selection and keeps highlights and folds in step with it.
pub struct SelectionManager<H, S> {
    host: H,
    search: S,
    config: ConfigStore,

    /// Debounce delay as of the last config change seen
    observed_delay: Duration,

    registry: MarkerLayerRegistry,
    pipeline: SelectionPipeline,
    events: EventBus,
    enabled: bool,

    /// Ranges folded by `fold_non_selected`; `None` when not folded
    hide_candidates: Option<Vec<Range>>,

    /// Document whose selection changes feed the pipeline
    selection_source: Option<DocumentId>,

    destroyed: bool,
}

impl<H: Host, S: SearchEngine> SelectionManager<H, S> {
    /// Creates a manager with its own event bus.
    ///
    /// Layers are allocated for every document already open, and the
    /// active document's selection is highlighted immediately.
    pub fn new(host: H, search: S, config: ConfigStore) -> Self {
        Self::with_event_bus(host, search, config, EventBus::new())
    }

    /// Creates a manager emitting on `events`, so observers can subscribe
    /// before the first highlights are computed.
    pub fn with_event_bus(host: H, search: S, config: ConfigStore, events: EventBus) -> Self {
        let observed_delay = config.debounce_delay();
        let mut manager = Self {
            host,
            search,
            config,
            observed_delay,
            registry: MarkerLayerRegistry::new(events.clone()),
            pipeline: SelectionPipeline::new(),
            events,
            enabled: true,
            hide_candidates: None,
            selection_source: None,
            destroyed: false,
        };

        for document in manager.host.open_documents() {
            manager.observe_document(document);
        }
        let active = manager.host.active_document().map(PaneItem::Document);
        manager.active_item_changed(active);
        manager
    }

    // ==================== Host Events ====================

    /// Reacts to a host notification.
    pub fn handle(&mut self, event: HostEvent) {
        if self.destroyed {
            return;
        }
        match event {
            HostEvent::DocumentObserved(document) => self.observe_document(document),
            HostEvent::ItemWillClose(item) => {
                // Only documents own layers.
                if let Some(document) = item.document() {
                    self.close_document(document);
                }
            }
            HostEvent::ActiveItemChanged(item) => self.active_item_changed(item),
            HostEvent::SelectionAdded(document) | HostEvent::SelectionRangeChanged(document) => {
                if self.selection_source == Some(document) {
                    self.pipeline.notify(&self.config);
                }
            }
        }
    }

    fn observe_document(&mut self, document: DocumentId) {
        let policy = self.config.get().highlight.layer_policy;
        self.registry.ensure_layers(&mut self.host, document, policy);
    }

    fn close_document(&mut self, document: DocumentId) {
        self.registry.remove_layers(&mut self.host, document);
        self.registry.drop_entry(&mut self.host, document);
        if self.selection_source == Some(document) {
            self.selection_source = None;
        }
    }

    /// The host's active document is authoritative: selection changes are
    /// watched on the same document that recomputation searches.
    fn active_item_changed(&mut self, item: Option<PaneItem>) {
        let reported = item.as_ref().and_then(PaneItem::document);
        self.selection_source = self.host.active_document();
        if reported != self.selection_source {
            tracing::debug!(
                ?reported,
                active = ?self.selection_source,
                "reported active item differs from host, following host"
            );
        }
        tracing::debug!(source = ?self.selection_source, "selection source changed");
        self.recompute();
    }

    /// Re-reads the config store. A changed debounce delay schedules a
    /// debounced recomputation; other keys are picked up on the next one.
    pub fn config_changed(&mut self) {
        if self.destroyed {
            return;
        }
        let delay = self.config.debounce_delay();
        if delay != self.observed_delay {
            tracing::debug!(?delay, "debounce delay changed");
            self.observed_delay = delay;
            self.pipeline.notify(&self.config);
        }
    }

    // ==================== Commands ====================

    /// Runs a command.
    pub fn execute(&mut self, command: Command) {
        tracing::debug!(%command, "executing command");
        match command {
            Command::Enable => self.enable(),
            Command::Disable => self.disable(),
            Command::SelectAll => self.select_all(),
            Command::FoldNonSelected => self.fold_non_selected(),
            Command::UnfoldNonSelected => self.unfold_non_selected(),
            Command::ToggleFoldNonSelected => self.toggle_fold_non_selected(),
            Command::Destroy => self.destroy(),
        }
    }

    /// Resumes highlighting and schedules a recomputation.
    pub fn enable(&mut self) {
        if self.destroyed {
            return;
        }
        self.enabled = true;
        self.pipeline.notify(&self.config);
    }

    /// Pauses highlighting and clears every highlight.
    pub fn disable(&mut self) {
        if self.destroyed {
            return;
        }
        self.enabled = false;
        let before = self.registry.result_count();
        self.registry.remove_all(&mut self.host);
        self.settle(before, 0);
    }

    /// Selects every highlighted range of the active document.
    pub fn select_all(&mut self) {
        if self.destroyed {
            return;
        }
        let Some(document) = self.host.active_document() else {
            return;
        };
        let ranges = self.registry.highlighted_ranges(&self.host, document);
        if ranges.is_empty() {
            return;
        }
        self.host.set_selected_ranges(document, &ranges, true);
    }

    /// Folds every line of the active document that holds no highlight.
    pub fn fold_non_selected(&mut self) {
        if self.destroyed {
            return;
        }
        let Some(document) = self.host.active_document() else {
            return;
        };
        let ranges = self.registry.highlighted_ranges(&self.host, document);
        if ranges.is_empty() {
            return;
        }

        if self.hide_candidates.is_some() {
            // Refolding replaces the previous folds instead of stacking on them.
            self.host.unfold_all(document);
        }
        let candidates = complement(&ranges, &self.host.line_lengths(document));
        for range in &candidates {
            self.host.fold(document, *range);
        }
        tracing::debug!(%document, folds = candidates.len(), "folded non-highlighted lines");
        self.hide_candidates = Some(candidates);
    }

    /// Unfolds the active document and forgets the fold state.
    pub fn unfold_non_selected(&mut self) {
        if self.destroyed {
            return;
        }
        if let Some(document) = self.host.active_document() {
            self.host.unfold_all(document);
            tracing::debug!(%document, "unfolded");
        }
        self.hide_candidates = None;
    }

    /// Unfolds if folded, folds otherwise.
    pub fn toggle_fold_non_selected(&mut self) {
        if self.hide_candidates.is_some() {
            self.unfold_non_selected();
        } else {
            self.fold_non_selected();
        }
    }

    /// Cancels pending work and releases every layer. Nothing is emitted
    /// and every later call is a no-op. Safe to repeat.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.pipeline.cancel();
        self.selection_source = None;
        self.registry.release_all(&mut self.host);
        self.destroyed = true;
        tracing::debug!("selection manager destroyed");
    }

    // ==================== Recomputation ====================

    /// Recomputes highlights for the active document right away.
    pub fn recompute(&mut self) {
        if self.destroyed {
            return;
        }
        let Some(active) = self.host.active_document() else {
            tracing::trace!("no active document, skipping recomputation");
            return;
        };

        let before = self.registry.result_count();
        self.registry.remove_all(&mut self.host);
        if !self.enabled {
            self.settle(before, 0);
            return;
        }

        let config = self.config.get().highlight;
        let Some(outcome) = self.search.search(&self.host, active, &config) else {
            self.settle(before, 0);
            return;
        };

        let mut count = 0;
        for highlights in outcome.documents {
            let document = highlights.document;
            let Some(pair) = self.registry.get(document) else {
                continue;
            };
            if highlights.is_empty() {
                continue;
            }
            for range in &highlights.visible {
                self.host.add_marker(document, pair.visible, *range);
            }
            for range in &highlights.selected {
                self.host.add_marker(document, pair.selected, *range);
            }
            count += highlights.len();
            // One event per document keeps a refresh within the bus capacity
            // however many matches it marks.
            self.events.emit(HighlightEvent::MarkersAdded {
                document,
                visible: highlights.visible,
                selected: highlights.selected,
            });
        }
        self.registry.set_result_count(count);
        self.events.emit(HighlightEvent::FinishedAddingMarkers);
        tracing::debug!(%active, matches = count, "highlights recomputed");
        self.settle(before, count);
    }

    /// Closes a recomputation cycle: one settled event, then autofold.
    fn settle(&mut self, before: usize, after: usize) {
        self.events.emit(HighlightEvent::HighlightsSettled { before, after });
        if !self.config.get().fold.auto_fold {
            return;
        }
        if self.hide_candidates.is_some() {
            self.unfold_non_selected();
        }
        if after > 0 {
            self.fold_non_selected();
        }
    }

    /// Runs the debounced recomputation if it is due.
    fn fire_debounced(&mut self) -> bool {
        if self.pipeline.take_elapsed(Instant::now()) {
            tracing::trace!("debounced recomputation fired");
            self.recompute();
            true
        } else {
            false
        }
    }

    /// Waits for the pending debounced recomputation and runs it.
    ///
    /// Returns false immediately when nothing is pending.
    pub async fn flush_pending(&mut self) -> bool {
        let Some(deadline) = self.pipeline.deadline() else {
            return false;
        };
        tokio::time::sleep_until(deadline).await;
        self.fire_debounced()
    }

    /// Drives the manager until it is destroyed or `inputs` closes, then
    /// hands it back.
    pub async fn run(mut self, mut inputs: mpsc::UnboundedReceiver<Input>) -> Self {
        let mut config_rx = self.config.subscribe();
        while !self.destroyed {
            let deadline = self.pipeline.deadline();
            tokio::select! {
                input = inputs.recv() => match input {
                    Some(Input::Event(event)) => self.handle(event),
                    Some(Input::Command(command)) => self.execute(command),
                    None => {
                        tracing::debug!("input channel closed");
                        self.destroy();
                    }
                },
                Ok(()) = config_rx.changed() => self.config_changed(),
                () = wait_until(deadline) => {
                    self.fire_debounced();
                }
            }
        }
        self
    }

    // ==================== Accessors ====================

    /// Subscribes to highlight events.
    pub fn subscribe(&self) -> broadcast::Receiver<HighlightEvent> {
        self.events.subscribe()
    }

    /// Returns the host.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Returns the host mutably, e.g. to apply edits before reporting them.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Returns the search engine.
    pub fn search_engine(&self) -> &S {
        &self.search
    }

    /// Returns the config store.
    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    /// Returns the layer registry.
    pub fn registry(&self) -> &MarkerLayerRegistry {
        &self.registry
    }

    /// Number of matches currently highlighted.
    pub fn result_count(&self) -> usize {
        self.registry.result_count()
    }

    /// Returns true unless highlighting is paused.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns true once `destroy` ran.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Returns true while folded by `fold_non_selected`.
    pub fn is_folded(&self) -> bool {
        self.hide_candidates.is_some()
    }

    /// The ranges folded by the last `fold_non_selected`.
    pub fn hide_candidates(&self) -> Option<&[Range]> {
        self.hide_candidates.as_deref()
    }

    /// Document whose selection changes are being watched.
    pub fn selection_source(&self) -> Option<DocumentId> {
        self.selection_source
    }

    /// Returns true if a debounced recomputation is pending.
    pub fn has_pending(&self) -> bool {
        self.pipeline.is_pending()
    }

    /// Delay of the pipeline's debouncer, once built.
    pub fn debounce_delay(&self) -> Option<Duration> {
        self.pipeline.delay()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, HighlightConfig, LayerPolicy};
    use crate::event::EventHandler;
    use crate::host::DocumentHost;
    use crate::search::{OccurrenceSearch, SearchOutcome};
    use crate::workspace::Workspace;

    /// Counts searches on top of the reference engine.
    #[derive(Default)]
    struct CountingSearch {
        inner: OccurrenceSearch,
        calls: usize,
    }

    impl SearchEngine for CountingSearch {
        fn search(
            &mut self,
            host: &dyn DocumentHost,
            active: DocumentId,
            config: &HighlightConfig,
        ) -> Option<SearchOutcome> {
            self.calls += 1;
            self.inner.search(host, active, config)
        }
    }

    type Manager = SelectionManager<Workspace, CountingSearch>;

    const TEXT: &str = "fn foo() {}\n\nlet x = 1;\nfoo();\nlet y = 2;\n";

    /// One document with `foo` selected on line 0.
    fn setup_with(config: Config) -> (Manager, DocumentId) {
        let mut ws = Workspace::new();
        let doc = ws.open("main.rs", TEXT);
        ws.set_selections(doc, vec![Range::from_coords((0, 3), (0, 6))]).unwrap();
        let manager = SelectionManager::new(ws, CountingSearch::default(), ConfigStore::new(config));
        (manager, doc)
    }

    fn setup() -> (Manager, DocumentId) {
        setup_with(Config::default())
    }

    fn calls(manager: &Manager) -> usize {
        manager.search_engine().calls
    }

    fn select(manager: &mut Manager, doc: DocumentId, start: (usize, usize), end: (usize, usize)) {
        manager
            .host_mut()
            .set_selections(doc, vec![Range::from_coords(start, end)])
            .unwrap();
    }

    #[test]
    fn test_construction_observes_documents_and_highlights() {
        let (manager, doc) = setup();
        assert!(manager.registry().contains(doc));
        assert_eq!(manager.selection_source(), Some(doc));
        assert_eq!(calls(&manager), 1);
        assert_eq!(manager.result_count(), 2);
        assert_eq!(
            manager.registry().highlighted_ranges(manager.host(), doc),
            vec![
                Range::from_coords((0, 3), (0, 6)),
                Range::from_coords((3, 0), (3, 3)),
            ]
        );
    }

    #[test]
    fn test_selection_changes_on_other_documents_are_ignored() {
        let (mut manager, doc) = setup();
        let other = manager.host_mut().open("other.rs", "foo");
        manager.host_mut().activate(doc).unwrap();
        manager.handle(HostEvent::DocumentObserved(other));

        manager.handle(HostEvent::SelectionRangeChanged(other));
        assert!(!manager.has_pending());

        manager.handle(HostEvent::SelectionAdded(doc));
        assert!(manager.has_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_of_selection_changes_searches_once() {
        let (mut manager, doc) = setup();
        let baseline = calls(&manager);

        for _ in 0..5 {
            manager.handle(HostEvent::SelectionRangeChanged(doc));
            tokio::time::advance(Duration::from_millis(5)).await;
        }
        assert_eq!(calls(&manager), baseline);

        assert!(manager.flush_pending().await);
        assert_eq!(calls(&manager), baseline + 1);
        assert!(!manager.flush_pending().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spaced_selection_changes_search_each_time() {
        let (mut manager, doc) = setup();
        let baseline = calls(&manager);

        for _ in 0..3 {
            manager.handle(HostEvent::SelectionRangeChanged(doc));
            assert!(manager.flush_pending().await);
            tokio::time::advance(Duration::from_millis(50)).await;
        }
        assert_eq!(calls(&manager), baseline + 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounced_recompute_follows_new_selection() {
        let (mut manager, doc) = setup();
        select(&mut manager, doc, (2, 0), (2, 3));
        manager.handle(HostEvent::SelectionRangeChanged(doc));
        manager.flush_pending().await;

        let lines: Vec<usize> = manager
            .registry()
            .highlighted_ranges(manager.host(), doc)
            .iter()
            .map(|r| r.start.line)
            .collect();
        assert_eq!(lines, vec![2, 4]);
    }

    #[test]
    fn test_delay_change_schedules_recompute_without_rebuilding_debouncer() {
        let (mut manager, doc) = setup();
        manager.handle(HostEvent::SelectionAdded(doc));
        assert_eq!(manager.debounce_delay(), Some(Duration::from_millis(20)));

        manager.config().update(|c| c.highlight.ignore_case = true);
        manager.config_changed();
        assert_eq!(manager.debounce_delay(), Some(Duration::from_millis(20)));

        manager.config().update(|c| c.highlight.timeout = 250);
        manager.config_changed();
        assert!(manager.has_pending());
        assert_eq!(manager.debounce_delay(), Some(Duration::from_millis(20)));
    }

    #[test]
    fn test_delay_change_is_read_by_first_debouncer() {
        let (mut manager, doc) = setup();
        manager.config().update(|c| c.highlight.timeout = 250);
        manager.config_changed();
        manager.handle(HostEvent::SelectionAdded(doc));
        assert_eq!(manager.debounce_delay(), Some(Duration::from_millis(250)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_disable_clears_and_enable_restores() {
        let (mut manager, doc) = setup();
        let mut events = EventHandler::new(manager.subscribe());

        manager.disable();
        assert!(!manager.is_enabled());
        assert_eq!(manager.result_count(), 0);
        assert!(manager.registry().highlighted_ranges(manager.host(), doc).is_empty());
        assert_eq!(
            events.drain(),
            vec![
                HighlightEvent::MarkerLayerRemoved { document: doc },
                HighlightEvent::HighlightsSettled { before: 2, after: 0 },
            ]
        );

        // While disabled, selection changes still clear but mark nothing.
        manager.handle(HostEvent::SelectionAdded(doc));
        manager.flush_pending().await;
        assert_eq!(manager.result_count(), 0);

        manager.enable();
        assert!(manager.has_pending());
        manager.flush_pending().await;
        assert_eq!(manager.result_count(), 2);
    }

    #[test]
    fn test_recompute_event_sequence() {
        let (mut manager, doc) = setup();
        let mut events = EventHandler::new(manager.subscribe());

        manager.recompute();

        assert_eq!(
            events.drain(),
            vec![
                HighlightEvent::MarkerLayerRemoved { document: doc },
                HighlightEvent::MarkersAdded {
                    document: doc,
                    visible: vec![
                        Range::from_coords((0, 3), (0, 6)),
                        Range::from_coords((3, 0), (3, 3)),
                    ],
                    selected: Vec::new(),
                },
                HighlightEvent::FinishedAddingMarkers,
                HighlightEvent::HighlightsSettled { before: 2, after: 2 },
            ]
        );
    }

    #[test]
    fn test_large_refresh_fits_event_bus() {
        let mut ws = Workspace::new();
        let doc = ws.open("words.txt", &"ab ".repeat(1500));
        ws.set_selections(doc, vec![Range::from_coords((0, 0), (0, 2))]).unwrap();
        let bus = EventBus::new();
        let mut events = EventHandler::new(bus.subscribe());

        let manager = SelectionManager::with_event_bus(
            ws,
            CountingSearch::default(),
            ConfigStore::default(),
            bus,
        );

        assert_eq!(manager.result_count(), 1500);
        let received = events.drain();
        assert_eq!(received.len(), 4);
        assert_eq!(received[0], HighlightEvent::MarkerLayerRemoved { document: doc });
        match &received[1] {
            HighlightEvent::MarkersAdded { document, visible, selected } => {
                assert_eq!(*document, doc);
                assert_eq!(visible.len(), 1500);
                assert!(selected.is_empty());
            }
            other => panic!("expected MarkersAdded, got {other:?}"),
        }
        assert_eq!(received[2], HighlightEvent::FinishedAddingMarkers);
        assert_eq!(
            received[3],
            HighlightEvent::HighlightsSettled { before: 0, after: 1500 }
        );
    }

    #[test]
    fn test_selected_layer_receives_the_selection_itself() {
        let mut config = Config::default();
        config.highlight.hide_highlight_on_selected_word = true;
        let (mut manager, doc) = setup_with(config);
        let mut events = EventHandler::new(manager.subscribe());

        manager.recompute();

        let pair = manager.registry().get(doc).unwrap();
        assert_eq!(
            manager.host().markers(doc, pair.selected),
            vec![Range::from_coords((0, 3), (0, 6))]
        );
        assert_eq!(manager.host().markers(doc, pair.visible).len(), 1);
        assert!(events.drain().contains(&HighlightEvent::MarkersAdded {
            document: doc,
            visible: vec![Range::from_coords((3, 0), (3, 3))],
            selected: vec![Range::from_coords((0, 3), (0, 6))],
        }));
    }

    #[test]
    fn test_select_all_selects_highlights_with_flash() {
        let (mut manager, doc) = setup();
        manager.select_all();

        let document = manager.host().document(doc).unwrap();
        assert_eq!(
            document.selections(),
            &[
                Range::from_coords((0, 3), (0, 6)),
                Range::from_coords((3, 0), (3, 3)),
            ]
        );
        assert_eq!(document.flashes(), 1);
    }

    #[test]
    fn test_select_all_without_highlights_is_noop() {
        let (mut manager, doc) = setup();
        select(&mut manager, doc, (1, 0), (1, 0));
        manager.recompute();

        manager.select_all();

        let document = manager.host().document(doc).unwrap();
        assert_eq!(document.flashes(), 0);
        assert_eq!(document.selections(), &[Range::from_coords((1, 0), (1, 0))]);
    }

    #[test]
    fn test_select_all_without_layer_entry_is_noop() {
        let (mut manager, doc) = setup();
        // Host knows the document, the manager was never told.
        let stray = manager.host_mut().open("stray.rs", "foo foo");
        manager.select_all();
        assert_eq!(manager.host().document(stray).unwrap().flashes(), 0);
        assert_eq!(manager.host().document(doc).unwrap().flashes(), 0);
    }

    #[test]
    fn test_fold_then_unfold_restores_document() {
        let (mut manager, doc) = setup();

        manager.fold_non_selected();
        assert!(manager.is_folded());
        let expected = vec![
            Range::from_coords((1, 0), (2, 10)),
            Range::from_coords((4, 0), (5, 0)),
        ];
        assert_eq!(manager.hide_candidates(), Some(expected.as_slice()));
        assert_eq!(manager.host().document(doc).unwrap().folds(), expected.as_slice());

        manager.unfold_non_selected();
        assert!(!manager.is_folded());
        assert!(manager.host().document(doc).unwrap().folds().is_empty());
    }

    #[test]
    fn test_refold_replaces_previous_folds() {
        let (mut manager, doc) = setup();
        manager.fold_non_selected();
        let first = manager.hide_candidates().unwrap().to_vec();

        manager.fold_non_selected();

        assert_eq!(manager.hide_candidates(), Some(first.as_slice()));
        assert_eq!(manager.host().document(doc).unwrap().folds(), first.as_slice());
    }

    #[test]
    fn test_toggle_twice_returns_to_original_state() {
        let (mut manager, doc) = setup();

        manager.toggle_fold_non_selected();
        assert!(manager.is_folded());
        manager.toggle_fold_non_selected();
        assert!(!manager.is_folded());
        assert!(manager.host().document(doc).unwrap().folds().is_empty());

        manager.fold_non_selected();
        manager.toggle_fold_non_selected();
        manager.toggle_fold_non_selected();
        assert!(manager.is_folded());
    }

    #[test]
    fn test_fold_without_highlights_is_noop() {
        let (mut manager, doc) = setup();
        manager.disable();
        manager.fold_non_selected();
        assert!(!manager.is_folded());
        assert!(manager.host().document(doc).unwrap().folds().is_empty());
    }

    #[test]
    fn test_fold_state_stays_with_manager_not_document() {
        let (mut manager, a) = setup();
        manager.fold_non_selected();

        let b = manager.host_mut().open("b.rs", "x\ny");
        manager.handle(HostEvent::DocumentObserved(b));
        manager.handle(HostEvent::ActiveItemChanged(Some(PaneItem::Document(b))));
        assert!(manager.is_folded());

        manager.unfold_non_selected();
        assert!(!manager.is_folded());
        // The unfold went to the now-active document.
        assert!(!manager.host().document(a).unwrap().folds().is_empty());
    }

    #[test]
    fn test_closing_document_drops_its_layers() {
        let (mut manager, doc) = setup();
        manager.handle(HostEvent::ItemWillClose(PaneItem::Other("settings".into())));
        assert!(manager.registry().contains(doc));

        manager.handle(HostEvent::ItemWillClose(PaneItem::Document(doc)));
        assert!(!manager.registry().contains(doc));
        assert_eq!(manager.result_count(), 0);
        assert_eq!(manager.selection_source(), None);
        assert_eq!(manager.host().document(doc).unwrap().layer_ids().count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_recompute_after_close_is_harmless() {
        let (mut manager, doc) = setup();
        manager.handle(HostEvent::SelectionAdded(doc));
        manager.handle(HostEvent::ItemWillClose(PaneItem::Document(doc)));
        manager.host_mut().close(doc).unwrap();

        assert!(manager.flush_pending().await);
        assert_eq!(manager.result_count(), 0);
    }

    #[test]
    fn test_active_change_resubscribes_and_recomputes() {
        let (mut manager, a) = setup();
        let b = manager.host_mut().open("b.rs", "bar bar\nbar");
        manager
            .host_mut()
            .set_selections(b, vec![Range::from_coords((0, 0), (0, 3))])
            .unwrap();
        manager.handle(HostEvent::DocumentObserved(b));
        let before = calls(&manager);

        manager.handle(HostEvent::ActiveItemChanged(Some(PaneItem::Document(b))));

        assert_eq!(manager.selection_source(), Some(b));
        assert_eq!(calls(&manager), before + 1);
        assert_eq!(manager.result_count(), 3);
        assert!(manager.registry().highlighted_ranges(manager.host(), a).is_empty());

        manager.host_mut().show_other("image");
        manager.handle(HostEvent::ActiveItemChanged(Some(PaneItem::Other("image".into()))));
        assert_eq!(manager.selection_source(), None);
        manager.handle(HostEvent::SelectionAdded(b));
        assert!(!manager.has_pending());
    }

    #[test]
    fn test_selection_source_follows_host_active_document() {
        let (mut manager, a) = setup();
        let b = manager.host_mut().open("b.rs", "bar bar");
        manager.host_mut().activate(a).unwrap();
        manager.handle(HostEvent::DocumentObserved(b));

        // Reported switch the host has not made (yet).
        manager.handle(HostEvent::ActiveItemChanged(Some(PaneItem::Document(b))));

        assert_eq!(manager.selection_source(), Some(a));
        manager.handle(HostEvent::SelectionAdded(b));
        assert!(!manager.has_pending());
        manager.handle(HostEvent::SelectionAdded(a));
        assert!(manager.has_pending());
    }

    #[test]
    fn test_reobserving_document_replaces_layers() {
        let (mut manager, doc) = setup();
        let old = manager.registry().get(doc).unwrap();

        manager.handle(HostEvent::DocumentObserved(doc));

        let new = manager.registry().get(doc).unwrap();
        assert_ne!(old, new);
        assert!(manager.registry().highlighted_ranges(manager.host(), doc).is_empty());
    }

    #[test]
    fn test_reobserving_document_with_reuse_policy_keeps_highlights() {
        let mut config = Config::default();
        config.highlight.layer_policy = LayerPolicy::Reuse;
        let (mut manager, doc) = setup_with(config);
        let old = manager.registry().get(doc).unwrap();

        manager.handle(HostEvent::DocumentObserved(doc));

        assert_eq!(manager.registry().get(doc), Some(old));
        assert_eq!(manager.registry().highlighted_ranges(manager.host(), doc).len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_destroy_cancels_pending_work_and_silences_manager() {
        let (mut manager, doc) = setup();
        let mut events = EventHandler::new(manager.subscribe());
        manager.handle(HostEvent::SelectionAdded(doc));
        let before = calls(&manager);

        manager.destroy();
        manager.destroy();

        assert!(manager.is_destroyed());
        assert!(!manager.has_pending());
        assert!(!manager.flush_pending().await);
        tokio::time::advance(Duration::from_secs(1)).await;

        manager.handle(HostEvent::SelectionAdded(doc));
        manager.recompute();
        manager.disable();
        manager.execute(Command::ToggleFoldNonSelected);

        assert_eq!(calls(&manager), before);
        assert!(events.drain().is_empty());
        assert_eq!(manager.host().document(doc).unwrap().layer_ids().count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_fold_follows_highlights() {
        let mut config = Config::default();
        config.fold.auto_fold = true;
        let (mut manager, doc) = setup_with(config);
        let mut events = EventHandler::new(manager.subscribe());

        // Constructed with `foo` selected: already folded around it.
        assert!(manager.is_folded());
        assert!(manager.host().document(doc).unwrap().is_line_folded(1));

        select(&mut manager, doc, (2, 0), (2, 3));
        manager.handle(HostEvent::SelectionRangeChanged(doc));
        manager.flush_pending().await;
        assert!(manager.is_folded());
        let folded: Vec<bool> = (0..6)
            .map(|line| manager.host().document(doc).unwrap().is_line_folded(line))
            .collect();
        assert_eq!(folded, vec![true, true, false, true, false, true]);

        let settled = events
            .drain()
            .into_iter()
            .filter(|e| matches!(e, HighlightEvent::HighlightsSettled { .. }))
            .count();
        assert_eq!(settled, 1);

        select(&mut manager, doc, (1, 0), (1, 0));
        manager.handle(HostEvent::SelectionRangeChanged(doc));
        manager.flush_pending().await;
        assert!(!manager.is_folded());
        assert!(manager.host().document(doc).unwrap().folds().is_empty());
    }

    #[test]
    fn test_execute_dispatches_commands() {
        let (mut manager, _) = setup();
        manager.execute(Command::FoldNonSelected);
        assert!(manager.is_folded());
        manager.execute(Command::UnfoldNonSelected);
        assert!(!manager.is_folded());
        manager.execute(Command::Disable);
        assert!(!manager.is_enabled());
        manager.execute(Command::Enable);
        assert!(manager.is_enabled());
        manager.execute(Command::Destroy);
        assert!(manager.is_destroyed());
    }

    #[test]
    fn test_no_active_document_is_tolerated() {
        let mut manager = SelectionManager::new(
            Workspace::new(),
            CountingSearch::default(),
            ConfigStore::default(),
        );
        manager.recompute();
        manager.select_all();
        manager.toggle_fold_non_selected();
        manager.unfold_non_selected();
        assert_eq!(calls(&manager), 0);
        assert!(!manager.is_folded());
    }
}
