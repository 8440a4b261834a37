//! # Beacon Core
//!
//! Selection-driven highlighting and folding.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                    SelectionManager                       │
//! │  ┌──────────────┐ ┌──────────────┐ ┌──────────────────┐  │
//! │  │ ConfigStore  │ │   EventBus   │ │ SelectionPipeline│  │
//! │  └──────────────┘ └──────────────┘ └──────────────────┘  │
//! │         │                                                 │
//! │  ┌──────┴─────────────────┐   ┌────────────────────────┐ │
//! │  │  MarkerLayerRegistry   │   │     SearchEngine       │ │
//! │  │  doc ─▶ (visible, sel) │   │  selection ─▶ matches  │ │
//! │  └────────────────────────┘   └────────────────────────┘ │
//! └──────────────────────────┬───────────────────────────────┘
//!                            │ Host traits
//!                  ┌─────────┴─────────┐
//!                  │ Workspace / editor │
//!                  └───────────────────┘
//! ```
//!
//! ## Learning: Traits at the Seam
//!
//! The manager never names a concrete editor. It is generic over
//! [`Host`], so the in-memory [`Workspace`] drives it in tests and the CLI
//! while a real editor binding can implement the same three traits.

pub mod command;
pub mod config;
pub mod debounce;
pub mod document;
pub mod event;
pub mod host;
pub mod manager;
pub mod registry;
pub mod search;
pub mod workspace;

pub use command::Command;
pub use config::{Config, ConfigError, ConfigStore, FoldConfig, HighlightConfig, LayerPolicy};
pub use debounce::{Debouncer, SelectionPipeline};
pub use document::{Document, DocumentId};
pub use event::{EventBus, EventHandler, HighlightEvent};
pub use host::{DocumentHost, FoldHost, Host, HostEvent, LayerId, PaneItem, SelectionHost};
pub use manager::{Input, SelectionManager};
pub use registry::{LayerPair, MarkerLayerRegistry};
pub use search::{DocumentHighlights, OccurrenceSearch, SearchEngine, SearchOutcome};
pub use workspace::Workspace;

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core operations
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Document not found: {0}")]
    DocumentNotFound(DocumentId),

    #[error("Command not found: {0}")]
    CommandNotFound(String),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Text error: {0}")]
    Text(#[from] beacon_text::TextError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
