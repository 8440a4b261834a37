//! Highlighter configuration.
//!
//! `Config` is plain serde data loaded from TOML. `#[serde(default)]` on
//! every section keeps old config files loadable as options are added.
//!
//! `ConfigStore` is the shared, observable home of the live `Config`: the
//! manager reads the debounce delay from it whenever it builds a debouncer
//! and watches it for changes.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Main highlighter configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Selection highlighting settings
    pub highlight: HighlightConfig,

    /// Folding settings
    pub fold: FoldConfig,
}

impl Config {
    /// Loads config from the default location.
    pub fn load() -> Self {
        Self::load_from_default_path().unwrap_or_default()
    }

    /// Loads config from a file.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Loads from the default config path.
    fn load_from_default_path() -> Result<Self, ConfigError> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Returns the default config file path.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("beacon").join("config.toml"))
    }

    /// Saves the config to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(Self::default_path()?)
    }

    /// Saves the config to a file, creating parent directories.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Selection highlighting configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    /// Debounce delay in milliseconds before a selection change is searched
    pub timeout: u64,

    /// Selections shorter than this many characters are not highlighted
    pub minimum_length: usize,

    /// Only highlight matches bounded by word boundaries
    pub only_whole_words: bool,

    /// Put matches that coincide with a selection in the selected layer
    pub hide_highlight_on_selected_word: bool,

    /// Case-insensitive matching
    pub ignore_case: bool,

    /// Highlight in every document visible in a pane, not only the active one
    pub highlight_in_panes: bool,

    /// What happens when layers are requested for a document that has them
    pub layer_policy: LayerPolicy,
}

impl HighlightConfig {
    /// The debounce delay as a `Duration`.
    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.timeout)
    }
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            timeout: 20,
            minimum_length: 2,
            only_whole_words: true,
            hide_highlight_on_selected_word: false,
            ignore_case: false,
            highlight_in_panes: true,
            layer_policy: LayerPolicy::default(),
        }
    }
}

/// Behavior of `ensure_layers` for a document that already has a layer pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerPolicy {
    /// Allocate a fresh pair and release the displaced one
    #[default]
    Replace,
    /// Keep the existing pair and its markers
    Reuse,
}

/// Folding configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FoldConfig {
    /// Re-fold around the highlights every time they settle
    pub auto_fold: bool,
}

/// Shared, observable configuration.
///
/// Clones refer to the same store. Readers call [`ConfigStore::get`];
/// long-running tasks call [`ConfigStore::subscribe`] and await
/// `changed()` on the receiver.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    sender: Arc<watch::Sender<Config>>,
}

impl ConfigStore {
    /// Creates a store holding `config`.
    pub fn new(config: Config) -> Self {
        let (sender, _) = watch::channel(config);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Returns a snapshot of the current config.
    pub fn get(&self) -> Config {
        self.sender.borrow().clone()
    }

    /// Returns the current debounce delay.
    pub fn debounce_delay(&self) -> Duration {
        self.sender.borrow().highlight.debounce_delay()
    }

    /// Replaces the config and notifies subscribers.
    pub fn set(&self, config: Config) {
        self.sender.send_replace(config);
    }

    /// Modifies the config in place and notifies subscribers.
    pub fn update(&self, modify: impl FnOnce(&mut Config)) {
        self.sender.send_modify(modify);
    }

    /// Subscribes to config changes.
    pub fn subscribe(&self) -> watch::Receiver<Config> {
        self.sender.subscribe()
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config directory not found")]
    NoConfigDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
