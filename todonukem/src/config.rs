//! Configuration for TODO NUKEM.
//!
//! Configuration comes from an optional `todonukem.json` file at the workspace
//! root, layered with environment variable overrides.
//!
//! # File Format
//!
//! ```json
//! {
//!   "displayMode": "emoji-text",
//!   "ticketBaseUrl": "https://tracker.example.com/browse",
//!   "emojis": {
//!     "priority": { "high": "🔥" },
//!     "meta": { "blockCommit": "🚫" }
//!   }
//! }
//! ```
//!
//! Every field is optional. Emoji overrides are keyed by slug within their
//! category; blank overrides are ignored. An unknown `displayMode` falls back
//! to `emoji` without discarding the rest of the file.
//!
//! # Environment Variables
//!
//! | Variable | Required | Default | Description |
//! |----------|----------|---------|-------------|
//! | `TODONUKEM_CONFIG` | No | `<root>/todonukem.json` | Path of the config file |
//! | `TODONUKEM_DISPLAY_MODE` | No | from file | `emoji`, `text` or `emoji-text` |
//! | `TODONUKEM_TICKET_BASE_URL` | No | from file | Base URL for ticket links |
//!
//! # Caching
//!
//! [`ConfigStore`] loads the file once and hands out the same
//! [`Config`] until [`ConfigStore::invalidate`] is called. A missing or
//! malformed file never fails a load: the last good configuration (or the
//! defaults) is used instead.

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::vocabulary::{Category, DisplayMode, DisplayModeError, Meta, VocabKey, Vocabulary};

/// Name of the per-workspace configuration file.
pub const CONFIG_FILE_NAME: &str = "todonukem.json";

/// Environment variable overriding the config file location.
pub const ENV_CONFIG_PATH: &str = "TODONUKEM_CONFIG";

/// Environment variable overriding the display mode.
pub const ENV_DISPLAY_MODE: &str = "TODONUKEM_DISPLAY_MODE";

/// Environment variable overriding the ticket base URL.
pub const ENV_TICKET_BASE_URL: &str = "TODONUKEM_TICKET_BASE_URL";

/// Errors that can occur while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid JSON for the expected shape.
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Environment variable has an invalid value.
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Per-category glyph overrides, keyed by slug.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmojiOverrides {
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub priority: HashMap<String, String>,

    #[serde(default, rename = "type", skip_serializing_if = "HashMap::is_empty")]
    pub task_type: HashMap<String, String>,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, String>,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub meta: HashMap<String, String>,
}

impl EmojiOverrides {
    fn table(&self, category: Category) -> &HashMap<String, String> {
        match category {
            Category::Priority => &self.priority,
            Category::Type => &self.task_type,
            Category::Context => &self.context,
            Category::Meta => &self.meta,
        }
    }

    /// Returns the override glyph for a key, if a non-blank one is set.
    #[must_use]
    pub fn glyph_for(&self, key: VocabKey) -> Option<&str> {
        let table = self.table(key.category());
        let mut found = table.get(key.slug());
        if found.is_none() && key == VocabKey::Meta(Meta::BlockCommit) {
            found = table.get("blockCommit");
        }
        found
            .map(String::as_str)
            .filter(|glyph| !glyph.trim().is_empty())
    }

    /// Whether no override is configured at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.priority.is_empty()
            && self.task_type.is_empty()
            && self.context.is_empty()
            && self.meta.is_empty()
    }
}

/// Effective TODO NUKEM configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Global rendering mode for decorations.
    #[serde(default, deserialize_with = "lenient_display_mode")]
    pub display_mode: DisplayMode,

    /// Base URL that ticket IDs are appended to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_base_url: Option<String>,

    /// Glyph overrides.
    #[serde(default, skip_serializing_if = "EmojiOverrides::is_empty")]
    pub emojis: EmojiOverrides,
}

fn lenient_display_mode<'de, D>(deserializer: D) -> Result<DisplayMode, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(match raw {
        Some(value) => value.parse().unwrap_or_else(|err: DisplayModeError| {
            warn!(value = %value, error = %err, "Unknown displayMode, using emoji");
            DisplayMode::Emoji
        }),
        None => DisplayMode::Emoji,
    })
}

impl Config {
    /// Loads a config file.
    ///
    /// Returns `Ok(None)` when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Option<Self>, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Applies `TODONUKEM_DISPLAY_MODE` and `TODONUKEM_TICKET_BASE_URL`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the display mode is not one of
    /// `emoji`, `text` or `emoji-text`.
    pub fn apply_env(mut self) -> Result<Self, ConfigError> {
        if let Ok(val) = env::var(ENV_DISPLAY_MODE) {
            self.display_mode = val
                .parse()
                .map_err(|e: DisplayModeError| ConfigError::InvalidValue {
                    key: ENV_DISPLAY_MODE.to_string(),
                    message: e.to_string(),
                })?;
        }

        if let Ok(val) = env::var(ENV_TICKET_BASE_URL) {
            let trimmed = val.trim();
            self.ticket_base_url = (!trimmed.is_empty()).then(|| trimmed.to_string());
        }

        Ok(self)
    }

    /// Builds the vocabulary with this config's glyph overrides applied.
    #[must_use]
    pub fn vocabulary(&self) -> Vocabulary {
        Vocabulary::with_overrides(&self.emojis)
    }
}

/// Cached configuration context for one workspace.
///
/// Holds the loaded [`Config`] until [`invalidate`](Self::invalidate) is
/// called; the next [`get`](Self::get) re-reads the file.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    cached: Option<Arc<Config>>,
    last_good: Option<Arc<Config>>,
}

impl ConfigStore {
    /// Creates a store for `<workspace_root>/todonukem.json`.
    #[must_use]
    pub fn new(workspace_root: &Path) -> Self {
        Self::with_path(workspace_root.join(CONFIG_FILE_NAME))
    }

    /// Creates a store for an explicit config file path.
    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            cached: None,
            last_good: None,
        }
    }

    /// Creates a store honouring `TODONUKEM_CONFIG`, falling back to the
    /// workspace root.
    #[must_use]
    pub fn from_env(workspace_root: &Path) -> Self {
        match env::var(ENV_CONFIG_PATH) {
            Ok(path) if !path.trim().is_empty() => Self::with_path(PathBuf::from(path.trim())),
            _ => Self::new(workspace_root),
        }
    }

    /// Path of the backing config file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the cached configuration, loading it first if needed.
    ///
    /// File problems degrade to the last good configuration or the defaults.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` only for invalid environment overrides.
    pub fn get(&mut self) -> Result<Arc<Config>, ConfigError> {
        if let Some(config) = &self.cached {
            return Ok(Arc::clone(config));
        }

        let from_file = match Config::load(&self.path) {
            Ok(Some(config)) => {
                debug!(path = %self.path.display(), "Loaded config file");
                config
            }
            Ok(None) => {
                debug!(path = %self.path.display(), "No config file, using defaults");
                Config::default()
            }
            Err(e) => {
                warn!(error = %e, "Failed to load config, keeping previous configuration");
                self.last_good
                    .as_deref()
                    .cloned()
                    .unwrap_or_default()
            }
        };

        let config = Arc::new(from_file.apply_env()?);
        self.last_good = Some(Arc::clone(&config));
        self.cached = Some(Arc::clone(&config));
        Ok(config)
    }

    /// Drops the cached configuration so the next `get` reloads the file.
    pub fn invalidate(&mut self) {
        self.cached = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocabulary::Priority;

    #[test]
    fn config_error_invalid_value_display() {
        let err = ConfigError::InvalidValue {
            key: ENV_DISPLAY_MODE.to_string(),
            message: "expected one of emoji, text, emoji-text; got 'glyph'".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid value for TODONUKEM_DISPLAY_MODE: expected one of emoji, text, emoji-text; got 'glyph'"
        );
    }

    #[test]
    fn parses_full_config() {
        let json = r#"{
            "displayMode": "emoji-text",
            "ticketBaseUrl": "https://jira.example.com/browse",
            "emojis": {
                "priority": { "high": "🔥" },
                "type": { "fix": "🔧" },
                "meta": { "blockCommit": "🚫" }
            }
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.display_mode, DisplayMode::EmojiText);
        assert_eq!(
            config.ticket_base_url.as_deref(),
            Some("https://jira.example.com/browse")
        );
        assert_eq!(
            config.emojis.glyph_for(VocabKey::Priority(Priority::High)),
            Some("🔥")
        );
        assert_eq!(
            config.emojis.glyph_for(VocabKey::Meta(Meta::BlockCommit)),
            Some("🚫")
        );
    }

    #[test]
    fn empty_object_is_default() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.display_mode, DisplayMode::Emoji);
    }

    #[test]
    fn unknown_display_mode_falls_back_to_emoji() {
        let json = r#"{ "displayMode": "sparkles", "ticketBaseUrl": "https://t" }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.display_mode, DisplayMode::Emoji);
        assert_eq!(config.ticket_base_url.as_deref(), Some("https://t"));
    }

    #[test]
    fn blank_override_is_ignored() {
        let mut overrides = EmojiOverrides::default();
        overrides
            .priority
            .insert("low".to_string(), "   ".to_string());
        assert_eq!(overrides.glyph_for(VocabKey::Priority(Priority::Low)), None);
    }

    #[test]
    fn vocabulary_uses_overrides() {
        let mut config = Config::default();
        config
            .emojis
            .priority
            .insert("high".to_string(), "🔥".to_string());

        let vocabulary = config.vocabulary();
        assert_eq!(vocabulary.glyph(VocabKey::Priority(Priority::High)), "🔥");
        assert_eq!(vocabulary.glyph(VocabKey::Priority(Priority::Low)), "🟩");
    }

    #[test]
    fn load_missing_file_is_none() {
        let dir = tempfile::TempDir::new().unwrap();
        let loaded = Config::load(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn load_malformed_file_is_parse_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "{ not json").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
