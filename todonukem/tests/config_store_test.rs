//! Integration tests for the configuration store and environment overrides.
//!
//! # Important Notes
//!
//! These tests modify environment variables and use the `serial_test` crate
//! to prevent interference between tests.

use std::env;
use std::fs;

use serial_test::serial;
use tempfile::TempDir;
use todonukem::config::{
    ConfigError, ConfigStore, CONFIG_FILE_NAME, ENV_CONFIG_PATH, ENV_DISPLAY_MODE,
    ENV_TICKET_BASE_URL,
};
use todonukem::vocabulary::{DisplayMode, Priority, VocabKey};

// =============================================================================
// Test Helpers
// =============================================================================

/// RAII guard that saves and restores an environment variable.
///
/// When dropped, the guard restores the environment variable to its
/// original value (or removes it if it was not set).
struct EnvGuard {
    name: String,
    original: Option<String>,
}

impl EnvGuard {
    fn new(name: &str) -> Self {
        let original = env::var(name).ok();
        Self {
            name: name.to_string(),
            original,
        }
    }

    fn set(&self, value: &str) {
        env::set_var(&self.name, value);
    }

    fn remove(&self) {
        env::remove_var(&self.name);
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match &self.original {
            Some(val) => env::set_var(&self.name, val),
            None => env::remove_var(&self.name),
        }
    }
}

/// Clears every TODONUKEM variable for the duration of a test.
fn clean_env() -> [EnvGuard; 3] {
    let guards = [
        EnvGuard::new(ENV_CONFIG_PATH),
        EnvGuard::new(ENV_DISPLAY_MODE),
        EnvGuard::new(ENV_TICKET_BASE_URL),
    ];
    for guard in &guards {
        guard.remove();
    }
    guards
}

fn write_config(dir: &TempDir, json: &str) {
    fs::write(dir.path().join(CONFIG_FILE_NAME), json).expect("write config");
}

// =============================================================================
// Caching and invalidation
// =============================================================================

#[test]
#[serial]
fn missing_file_yields_defaults() {
    let _env = clean_env();
    let dir = TempDir::new().unwrap();

    let mut store = ConfigStore::new(dir.path());
    let config = store.get().unwrap();

    assert_eq!(config.display_mode, DisplayMode::Emoji);
    assert!(config.ticket_base_url.is_none());
}

#[test]
#[serial]
fn config_is_cached_until_invalidated() {
    let _env = clean_env();
    let dir = TempDir::new().unwrap();
    write_config(&dir, r#"{ "displayMode": "text" }"#);

    let mut store = ConfigStore::new(dir.path());
    assert_eq!(store.get().unwrap().display_mode, DisplayMode::Text);

    write_config(&dir, r#"{ "displayMode": "emoji-text" }"#);
    assert_eq!(store.get().unwrap().display_mode, DisplayMode::Text);

    store.invalidate();
    assert_eq!(store.get().unwrap().display_mode, DisplayMode::EmojiText);
}

#[test]
#[serial]
fn malformed_file_keeps_last_good_config() {
    let _env = clean_env();
    let dir = TempDir::new().unwrap();
    write_config(
        &dir,
        r#"{ "displayMode": "text", "emojis": { "priority": { "high": "🔥" } } }"#,
    );

    let mut store = ConfigStore::new(dir.path());
    let good = store.get().unwrap();

    write_config(&dir, "{ broken");
    store.invalidate();
    let after = store.get().unwrap();

    assert_eq!(*after, *good);
    assert_eq!(
        after.vocabulary().glyph(VocabKey::Priority(Priority::High)),
        "🔥"
    );
}

#[test]
#[serial]
fn malformed_file_without_history_is_default() {
    let _env = clean_env();
    let dir = TempDir::new().unwrap();
    write_config(&dir, "[1, 2");

    let mut store = ConfigStore::new(dir.path());
    assert_eq!(store.get().unwrap().display_mode, DisplayMode::Emoji);
}

// =============================================================================
// Environment overrides
// =============================================================================

#[test]
#[serial]
fn env_overrides_file_values() {
    let env = clean_env();
    let dir = TempDir::new().unwrap();
    write_config(
        &dir,
        r#"{ "displayMode": "text", "ticketBaseUrl": "https://file.example" }"#,
    );
    env[1].set("emoji-text");
    env[2].set("https://env.example/browse");

    let mut store = ConfigStore::new(dir.path());
    let config = store.get().unwrap();

    assert_eq!(config.display_mode, DisplayMode::EmojiText);
    assert_eq!(
        config.ticket_base_url.as_deref(),
        Some("https://env.example/browse")
    );
}

#[test]
#[serial]
fn invalid_env_display_mode_is_an_error() {
    let env = clean_env();
    let dir = TempDir::new().unwrap();
    env[1].set("glyphs");

    let mut store = ConfigStore::new(dir.path());
    let err = store.get().unwrap_err();

    assert!(matches!(err, ConfigError::InvalidValue { .. }));
    assert!(err.to_string().contains(ENV_DISPLAY_MODE));
    assert!(err
        .to_string()
        .ends_with("expected one of emoji, text, emoji-text; got 'glyphs'"));
}

#[test]
#[serial]
fn config_path_from_env() {
    let env = clean_env();
    let dir = TempDir::new().unwrap();
    let custom = dir.path().join("custom.json");
    fs::write(&custom, r#"{ "ticketBaseUrl": "https://custom.example" }"#).unwrap();
    env[0].set(custom.to_str().unwrap());

    let mut store = ConfigStore::from_env(dir.path());
    assert_eq!(store.path(), custom.as_path());
    assert_eq!(
        store.get().unwrap().ticket_base_url.as_deref(),
        Some("https://custom.example")
    );
}
