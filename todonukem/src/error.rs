//! Error types for TODO NUKEM.
//!
//! Each module defines its own error enum; [`NukemError`] folds them together
//! for callers that drive several stages at once.

use thiserror::Error;

use crate::aggregator::IndexError;
use crate::config::ConfigError;
use crate::grammar::GrammarError;

/// Errors that can occur anywhere in the crate.
#[derive(Error, Debug)]
pub enum NukemError {
    /// Configuration-related error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Vocabulary-derived patterns failed to compile.
    #[error("grammar error: {0}")]
    Grammar(#[from] GrammarError),

    /// Marker index error.
    #[error("index error: {0}")]
    Index(#[from] IndexError),

    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized `Result` type for TODO NUKEM operations.
pub type Result<T> = std::result::Result<T, NukemError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = NukemError::Config(ConfigError::InvalidValue {
            key: "TODONUKEM_DISPLAY_MODE".to_string(),
            message: "expected one of emoji, text, emoji-text; got 'icons'".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "configuration error: invalid value for TODONUKEM_DISPLAY_MODE: \
             expected one of emoji, text, emoji-text; got 'icons'"
        );
    }

    #[test]
    fn index_error_conversion() {
        let err: NukemError = IndexError::ScanInProgress.into();
        assert!(matches!(err, NukemError::Index(_)));
        assert_eq!(
            err.to_string(),
            "index error: a workspace scan is already in progress"
        );
    }

    #[test]
    fn grammar_error_conversion() {
        let regex_err = regex::Regex::new("(unclosed").unwrap_err();
        let err: NukemError = GrammarError::from(regex_err).into();
        assert!(matches!(err, NukemError::Grammar(_)));
        assert!(err.to_string().starts_with("grammar error: failed to compile"));
    }

    #[test]
    fn io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: NukemError = io_err.into();
        assert!(matches!(err, NukemError::Io(_)));
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{ invalid json }").unwrap_err();
        let err: NukemError = json_err.into();
        assert!(matches!(err, NukemError::Json(_)));
        assert!(err.to_string().contains("JSON error"));
    }

    #[test]
    fn error_source_chain() {
        use std::error::Error;

        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: NukemError = io_err.into();
        assert!(err.source().is_some());
    }

    #[test]
    fn result_type_alias_works() {
        fn example_function() -> Result<i32> {
            Ok(42)
        }

        fn example_error_function() -> Result<i32> {
            Err(IndexError::ScanInProgress.into())
        }

        assert!(example_function().is_ok());
        assert!(example_error_function().is_err());
    }
}
