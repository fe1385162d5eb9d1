//! Core error types for Surveyor.
//!
//! This module defines the central error type used by the value model and
//! configuration layer. Worker and engine crates wrap it in their own enums.

use crate::value::ValueKind;
use thiserror::Error;

/// Central error type for core Surveyor operations.
#[derive(Error, Debug)]
pub enum SurveyorError {
    /// Configuration errors (file loading, parsing, validation)
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A raw string could not be classified into any known value kind
    #[error("unrecognized value: '{raw}'")]
    UnknownValue {
        /// The input that failed classification
        raw: String,
    },

    /// A raw string does not satisfy the canonical-form rules of a kind
    #[error("invalid {kind} value: {reason}")]
    InvalidValue {
        /// Kind the caller asked for
        kind: ValueKind,
        /// Why the payload was rejected
        reason: String,
    },

    /// Validation errors (invalid identifiers, constraints)
    #[error("validation error: {0}")]
    Validation(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to determine config directory path
    #[error("could not determine config directory (XDG base directories not available)")]
    NoConfigDir,

    /// Config file not found
    #[error("config file not found at {path}")]
    NotFound {
        /// Path where config was expected
        path: String,
    },

    /// Failed to parse TOML
    #[error("failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize config
    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// I/O error reading/writing config
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration value
    #[error("invalid config value for {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Reason for invalidity
        reason: String,
    },
}

/// Result type alias using `SurveyorError`.
pub type Result<T> = std::result::Result<T, SurveyorError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
