//! Error types for avd-runner core
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// Errors raised while loading or saving shared state
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
