//! Error types for the generator

use finops_core::CoreError;
use thiserror::Error;

/// Generator result type
pub type Result<T> = std::result::Result<T, GeneratorError>;

/// Errors that can occur while wiring up the generator
///
/// Runtime tick failures never surface here; they are logged and skipped.
#[derive(Error, Debug)]
pub enum GeneratorError {
    /// Configuration error (fatal at startup)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid clock or demand parameters
    #[error("Model error: {0}")]
    Core(#[from] CoreError),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GeneratorError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
