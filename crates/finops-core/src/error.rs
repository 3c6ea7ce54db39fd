//! Error types for FinOps core

use thiserror::Error;

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error type
///
/// Only construction can fail; clock and demand arithmetic is infallible.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Invalid scale factor {0}: must be finite and > 0")]
    InvalidScaleFactor(f64),

    #[error("Invalid base rate {0}: must be finite and >= 0")]
    InvalidBaseRate(f64),
}

/// Failure at the payload generation boundary.
///
/// The scheduler treats every variant the same way: log, skip the tick.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Missing API key (set {0})")]
    MissingApiKey(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Generator returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Generator returned no content")]
    EmptyResponse,

    #[error("Unparsable generator output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Generator output is not a JSON object (got {0})")]
    NotAnObject(String),
}

impl GenerationError {
    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }
}
