//! Typed errors for the listing evaluation library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) so callers can tell a
//! fatal configuration problem apart from a per-listing failure.

use ai_client::VisionError;
use thiserror::Error;

/// Errors that can occur while evaluating listings.
#[derive(Debug, Error)]
pub enum EvalError {
    /// Configuration error (missing API key, unknown provider)
    #[error("config error: {0}")]
    Config(String),

    /// Vision provider call failed without a retry succeeding
    #[error("vision provider error: {0}")]
    Vision(#[from] VisionError),

    /// Storage operation failed
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EvalError {
    pub(crate) fn storage(e: impl std::fmt::Display) -> Self {
        Self::Storage(e.to_string().into())
    }
}

/// Result type alias for evaluation operations.
pub type Result<T> = std::result::Result<T, EvalError>;
