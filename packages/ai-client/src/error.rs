//! Error types for the AI client.

use thiserror::Error;

/// Result type for AI client operations.
pub type Result<T> = std::result::Result<T, VisionError>;

/// AI client errors.
#[derive(Debug, Clone, Error)]
pub enum VisionError {
    /// Configuration error (missing API key, invalid settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network error (connection failed, request timed out)
    #[error("Network error: {message}")]
    Network { message: String, timed_out: bool },

    /// API error (non-2xx response)
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Parse error (invalid JSON, unexpected response format)
    #[error("Parse error: {0}")]
    Parse(String),
}

impl VisionError {
    pub(crate) fn from_reqwest(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            return Self::Api {
                status: status.as_u16(),
                message: e.to_string(),
            };
        }
        Self::Network {
            timed_out: e.is_timeout(),
            message: e.to_string(),
        }
    }

    /// Whether a retry has a chance of succeeding.
    ///
    /// Rate limits (429), server errors (5xx) and transport failures are
    /// transient. Everything else (auth, bad request, parse) is not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network { .. } => true,
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            Self::Config(_) | Self::Parse(_) => false,
        }
    }

    /// HTTP status for API errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16) -> VisionError {
        VisionError::Api {
            status,
            message: "boom".into(),
        }
    }

    #[test]
    fn test_transient_classification() {
        assert!(api(429).is_transient());
        assert!(api(500).is_transient());
        assert!(api(503).is_transient());
        assert!(VisionError::Network {
            message: "reset".into(),
            timed_out: false
        }
        .is_transient());

        assert!(!api(400).is_transient());
        assert!(!api(401).is_transient());
        assert!(!api(404).is_transient());
        assert!(!VisionError::Parse("bad".into()).is_transient());
        assert!(!VisionError::Config("missing".into()).is_transient());
    }

    #[test]
    fn test_display_includes_status() {
        assert_eq!(api(429).to_string(), "API error (429): boom");
        assert_eq!(api(503).status(), Some(503));
        assert_eq!(VisionError::Parse("x".into()).status(), None);
    }
}
