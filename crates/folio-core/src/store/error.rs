//! Store error handling
//!
//! Typed errors for hosted-store operations. Every variant keeps a message
//! that can be shown to an admin as-is.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while talking to the hosted store
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Store URL or key missing from configuration
    #[error("Store is not configured: {0}. Set store_url and store_key.")]
    NotConfigured(String),

    /// Network failure before a response arrived
    #[error("Network error talking to the store: {0}")]
    Transport(String),

    /// Call exceeded the configured timeout
    #[error("Store request timed out after {0:?}")]
    Timeout(Duration),

    /// Store answered with an error status
    #[error("Store rejected the request ({status}): {message}")]
    Http { status: u16, message: String },

    /// Response body could not be decoded
    #[error("Invalid response from store: {0}")]
    Decode(String),

    /// Request refused by the store itself (policies, constraints)
    #[error("{0}")]
    Rejected(String),

    /// Change-notification channel failure
    #[error("Realtime channel error: {0}")]
    Realtime(String),
}

impl StoreError {
    /// Classify a transport-level `reqwest` error
    pub fn from_reqwest(error: reqwest::Error, timeout: Duration) -> Self {
        if error.is_timeout() {
            StoreError::Timeout(timeout)
        } else if error.is_decode() {
            StoreError::Decode(error.to_string())
        } else {
            StoreError::Transport(error.to_string())
        }
    }

    /// The message to surface inline, without the variant prefix where the
    /// store already supplied one
    pub fn message(&self) -> String {
        match self {
            StoreError::Http { message, .. } => message.clone(),
            StoreError::Rejected(message) => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, StoreError::Timeout(_))
    }

    /// Whether the store refused the caller's credentials
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, StoreError::Http { status: 401 | 403, .. })
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_message_is_store_message() {
        let err = StoreError::Http {
            status: 400,
            message: "null value in column \"title\"".to_string(),
        };
        assert_eq!(err.message(), "null value in column \"title\"");
        assert!(err.to_string().contains("400"));
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn test_unauthorized_classification() {
        let err = StoreError::Http {
            status: 401,
            message: "JWT expired".to_string(),
        };
        assert!(err.is_unauthorized());
    }

    #[test]
    fn test_timeout_display() {
        let err = StoreError::Timeout(Duration::from_secs(15));
        assert!(err.is_timeout());
        assert!(err.message().contains("timed out"));
    }

    #[test]
    fn test_not_configured_suggests_fix() {
        let err = StoreError::NotConfigured("store_url missing".to_string());
        assert!(err.to_string().contains("store_url"));
    }
}
