//! # Client Error Types
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Client Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Transport     │  │     Backend answer      │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidUrl     │  │  Network        │  │  NotFound   (404)       │ │
//! │  │  Build          │  │  Timeout        │  │  Conflict   (409)       │ │
//! │  │                 │  │                 │  │  Status     (other)     │ │
//! │  │                 │  │                 │  │  Decode                 │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here is retried: every failure goes straight to the operator.

use thiserror::Error;

/// Result type alias for backend calls.
pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Base URL does not parse or cannot be joined with a path.
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),

    /// The HTTP client could not be built.
    #[error("Cannot build HTTP client: {0}")]
    Build(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// Connection refused, DNS failure, reset.
    #[error("Backend unreachable: {0}")]
    Network(String),

    /// No answer within the configured timeout.
    #[error("Backend did not answer in time")]
    Timeout,

    // =========================================================================
    // Backend Answers
    // =========================================================================
    /// 404 on a specific resource.
    #[error("Not found: {0}")]
    NotFound(String),

    /// 409, e.g. a username that already exists.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Any other non-2xx status.
    #[error("Backend answered {status} for {endpoint}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// 2xx with a body that does not match the expected shape.
    #[error("Unexpected response from {endpoint}: {reason}")]
    Decode { endpoint: String, reason: String },
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else if err.is_builder() {
            ClientError::Build(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::InvalidUrl(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl ClientError {
    /// True when the backend could not be reached at all.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, ClientError::Network(_) | ClientError::Timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreachable_classification() {
        assert!(ClientError::Timeout.is_unreachable());
        assert!(ClientError::Network("refused".into()).is_unreachable());
        assert!(!ClientError::Conflict("amina".into()).is_unreachable());
    }

    #[test]
    fn test_status_message() {
        let err = ClientError::Status {
            endpoint: "sales".into(),
            status: 500,
            body: "boom".into(),
        };
        assert_eq!(err.to_string(), "Backend answered 500 for sales: boom");
    }
}
