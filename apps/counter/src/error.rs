//! # Command Error Type
//!
//! Unified error type for counter commands.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Counter                            │
//! │                                                                         │
//! │  Command function  →  Result<T, CommandError>                          │
//! │         │                                                               │
//! │         ├── ClientError (pharma-api)   ── NETWORK_ERROR / NOT_FOUND /  │
//! │         │                                 CONFLICT                      │
//! │         ├── CoreError (pharma-core)    ── VALIDATION_ERROR / NOT_FOUND │
//! │         ├── StoreError (pharma-store)  ── STORAGE_ERROR                │
//! │         ├── ConfigError (config.rs)    ── CONFIG_ERROR                 │
//! │         └── route guard                ── UNAUTHORIZED / FORBIDDEN     │
//! │                                                                         │
//! │  main: eprintln!("error [NOT_FOUND]: Medicine not found: 611")         │
//! │        exit code 1                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use pharma_api::ClientError;
use pharma_core::{CoreError, ValidationError};
use pharma_store::StoreError;
use serde::Serialize;
use std::fmt;

use crate::config::ConfigError;

/// Error returned from counter commands.
///
/// ## Serialization
/// With `--json`-style consumers in mind the error serializes as:
/// ```json
/// { "code": "NOT_FOUND", "message": "Medicine not found: 611" }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable message for the operator
    pub message: String,
}

/// Stable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Barcode, name, id or document without a match
    NotFound,

    /// Input rejected before anything was sent
    ValidationError,

    /// Backend refused a duplicate (409)
    Conflict,

    /// Backend unreachable or answered with an error status
    NetworkError,

    /// Local store failure
    StorageError,

    /// No operator logged in
    Unauthorized,

    /// Screen reserved to administrators
    Forbidden,

    /// Configuration file or environment invalid
    ConfigError,

    /// Anything else
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::NetworkError => "NETWORK_ERROR",
            ErrorCode::StorageError => "STORAGE_ERROR",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::ConfigError => "CONFIG_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl CommandError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        CommandError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(what: &str, key: &str) -> Self {
        CommandError::new(ErrorCode::NotFound, format!("{} not found: {}", what, key))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        CommandError::new(ErrorCode::ValidationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        CommandError::new(ErrorCode::InternalError, message)
    }
}

/// Result type for command functions.
pub type CommandResult<T> = Result<T, CommandError>;

// =============================================================================
// Conversions
// =============================================================================

impl From<CoreError> for CommandError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        let code = match err {
            CoreError::MedicineNotFound(_) | CoreError::NotInCart(_) => ErrorCode::NotFound,
            CoreError::AlreadyPushed(_) => ErrorCode::Conflict,
            CoreError::AmbiguousMedicine { .. }
            | CoreError::EmptyCart
            | CoreError::CartTooLarge { .. }
            | CoreError::QuantityTooLarge { .. }
            | CoreError::InvalidPaymentAmount { .. }
            | CoreError::LastUser
            | CoreError::Validation(_) => ErrorCode::ValidationError,
        };
        CommandError::new(code, message)
    }
}

impl From<ValidationError> for CommandError {
    fn from(err: ValidationError) -> Self {
        CommandError::validation(err.to_string())
    }
}

impl From<ClientError> for CommandError {
    fn from(err: ClientError) -> Self {
        let code = match &err {
            ClientError::NotFound(_) => ErrorCode::NotFound,
            ClientError::Conflict(_) => ErrorCode::Conflict,
            ClientError::InvalidUrl(_) | ClientError::Build(_) => ErrorCode::ConfigError,
            ClientError::Network(_)
            | ClientError::Timeout
            | ClientError::Status { .. }
            | ClientError::Decode { .. } => ErrorCode::NetworkError,
        };
        CommandError::new(code, err.to_string())
    }
}

impl From<StoreError> for CommandError {
    fn from(err: StoreError) -> Self {
        tracing::error!(error = %err, "Local store failure");
        CommandError::new(ErrorCode::StorageError, err.to_string())
    }
}

impl From<ConfigError> for CommandError {
    fn from(err: ConfigError) -> Self {
        CommandError::new(ErrorCode::ConfigError, err.to_string())
    }
}

impl From<std::io::Error> for CommandError {
    fn from(err: std::io::Error) -> Self {
        CommandError::internal(format!("terminal I/O failed: {}", err))
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error [{}]: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for CommandError {}
