//! # Error Types
//!
//! Domain-specific error types for pharma-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  pharma-core errors (this file)                                        │
//! │  ├── CoreError        - Business rule failures                         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  pharma-store errors (separate crate)                                  │
//! │  └── StoreError       - Local storage failures                         │
//! │                                                                         │
//! │  pharma-api errors (separate crate)                                    │
//! │  └── ClientError      - Backend/network failures                       │
//! │                                                                         │
//! │  Counter app errors                                                    │
//! │  └── CommandError     - What the operator sees (code + message)        │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → CommandError → Terminal           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::types::MedicineId;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No catalog entry matches a code or a name.
    ///
    /// ## When This Occurs
    /// - Scanned barcode is not in the catalog
    /// - Manual name search has no hit
    #[error("Medicine not found: {0}")]
    MedicineNotFound(String),

    /// A name search matched more than one medicine.
    ///
    /// ## User Workflow
    /// ```text
    /// Operator types: "doli"
    ///      │
    ///      ▼
    /// Contains-match: DOLIPRANE 500, DOLIPRANE 1000
    ///      │
    ///      ▼
    /// AmbiguousMedicine { query: "doli", candidates: [..] }
    ///      │
    ///      ▼
    /// Operator refines the name
    /// ```
    #[error("Several medicines match '{query}': {}", candidates.join(", "))]
    AmbiguousMedicine {
        query: String,
        candidates: Vec<String>,
    },

    /// Cart operation referenced a medicine that is not in the cart.
    #[error("Medicine {0} is not in the cart")]
    NotInCart(MedicineId),

    /// Checkout was attempted with nothing to sell.
    #[error("Cart is empty")]
    EmptyCart,

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} lines")]
    CartTooLarge { max: usize },

    /// Line quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Payment amount is invalid for the credit.
    #[error("Invalid payment amount: {reason}")]
    InvalidPaymentAmount { reason: String },

    /// The last remaining user account cannot be removed.
    #[error("Cannot delete the last remaining user")]
    LastUser,

    /// A delivery document was already sent to the backend.
    #[error("Delivery document {0} has already been pushed")]
    AlreadyPushed(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when operator input doesn't meet requirements.
/// Used for early validation before anything is sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., malformed expiry batch, bad date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (e.g., duplicate username).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
