//! # Validation Module
//!
//! Input validation for everything the operator types before it reaches
//! the backend.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: CLI parsing (clap)                                           │
//! │  └── Types: numbers are numbers, dates are dates                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Required fields, lengths                                          │
//! │  ├── Quantities, discounts, payment amounts                            │
//! │  └── Expiry format (see `expiry`)                                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Backend                                                      │
//! │  └── Uniqueness (usernames → 409), referential checks                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::NewMedicine;
use crate::MAX_ITEM_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

fn required(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a barcode / product code.
///
/// ## Rules
/// - Must not be empty
/// - At most 64 characters
/// - No whitespace inside (scanners never emit it)
///
/// ## Example
/// ```rust
/// use pharma_core::validation::validate_code;
///
/// assert!(validate_code("6111245590012").is_ok());
/// assert!(validate_code("").is_err());
/// assert!(validate_code("611 124").is_err());
/// ```
pub fn validate_code(code: &str) -> ValidationResult<()> {
    required("code", code, 64)?;

    if code.trim().chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must not contain spaces".to_string(),
        });
    }

    Ok(())
}

/// Validates a medicine designation.
pub fn validate_medicine_name(name: &str) -> ValidationResult<()> {
    required("designation", name, 200)
}

/// Validates a username for the settings screen.
pub fn validate_username(name: &str) -> ValidationResult<()> {
    required("username", name, 50)
}

/// Validates a password for the settings screen.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    required("password", password, 100)
}

/// Validates the client name of a credit sale.
pub fn validate_client_name(name: &str) -> ValidationResult<()> {
    required("client name", name, 100)
}

/// Validates the header of a delivery document.
///
/// ## Rules
/// - Document number, supplier are required
pub fn validate_delivery_header(number: &str, supplier: &str) -> ValidationResult<()> {
    required("document number", number, 50)?;
    required("supplier", supplier, 100)?;
    Ok(())
}

/// Validates a search query; returns it trimmed.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a line discount in percent.
///
/// ## Rules
/// - 0 to 100 inclusive
pub fn validate_discount_percent(percent: u32) -> ValidationResult<()> {
    if percent > 100 {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0,
            max: 100,
        });
    }
    Ok(())
}

/// Validates a unit price.
///
/// ## Rules
/// - Must be non-negative (free samples are allowed)
pub fn validate_price(field: &str, price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

/// Validates a repayment against what is still owed.
///
/// ## Rules
/// - Must be positive
/// - Must not exceed the remaining balance
///
/// ## User Workflow
/// ```text
/// Credit: remaining 300.00 DH
///      │
///      ├── pay 0      → "amount must be positive"
///      ├── pay 450.00 → OutOfRange (more than is owed)
///      └── pay 120.00 → POST credits/{id}/payer
/// ```
pub fn validate_payment_amount(amount: Money, remaining: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }

    if amount > remaining {
        return Err(ValidationError::OutOfRange {
            field: "amount".to_string(),
            min: 1,
            max: remaining.cents(),
        });
    }

    Ok(())
}

// =============================================================================
// Composite Validators
// =============================================================================

/// Validates the new product form.
///
/// ## Rules
/// - Code and designation required
/// - Expiry already parsed (the type guarantees MMYYYY)
/// - Prices non-negative
pub fn validate_new_medicine(medicine: &NewMedicine) -> ValidationResult<()> {
    validate_code(&medicine.code)?;
    validate_medicine_name(&medicine.name)?;
    validate_price("ppv", medicine.ppv)?;
    if let Some(ph) = medicine.ph {
        validate_price("ph", ph)?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
