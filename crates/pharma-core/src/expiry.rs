//! # Expiry Batches
//!
//! Every stock line carries an expiry batch encoded as six digits,
//! month first then year, with no separator: `MMYYYY`.
//!
//! ## Format
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │   "032027"                                                              │
//! │    ──┬─────                                                             │
//! │      │  └──── year  (4 digits, any)                                     │
//! │      └─────── month (01-12)                                             │
//! │                                                                         │
//! │   Accepted:  ^(0[1-9]|1[0-2])\d{4}$                                     │
//! │   Rejected:  "3-2027", "132027", "2027-03", "03/2027", ""               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The backend stores the raw string (`datE_PER`); this type is the only
//! place the encoding is produced or checked.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::validation::ValidationResult;

/// A validated month + year expiry batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExpiryBatch {
    // Field order gives chronological ordering.
    year: u16,
    month: u8,
}

impl ExpiryBatch {
    /// Creates a batch from month (1-12) and year.
    pub fn new(month: u32, year: i32) -> ValidationResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(ValidationError::OutOfRange {
                field: "expiry month".to_string(),
                min: 1,
                max: 12,
            });
        }
        if !(0..=9999).contains(&year) {
            return Err(ValidationError::OutOfRange {
                field: "expiry year".to_string(),
                min: 0,
                max: 9999,
            });
        }
        Ok(ExpiryBatch {
            year: year as u16,
            month: month as u8,
        })
    }

    /// Parses the `MMYYYY` encoding.
    ///
    /// ## Example
    /// ```rust
    /// use pharma_core::expiry::ExpiryBatch;
    ///
    /// let batch = ExpiryBatch::parse("032027").unwrap();
    /// assert_eq!(batch.month(), 3);
    /// assert_eq!(batch.year(), 2027);
    ///
    /// assert!(ExpiryBatch::parse("132027").is_err());
    /// ```
    pub fn parse(raw: &str) -> ValidationResult<Self> {
        let invalid = || ValidationError::InvalidFormat {
            field: "expiry".to_string(),
            reason: format!("'{}' is not MMYYYY", raw),
        };

        if raw.len() != 6 || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let month: u32 = raw[..2].parse().map_err(|_| invalid())?;
        let year: i32 = raw[2..].parse().map_err(|_| invalid())?;

        if !(1..=12).contains(&month) {
            return Err(invalid());
        }

        ExpiryBatch::new(month, year)
    }

    /// Builds the batch a calendar date falls in.
    ///
    /// The product form takes a full date and keeps month + year only.
    pub fn from_date(date: NaiveDate) -> ValidationResult<Self> {
        ExpiryBatch::new(date.month(), date.year())
    }

    /// Parses either `MMYYYY` or an ISO date (`YYYY-MM-DD` / `YYYY-MM`).
    pub fn parse_flexible(raw: &str) -> ValidationResult<Self> {
        let raw = raw.trim();
        if let Ok(batch) = ExpiryBatch::parse(raw) {
            return Ok(batch);
        }
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return ExpiryBatch::from_date(date);
        }
        if let Ok(date) = NaiveDate::parse_from_str(&format!("{}-01", raw), "%Y-%m-%d") {
            return ExpiryBatch::from_date(date);
        }
        Err(ValidationError::InvalidFormat {
            field: "expiry".to_string(),
            reason: format!("'{}' is neither MMYYYY nor YYYY-MM-DD", raw),
        })
    }

    /// Month, 1-12.
    pub fn month(&self) -> u32 {
        self.month as u32
    }

    /// Four-digit year.
    pub fn year(&self) -> i32 {
        self.year as i32
    }

    /// True when the whole batch month is before `today`'s month.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        (self.year as i32, self.month as u32) < (today.year(), today.month())
    }
}

/// Renders the wire encoding.
impl fmt::Display for ExpiryBatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}{:04}", self.month, self.year)
    }
}

impl FromStr for ExpiryBatch {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExpiryBatch::parse(s)
    }
}

impl Serialize for ExpiryBatch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ExpiryBatch {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ExpiryBatch::parse(&raw).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
