//! # Delivery Documents
//!
//! Supplier delivery notes drafted at the counter and pushed to the backend
//! once complete.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  new(number, supplier, date)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  add_line(medicine, qty) ── same medicine again? ignored               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DeliveryBook::save() ── header + ≥ 1 line required                    │
//! │       │                   (stored locally under "documents")            │
//! │       ▼                                                                 │
//! │  push to backend ──► mark_pushed()  (never pushed twice)                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Medicine, MedicineId};
use crate::validation::{validate_delivery_header, validate_quantity};

// =============================================================================
// Delivery Line
// =============================================================================

/// One received medicine on a delivery note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryLine {
    pub medicine_id: MedicineId,
    pub medicine_name: String,
    pub quantity: i64,
    /// Public unit price.
    pub ppv: Money,
    /// Pharmacist unit price.
    pub ph: Money,
}

impl DeliveryLine {
    pub fn total_ppv(&self) -> Money {
        self.ppv.multiply_quantity(self.quantity)
    }

    pub fn total_ph(&self) -> Money {
        self.ph.multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Delivery Document
// =============================================================================

/// A delivery note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryDocument {
    pub number: String,
    pub supplier: String,
    pub received_on: NaiveDate,
    pub lines: Vec<DeliveryLine>,
    #[serde(default)]
    pub pushed: bool,
}

impl DeliveryDocument {
    pub fn new(number: impl Into<String>, supplier: impl Into<String>, received_on: NaiveDate) -> Self {
        DeliveryDocument {
            number: number.into().trim().to_string(),
            supplier: supplier.into().trim().to_string(),
            received_on,
            lines: Vec::new(),
            pushed: false,
        }
    }

    /// Adds a received medicine.
    ///
    /// ## Returns
    /// - `Ok(true)` line added
    /// - `Ok(false)` medicine already on the note; nothing changed
    pub fn add_line(&mut self, medicine: &Medicine, quantity: i64) -> CoreResult<bool> {
        validate_quantity(quantity)?;

        if self.lines.iter().any(|l| l.medicine_id == medicine.id) {
            return Ok(false);
        }

        self.lines.push(DeliveryLine {
            medicine_id: medicine.id,
            medicine_name: medicine.name.clone(),
            quantity,
            ppv: medicine.ppv,
            ph: medicine.ph,
        });
        Ok(true)
    }

    /// Removes a line; returns whether one was there.
    pub fn remove_line(&mut self, medicine_id: MedicineId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.medicine_id != medicine_id);
        self.lines.len() != before
    }

    pub fn article_count(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn total_ppv(&self) -> Money {
        self.lines.iter().map(DeliveryLine::total_ppv).sum()
    }

    pub fn total_ph(&self) -> Money {
        self.lines.iter().map(DeliveryLine::total_ph).sum()
    }

    /// Checks the note can be saved.
    ///
    /// ## Rules
    /// - Document number and supplier required
    /// - At least one line
    pub fn validate(&self) -> CoreResult<()> {
        validate_delivery_header(&self.number, &self.supplier)?;
        if self.lines.is_empty() {
            return Err(ValidationError::Required {
                field: "items".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

// =============================================================================
// Delivery Book
// =============================================================================

/// All locally drafted notes, in creation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeliveryBook {
    documents: Vec<DeliveryDocument>,
}

impl DeliveryBook {
    pub fn new(documents: Vec<DeliveryDocument>) -> Self {
        DeliveryBook { documents }
    }

    pub fn documents(&self) -> &[DeliveryDocument] {
        &self.documents
    }

    pub fn get(&self, number: &str) -> Option<&DeliveryDocument> {
        self.documents.iter().find(|d| d.number == number.trim())
    }

    /// Saves a validated note.
    ///
    /// An unpushed draft with the same number is replaced; a pushed one is
    /// kept and the save is refused.
    pub fn save(&mut self, document: DeliveryDocument) -> CoreResult<()> {
        document.validate()?;

        match self
            .documents
            .iter_mut()
            .find(|d| d.number == document.number)
        {
            Some(existing) if existing.pushed => Err(ValidationError::Duplicate {
                field: "document number".to_string(),
                value: document.number,
            }
            .into()),
            Some(existing) => {
                *existing = document;
                Ok(())
            }
            None => {
                self.documents.push(document);
                Ok(())
            }
        }
    }

    /// Flags a note as sent to the backend.
    pub fn mark_pushed(&mut self, number: &str) -> CoreResult<()> {
        let document = self
            .documents
            .iter_mut()
            .find(|d| d.number == number.trim())
            .ok_or_else(|| CoreError::Validation(ValidationError::InvalidFormat {
                field: "document number".to_string(),
                reason: format!("no draft numbered '{}'", number),
            }))?;

        if document.pushed {
            return Err(CoreError::AlreadyPushed(document.number.clone()));
        }
        document.pushed = true;
        Ok(())
    }

    /// Drops a note; returns it when found.
    pub fn remove(&mut self, number: &str) -> Option<DeliveryDocument> {
        let index = self.documents.iter().position(|d| d.number == number.trim())?;
        Some(self.documents.remove(index))
    }

    /// Notes not yet pushed.
    pub fn pending(&self) -> impl Iterator<Item = &DeliveryDocument> {
        self.documents.iter().filter(|d| !d.pushed)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::medicine;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 12).unwrap()
    }

    fn note(number: &str) -> DeliveryDocument {
        let mut doc = DeliveryDocument::new(number, "Sothema", date());
        let mut med = medicine(1, "611", "DOLIPRANE", 1560);
        med.ph = Money::from_cents(1040);
        doc.add_line(&med, 10).unwrap();
        doc
    }

    #[test]
    fn test_line_totals() {
        let doc = note("BL-1");
        let line = &doc.lines[0];
        assert_eq!(line.total_ppv().cents(), 15600);
        assert_eq!(line.total_ph().cents(), 10400);
        assert_eq!(doc.article_count(), 10);
    }

    #[test]
    fn test_duplicate_medicine_ignored() {
        let mut doc = note("BL-1");
        let again = medicine(1, "611", "DOLIPRANE", 1560);
        assert!(!doc.add_line(&again, 5).unwrap());
        assert_eq!(doc.lines.len(), 1);
        assert_eq!(doc.lines[0].quantity, 10);
    }

    #[test]
    fn test_non_positive_quantity_rejected() {
        let mut doc = DeliveryDocument::new("BL-1", "Sothema", date());
        assert!(doc.add_line(&medicine(1, "1", "A", 100), 0).is_err());
    }

    #[test]
    fn test_validate_requires_header_and_items() {
        let empty = DeliveryDocument::new("BL-1", "Sothema", date());
        assert!(empty.validate().is_err());

        let mut no_supplier = note("BL-1");
        no_supplier.supplier.clear();
        assert!(no_supplier.validate().is_err());

        assert!(note("BL-1").validate().is_ok());
    }

    #[test]
    fn test_book_save_replace_and_remove() {
        let mut book = DeliveryBook::default();
        book.save(note("BL-1")).unwrap();
        book.save(note("BL-2")).unwrap();

        let mut edited = note("BL-1");
        edited.supplier = "Cooper".to_string();
        book.save(edited).unwrap();

        assert_eq!(book.documents().len(), 2);
        assert_eq!(book.get("BL-1").unwrap().supplier, "Cooper");

        assert!(book.remove("BL-2").is_some());
        assert!(book.remove("BL-2").is_none());
    }

    #[test]
    fn test_push_only_once() {
        let mut book = DeliveryBook::default();
        book.save(note("BL-1")).unwrap();

        book.mark_pushed("BL-1").unwrap();
        assert!(matches!(
            book.mark_pushed("BL-1"),
            Err(CoreError::AlreadyPushed(_))
        ));
        assert_eq!(book.pending().count(), 0);

        // a pushed note can't be overwritten by a new draft
        assert!(book.save(note("BL-1")).is_err());
    }

    #[test]
    fn test_book_serializes_as_plain_list() {
        let mut book = DeliveryBook::default();
        book.save(note("BL-1")).unwrap();
        let json = serde_json::to_value(&book).unwrap();
        assert!(json.is_array());
    }
}
