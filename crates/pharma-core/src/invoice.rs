//! # Invoice
//!
//! Printable invoice for the cart being sold.
//!
//! ## Layout
//! ```text
//!                               FACTURE
//! PHARMACIE EL ABAWAIN
//! Date : 12/10/2025 18:30
//! ----------------------------------------------------------------------
//! Désignation                        Quantité         PPV    Prix Total
//! ----------------------------------------------------------------------
//! DOLIPRANE 500MG                           2    15.60 DH      31.20 DH
//! ----------------------------------------------------------------------
//! Nombre d'articles : 2
//! Total : 31.20 DH
//! ```

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::cart::Cart;
use crate::money::Money;

const WIDTH: usize = 70;

/// One invoice row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLine {
    pub designation: String,
    pub quantity: i64,
    pub ppv: Money,
    pub total: Money,
}

/// An invoice built from a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub pharmacy: String,
    pub issued_at: NaiveDateTime,
    pub lines: Vec<InvoiceLine>,
    pub article_count: i64,
    pub total: Money,
}

impl Invoice {
    /// Snapshots the cart. Line totals include discounts.
    pub fn from_cart(cart: &Cart, pharmacy: impl Into<String>, issued_at: NaiveDateTime) -> Self {
        Invoice {
            pharmacy: pharmacy.into(),
            issued_at,
            lines: cart
                .items
                .iter()
                .map(|item| InvoiceLine {
                    designation: item.medicine.name.clone(),
                    quantity: item.quantity,
                    ppv: item.medicine.ppv,
                    total: item.line_total(),
                })
                .collect(),
            article_count: cart.article_count(),
            total: cart.total(),
        }
    }

    /// Renders the invoice as fixed-width text.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Invoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "-".repeat(WIDTH);

        writeln!(f, "{:^width$}", "FACTURE", width = WIDTH)?;
        writeln!(f, "{}", self.pharmacy)?;
        writeln!(f, "Date : {}", self.issued_at.format("%d/%m/%Y %H:%M"))?;
        writeln!(f, "{}", rule)?;
        writeln!(
            f,
            "{:<32} {:>10} {:>12} {:>13}",
            "Désignation", "Quantité", "PPV", "Prix Total"
        )?;
        writeln!(f, "{}", rule)?;
        for line in &self.lines {
            writeln!(
                f,
                "{:<32} {:>10} {:>12} {:>13}",
                truncate(&line.designation, 32),
                line.quantity,
                line.ppv.to_string(),
                line.total.to_string()
            )?;
        }
        writeln!(f, "{}", rule)?;
        writeln!(f, "Nombre d'articles : {}", self.article_count)?;
        writeln!(f, "Total : {}", self.total)
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max - 1).chain(std::iter::once('…')).collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
