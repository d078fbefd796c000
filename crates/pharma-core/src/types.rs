//! # Domain Types
//!
//! Core domain types for the pharmacy counter.
//!
//! ## Entity Relationships
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Domain Model (owned by the backend)                  │
//! │                                                                         │
//! │  ┌──────────────┐         ┌──────────────┐        ┌──────────────┐     │
//! │  │   Medicine   │ 1     * │     Sale     │        │    Credit    │     │
//! │  │──────────────│◄────────│──────────────│  name  │──────────────│     │
//! │  │ id, code     │         │ medicine_id  │───────►│ client_name  │     │
//! │  │ name, form   │         │ sale_type    │        │ total        │     │
//! │  │ ppv, ph      │         │ client_name  │        │ remaining    │     │
//! │  │ quantity     │         │ operator     │        └──────┬───────┘     │
//! │  │ expiry       │         └──────────────┘               │ 1           │
//! │  │ category     │                                        │             │
//! │  └──────────────┘                                        ▼ *           │
//! │                                                   ┌──────────────┐     │
//! │  ┌──────────────┐                                 │   Payment    │     │
//! │  │     User     │                                 │──────────────│     │
//! │  │ username     │                                 │ credit_id    │     │
//! │  │ is_admin     │                                 │ amount       │     │
//! │  └──────────────┘                                 └──────────────┘     │
//! │                                                                         │
//! │  (id, expiry) identifies a sellable stock line.                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! These types use the counter's own vocabulary. Field names of the REST
//! payloads live in `pharma-api`.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::expiry::ExpiryBatch;
use crate::money::Money;

/// Backend identifier of a stock line.
pub type MedicineId = i64;

// =============================================================================
// Category
// =============================================================================

/// Galenic category used by the stock screen filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    SuspensionSyrup,
    CreamGelOintment,
    Tablet,
    Capsule,
    EyeDrops,
    Other,
}

impl Category {
    /// All categories in display order.
    pub const ALL: [Category; 6] = [
        Category::SuspensionSyrup,
        Category::CreamGelOintment,
        Category::Tablet,
        Category::Capsule,
        Category::EyeDrops,
        Category::Other,
    ];

    /// Label stored by the backend and shown on screen.
    pub fn label(&self) -> &'static str {
        match self {
            Category::SuspensionSyrup => "Suspension / Sirop",
            Category::CreamGelOintment => "Crème / Gel / Pommade",
            Category::Tablet => "Comprimé",
            Category::Capsule => "Gélule",
            Category::EyeDrops => "Collyre",
            Category::Other => "Autre",
        }
    }

    /// Maps a free-form backend label to a category.
    ///
    /// Unknown labels fall into [`Category::Other`].
    pub fn from_label(label: &str) -> Category {
        Category::from_known_label(label).unwrap_or(Category::Other)
    }

    /// The category whose label matches, ignoring case and accents.
    pub fn from_known_label(label: &str) -> Option<Category> {
        let folded = fold(label);
        Category::ALL.into_iter().find(|c| fold(c.label()) == folded)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = ValidationError;

    /// Strict parse for operator input: label or short alias.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded = fold(s);
        let by_alias = match folded.as_str() {
            "sirop" | "suspension" => Some(Category::SuspensionSyrup),
            "creme" | "gel" | "pommade" => Some(Category::CreamGelOintment),
            "comprime" => Some(Category::Tablet),
            "gelule" => Some(Category::Capsule),
            "collyre" => Some(Category::EyeDrops),
            "autre" => Some(Category::Other),
            _ => None,
        };
        by_alias
            .or_else(|| Category::ALL.into_iter().find(|c| fold(c.label()) == folded))
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "category".to_string(),
                allowed: Category::ALL.iter().map(|c| c.label().to_string()).collect(),
            })
    }
}

// =============================================================================
// Medicine
// =============================================================================

/// A sellable stock line.
///
/// ## Fields
/// - `ppv`: public sale price (unit price at the counter)
/// - `ph`: pharmacist purchase price, used on delivery documents
/// - `expiry`: `None` when the backend row has no readable batch
/// - `raw`: backend text behind `expiry` and `category` when it could not
///   be read; written back as is until the operator replaces the field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medicine {
    pub id: MedicineId,
    pub code: String,
    pub name: String,
    pub form: String,
    pub presentation: String,
    pub ppv: Money,
    pub ph: Money,
    pub quantity: i64,
    pub expiry: Option<ExpiryBatch>,
    pub category: Option<Category>,
    #[serde(default)]
    pub raw: RawFields,
}

/// Backend values the counter does not understand.
///
/// ```text
/// datE_PER "12/2026"      → expiry None,          raw.expiry Some("12/2026")
/// categorie "Antibiotique" → category Some(Other), raw.category Some("Antibiotique")
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFields {
    pub expiry: Option<String>,
    pub category: Option<String>,
}

impl Medicine {
    /// Stock value of the line: PPV × quantity.
    pub fn stock_value(&self) -> Money {
        self.ppv.multiply_quantity(self.quantity)
    }

    /// True when the line has units on the shelf.
    pub fn in_stock(&self) -> bool {
        self.quantity > 0
    }

    /// Expiry rendered the way the screens show it (empty when unknown).
    pub fn expiry_label(&self) -> String {
        self.expiry_text().unwrap_or_default()
    }

    /// Expiry as the backend stores it, unreadable text included.
    pub fn expiry_text(&self) -> Option<String> {
        self.expiry
            .map(|e| e.to_string())
            .or_else(|| self.raw.expiry.clone())
    }

    /// Category label as the backend stores it, unknown labels included.
    pub fn category_text(&self) -> Option<String> {
        self.raw
            .category
            .clone()
            .or_else(|| self.category.map(|c| c.label().to_string()))
    }

    /// True when the backend row has no expiry at all, readable or not.
    pub fn has_no_expiry(&self) -> bool {
        self.expiry.is_none()
            && self
                .raw
                .expiry
                .as_deref()
                .map_or(true, |s| s.trim().is_empty())
    }

    pub fn set_expiry(&mut self, batch: ExpiryBatch) {
        self.expiry = Some(batch);
        self.raw.expiry = None;
    }

    pub fn set_category(&mut self, category: Category) {
        self.category = Some(category);
        self.raw.category = None;
    }
}

/// Fields captured by the new product form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMedicine {
    pub code: String,
    pub name: String,
    pub expiry: ExpiryBatch,
    pub ppv: Money,
    pub presentation: String,
    pub form: String,
    /// Left empty on creation; filled from delivery documents.
    pub ph: Option<Money>,
}

// =============================================================================
// Sale Type
// =============================================================================

/// How a sale was settled.
///
/// ## Wire Encoding
/// ```text
/// Cash   ◄──► "Especes"
/// Card   ◄──► "TPE"
/// Credit ◄──► "Crédit"
/// Return ◄──► "Avoir"
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SaleType {
    Cash,
    Card,
    Credit,
    Return,
}

impl SaleType {
    /// The string the backend stores in `typeDeVente`.
    pub fn wire_name(&self) -> &'static str {
        match self {
            SaleType::Cash => "Especes",
            SaleType::Card => "TPE",
            SaleType::Credit => "Crédit",
            SaleType::Return => "Avoir",
        }
    }
}

impl fmt::Display for SaleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for SaleType {
    type Err = ValidationError;

    /// Case-insensitive, accent-insensitive, accepts English aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match fold(s).as_str() {
            "especes" | "espece" | "cash" => Ok(SaleType::Cash),
            "tpe" | "card" | "carte" => Ok(SaleType::Card),
            "credit" => Ok(SaleType::Credit),
            "avoir" | "return" | "retour" => Ok(SaleType::Return),
            _ => Err(ValidationError::NotAllowed {
                field: "sale type".to_string(),
                allowed: vec![
                    "Especes".to_string(),
                    "TPE".to_string(),
                    "Crédit".to_string(),
                    "Avoir".to_string(),
                ],
            }),
        }
    }
}

impl Serialize for SaleType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.wire_name())
    }
}

impl<'de> Deserialize<'de> for SaleType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Sale
// =============================================================================

/// One sale record (one medicine line of a checkout).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    /// Assigned by the backend; `None` before posting.
    pub id: Option<i64>,
    pub date: NaiveDateTime,
    pub medicine_id: Option<MedicineId>,
    pub medicine_name: String,
    pub total_articles: i64,
    pub total_price: Money,
    pub sale_type: SaleType,
    pub sale_number: i64,
    pub client_name: String,
    pub operator: String,
    /// Batch the units came back with (returns only).
    pub expiry: Option<ExpiryBatch>,
}

impl Sale {
    /// Operator name with the padding the backend keeps.
    pub fn operator_trimmed(&self) -> &str {
        self.operator.trim()
    }
}

// =============================================================================
// Credit & Payment
// =============================================================================

/// Outstanding balance of a client buying on credit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credit {
    pub id: i64,
    pub client_name: String,
    pub total: Money,
    pub remaining: Money,
    pub created_at: NaiveDateTime,
    pub paid: bool,
}

impl Credit {
    /// Case-insensitive client match used when a credit sale lands.
    pub fn belongs_to(&self, client_name: &str) -> bool {
        self.client_name.trim().to_lowercase() == client_name.trim().to_lowercase()
    }

    /// Adds a new credit sale to the balance.
    ///
    /// ## Rules
    /// - total and remaining both grow by `amount`
    /// - the account is reopened (`paid = false`)
    pub fn record_sale(&mut self, amount: Money) {
        self.total += amount;
        self.remaining += amount;
        self.paid = false;
    }

    /// Amount already paid back.
    pub fn paid_amount(&self) -> Money {
        self.total - self.remaining
    }
}

/// A repayment against a credit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: i64,
    pub credit_id: i64,
    pub amount: Money,
    pub paid_at: NaiveDateTime,
}

// =============================================================================
// User
// =============================================================================

/// A counter account.
///
/// The backend keeps the password in clear text. `Debug` never prints it.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password: String,
    pub is_admin: bool,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("is_admin", &self.is_admin)
            .finish()
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Lowercases and strips the French accents found in labels and sale types.
pub(crate) fn fold(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| match c {
            'é' | 'è' | 'ê' | 'ë' | 'É' | 'È' | 'Ê' => 'e',
            'à' | 'â' | 'À' | 'Â' => 'a',
            'ç' | 'Ç' => 'c',
            'î' | 'ï' => 'i',
            'ô' | 'Ô' => 'o',
            'ù' | 'û' => 'u',
            other => other,
        })
        .collect::<String>()
        .to_lowercase()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_sale_type_wire_names() {
        assert_eq!(SaleType::Cash.to_string(), "Especes");
        assert_eq!(SaleType::Card.to_string(), "TPE");
        assert_eq!(SaleType::Credit.to_string(), "Crédit");
        assert_eq!(SaleType::Return.to_string(), "Avoir");
    }

    #[test]
    fn test_sale_type_parse_is_lenient() {
        assert_eq!("crédit".parse::<SaleType>().unwrap(), SaleType::Credit);
        assert_eq!("CREDIT".parse::<SaleType>().unwrap(), SaleType::Credit);
        assert_eq!("Espèces".parse::<SaleType>().unwrap(), SaleType::Cash);
        assert_eq!("tpe".parse::<SaleType>().unwrap(), SaleType::Card);
        assert_eq!("avoir".parse::<SaleType>().unwrap(), SaleType::Return);
        assert!("cheque".parse::<SaleType>().is_err());
    }

    #[test]
    fn test_sale_type_serde() {
        let json = serde_json::to_string(&SaleType::Credit).unwrap();
        assert_eq!(json, "\"Crédit\"");
        let back: SaleType = serde_json::from_str("\"Especes\"").unwrap();
        assert_eq!(back, SaleType::Cash);
    }

    #[test]
    fn test_category_labels() {
        assert_eq!(Category::from_label("Comprimé"), Category::Tablet);
        assert_eq!(Category::from_label("comprime"), Category::Tablet);
        assert_eq!(Category::from_label("Crème / Gel / Pommade"), Category::CreamGelOintment);
        assert_eq!(Category::from_label("Something else"), Category::Other);
        assert_eq!("sirop".parse::<Category>().unwrap(), Category::SuspensionSyrup);
        assert!("xyz".parse::<Category>().is_err());
    }

    #[test]
    fn test_credit_record_sale_reopens_account() {
        let mut credit = Credit {
            id: 1,
            client_name: "Amine".to_string(),
            total: Money::from_cents(10000),
            remaining: Money::zero(),
            created_at: NaiveDate::from_ymd_opt(2025, 1, 1)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            paid: true,
        };

        credit.record_sale(Money::from_cents(2500));

        assert_eq!(credit.total.cents(), 12500);
        assert_eq!(credit.remaining.cents(), 2500);
        assert_eq!(credit.paid_amount().cents(), 10000);
        assert!(!credit.paid);
        assert!(credit.belongs_to("  amine "));
    }

    #[test]
    fn test_user_debug_redacts_password() {
        let user = User {
            id: 1,
            username: "admin".to_string(),
            password: "secret".to_string(),
            is_admin: true,
        };
        let printed = format!("{:?}", user);
        assert!(!printed.contains("secret"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn test_unreadable_fields_survive_until_replaced() {
        let mut med = crate::testing::medicine(3, "611", "AUGMENTIN", 7000);
        med.category = Some(Category::Other);
        med.raw = RawFields {
            expiry: Some("12/2026".to_string()),
            category: Some("Antibiotique".to_string()),
        };

        assert!(!med.has_no_expiry());
        assert_eq!(med.expiry_label(), "12/2026");
        assert_eq!(med.category_text().as_deref(), Some("Antibiotique"));

        med.set_expiry(ExpiryBatch::parse("122026").unwrap());
        med.set_category(Category::Tablet);
        assert_eq!(med.expiry_text().as_deref(), Some("122026"));
        assert_eq!(med.category_text().as_deref(), Some("Comprimé"));

        med.expiry = None;
        med.raw.expiry = Some("  ".to_string());
        assert!(med.has_no_expiry());
    }
}
