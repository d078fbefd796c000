//! # Wire Format
//!
//! JSON shapes exactly as the backend reads and writes them, and the
//! conversions to the pharma-core types.
//!
//! ## Field Names
//! The backend mixes conventions (`nom_medicament`, `datE_PER`,
//! `responsable_Vente`, upper-case creation payloads). They are pinned with
//! explicit `#[serde(rename)]` so the Rust side keeps plain snake_case.
//!
//! ## Leniency
//! - Prices arrive as numbers, numeric strings, or `null`
//! - Text fields may be `null`
//! - Dates are naive (`2025-10-12T18:30:00`) or RFC 3339 (`...Z`)
//!
//! Decoding never fails on these. An unreadable expiry becomes `None` and an
//! unknown category `Other`; the original text rides along in
//! `Medicine::raw` so an update sends it back unchanged.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use pharma_core::{
    Category, Credit, DeliveryDocument, ExpiryBatch, Medicine, Money, NewMedicine, Payment,
    RawFields, Sale, SaleType, User,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::warn;

// =============================================================================
// Lenient Helpers
// =============================================================================

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
        Null,
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Number(n)) => n,
        Some(Raw::Text(s)) => s.trim().replace(',', ".").parse().unwrap_or(0.0),
        Some(Raw::Null) | None => 0.0,
    })
}

/// Prices go out as decimal strings (`"55.5"`, `"0"`).
fn decimal_string<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_string())
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Parses the backend's timestamps, naive or zoned. Zoned values are shown
/// in local time.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local).naive_local());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

mod timestamp {
    use super::*;

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.format(DATE_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_timestamp(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unreadable timestamp '{}'", raw)))
    }
}

fn expiry_from_wire(raw: Option<&str>, context: &str) -> Option<ExpiryBatch> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    match ExpiryBatch::parse_flexible(raw) {
        Ok(batch) => Some(batch),
        Err(e) => {
            warn!(value = %raw, context = %context, error = %e, "Ignoring unreadable expiry");
            None
        }
    }
}

// =============================================================================
// Medicine
// =============================================================================

/// A stock line as `GET /medicines` returns it and `PUT /medicines/{id}`
/// expects it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicineDto {
    pub id: i64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub code: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub nom_medicament: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub forme: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub ppv: f64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub presentation: String,
    #[serde(rename = "datE_PER", default)]
    pub date_per: Option<String>,
    #[serde(default)]
    pub quantite: Option<i64>,
    #[serde(
        default,
        deserialize_with = "lenient_f64",
        serialize_with = "decimal_string"
    )]
    pub ph: f64,
    #[serde(default)]
    pub categorie: Option<String>,
}

impl From<MedicineDto> for Medicine {
    fn from(dto: MedicineDto) -> Self {
        let expiry = expiry_from_wire(dto.date_per.as_deref(), &dto.nom_medicament);
        let known = dto.categorie.as_deref().and_then(Category::from_known_label);
        let category = known.or_else(|| {
            dto.categorie
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .map(|_| Category::Other)
        });
        let raw = RawFields {
            expiry: dto.date_per.filter(|_| expiry.is_none()),
            category: dto.categorie.filter(|_| known.is_none()),
        };

        Medicine {
            id: dto.id,
            code: dto.code.trim().to_string(),
            name: dto.nom_medicament,
            form: dto.forme,
            presentation: dto.presentation,
            ppv: Money::from_decimal(dto.ppv),
            ph: Money::from_decimal(dto.ph),
            quantity: dto.quantite.unwrap_or(0),
            expiry,
            category,
            raw,
        }
    }
}

impl From<&Medicine> for MedicineDto {
    fn from(m: &Medicine) -> Self {
        MedicineDto {
            id: m.id,
            code: m.code.clone(),
            nom_medicament: m.name.clone(),
            forme: m.form.clone(),
            ppv: m.ppv.to_decimal(),
            presentation: m.presentation.clone(),
            date_per: m.expiry_text(),
            quantite: Some(m.quantity),
            ph: m.ph.to_decimal(),
            categorie: m.category_text(),
        }
    }
}

/// Body of `POST /medicines`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewMedicinePayload {
    #[serde(rename = "CODE")]
    pub code: String,
    #[serde(rename = "Nom_medicament")]
    pub name: String,
    #[serde(rename = "DATE_PER")]
    pub expiry: String,
    #[serde(rename = "PPV")]
    pub ppv: f64,
    #[serde(rename = "PRESENTATION")]
    pub presentation: String,
    #[serde(rename = "FORME")]
    pub form: String,
    #[serde(rename = "PH", serialize_with = "decimal_string")]
    pub ph: f64,
    #[serde(rename = "Quantite")]
    pub quantity: i64,
    #[serde(rename = "categorie", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl NewMedicinePayload {
    /// A product created from the new-product form starts with no stock.
    pub fn from_form(product: &NewMedicine) -> Self {
        NewMedicinePayload {
            code: product.code.trim().to_string(),
            name: product.name.trim().to_string(),
            expiry: product.expiry.to_string(),
            ppv: product.ppv.to_decimal(),
            presentation: product.presentation.clone(),
            form: product.form.clone(),
            ph: product.ph.unwrap_or_default().to_decimal(),
            quantity: 0,
            category: None,
        }
    }

    /// A new stock line copied from an existing medicine with another batch.
    pub fn from_stock_line(template: &Medicine, expiry: ExpiryBatch, quantity: i64) -> Self {
        NewMedicinePayload {
            code: template.code.clone(),
            name: template.name.clone(),
            expiry: expiry.to_string(),
            ppv: template.ppv.to_decimal(),
            presentation: template.presentation.clone(),
            form: template.form.clone(),
            ph: template.ph.to_decimal(),
            quantity,
            category: template.category_text(),
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// One element of the `/sales` arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleDto {
    #[serde(rename = "salesID", default, skip_serializing_if = "Option::is_none")]
    pub sales_id: Option<i64>,
    #[serde(with = "timestamp")]
    pub date: NaiveDateTime,
    #[serde(rename = "medicineId", default)]
    pub medicine_id: Option<i64>,
    #[serde(rename = "medicines", default, deserialize_with = "lenient_string")]
    pub medicines: String,
    #[serde(rename = "totalArticles", default)]
    pub total_articles: i64,
    #[serde(rename = "totalPrice", default, deserialize_with = "lenient_f64")]
    pub total_price: f64,
    #[serde(rename = "typeDeVente", default, deserialize_with = "lenient_string")]
    pub type_de_vente: String,
    #[serde(rename = "numeroDeVente", default)]
    pub numero_de_vente: i64,
    #[serde(rename = "nomClient", default, deserialize_with = "lenient_string")]
    pub nom_client: String,
    #[serde(rename = "responsable_Vente", default, deserialize_with = "lenient_string")]
    pub responsable_vente: String,
    #[serde(rename = "quantiteVendue", default)]
    pub quantite_vendue: i64,
    #[serde(rename = "datE_PER", default, skip_serializing_if = "Option::is_none")]
    pub date_per: Option<String>,
}

impl From<SaleDto> for Sale {
    fn from(dto: SaleDto) -> Self {
        let sale_type = dto.type_de_vente.parse().unwrap_or_else(|_| {
            warn!(value = %dto.type_de_vente, "Unknown sale type, counted as cash");
            SaleType::Cash
        });

        Sale {
            id: dto.sales_id,
            date: dto.date,
            medicine_id: dto.medicine_id,
            medicine_name: dto.medicines,
            total_articles: dto.total_articles,
            total_price: Money::from_decimal(dto.total_price),
            sale_type,
            sale_number: dto.numero_de_vente,
            client_name: dto.nom_client,
            operator: dto.responsable_vente,
            expiry: expiry_from_wire(dto.date_per.as_deref(), "sale"),
        }
    }
}

impl From<&Sale> for SaleDto {
    fn from(sale: &Sale) -> Self {
        SaleDto {
            sales_id: sale.id,
            date: sale.date,
            medicine_id: sale.medicine_id,
            medicines: sale.medicine_name.clone(),
            total_articles: sale.total_articles,
            total_price: sale.total_price.to_decimal(),
            type_de_vente: sale.sale_type.wire_name().to_string(),
            numero_de_vente: sale.sale_number,
            nom_client: sale.client_name.clone(),
            responsable_vente: sale.operator.clone(),
            quantite_vendue: sale.total_articles,
            date_per: sale.expiry.map(|e| e.to_string()),
        }
    }
}

// =============================================================================
// Credit & Payment
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub client_name: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub montant_total: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub montant_restant: f64,
    #[serde(with = "timestamp")]
    pub date_creation: NaiveDateTime,
    #[serde(default)]
    pub est_paye: bool,
}

impl From<CreditDto> for Credit {
    fn from(dto: CreditDto) -> Self {
        Credit {
            id: dto.id.unwrap_or_default(),
            client_name: dto.client_name,
            total: Money::from_decimal(dto.montant_total),
            remaining: Money::from_decimal(dto.montant_restant),
            created_at: dto.date_creation,
            paid: dto.est_paye,
        }
    }
}

impl CreditDto {
    /// Body for `PUT /credits/{id}`.
    pub fn existing(credit: &Credit) -> Self {
        CreditDto {
            id: Some(credit.id),
            ..CreditDto::new(credit)
        }
    }

    /// Body for `POST /credits` (no id).
    pub fn new(credit: &Credit) -> Self {
        CreditDto {
            id: None,
            client_name: credit.client_name.clone(),
            montant_total: credit.total.to_decimal(),
            montant_restant: credit.remaining.to_decimal(),
            date_creation: credit.created_at,
            est_paye: credit.paid,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDto {
    pub id: i64,
    pub credit_id: i64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub montant: f64,
    #[serde(with = "timestamp")]
    pub date_paiement: NaiveDateTime,
}

impl From<PaymentDto> for Payment {
    fn from(dto: PaymentDto) -> Self {
        Payment {
            id: dto.id,
            credit_id: dto.credit_id,
            amount: Money::from_decimal(dto.montant),
            paid_at: dto.date_paiement,
        }
    }
}

/// Body of `POST /credits/{id}/payer`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayRequest {
    pub montant: f64,
}

// =============================================================================
// User
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub nom_utilisateur: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub mot_de_passe: String,
    #[serde(default)]
    pub is_admin: bool,
}

impl From<UserDto> for User {
    fn from(dto: UserDto) -> Self {
        User {
            id: dto.id.unwrap_or_default(),
            username: dto.nom_utilisateur,
            password: dto.mot_de_passe,
            is_admin: dto.is_admin,
        }
    }
}

impl From<&User> for UserDto {
    fn from(user: &User) -> Self {
        UserDto {
            id: Some(user.id),
            nom_utilisateur: user.username.clone(),
            mot_de_passe: user.password.clone(),
            is_admin: user.is_admin,
        }
    }
}

// =============================================================================
// Delivery
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryItemPayload {
    #[serde(rename = "MED_ID")]
    pub med_id: i64,
    #[serde(rename = "MED_NAME")]
    pub med_name: String,
    #[serde(rename = "QTE_LIVR")]
    pub quantity: i64,
    #[serde(rename = "PU_PPV")]
    pub unit_ppv: f64,
    #[serde(rename = "PU_PPH")]
    pub unit_ph: f64,
    #[serde(rename = "TOTAL_PPV")]
    pub total_ppv: f64,
    #[serde(rename = "TOTAL_PPH")]
    pub total_ph: f64,
}

/// Body of `POST /livraison`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryPayload {
    #[serde(rename = "N_DOCUMENT")]
    pub number: String,
    #[serde(rename = "NOM_SOCIETE")]
    pub supplier: String,
    #[serde(rename = "DATE_RECEIVED")]
    pub received_on: String,
    #[serde(rename = "Items")]
    pub items: Vec<DeliveryItemPayload>,
}

impl From<&DeliveryDocument> for DeliveryPayload {
    fn from(doc: &DeliveryDocument) -> Self {
        DeliveryPayload {
            number: doc.number.clone(),
            supplier: doc.supplier.clone(),
            received_on: doc.received_on.format("%Y-%m-%d").to_string(),
            items: doc
                .lines
                .iter()
                .map(|line| DeliveryItemPayload {
                    med_id: line.medicine_id,
                    med_name: line.medicine_name.clone(),
                    quantity: line.quantity,
                    unit_ppv: line.ppv.to_decimal(),
                    unit_ph: line.ph.to_decimal(),
                    total_ppv: line.total_ppv().to_decimal(),
                    total_ph: line.total_ph().to_decimal(),
                })
                .collect(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
