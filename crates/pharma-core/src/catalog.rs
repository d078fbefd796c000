//! # Catalog Queries
//!
//! Client-side lookups over the medicine list fetched from the backend.
//!
//! ## Where Each Query Is Used
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Sales screen      find_by_name()       manual add by designation       │
//! │  Stock screen      StockFilter          category + name, sorted         │
//! │                    StockSummary         in-stock count, stock value     │
//! │  Deliveries        search()             name or code, 5 results         │
//! │  Returns           restock_target()     which stock line gets units     │
//! │  Lists             Page::of()           10 rows per page                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::expiry::ExpiryBatch;
use crate::money::Money;
use crate::types::{Category, Medicine, MedicineId};

/// Results returned by the delivery search box.
pub const SEARCH_LIMIT: usize = 5;

/// Rows per page on list screens.
pub const PAGE_SIZE: usize = 10;

// =============================================================================
// Name Lookup
// =============================================================================

/// Finds a single medicine by designation.
///
/// ## Rules
/// 1. Exact match, case-insensitive → that medicine
/// 2. Otherwise exactly one "contains" match → that medicine
/// 3. Several contains-matches → `AmbiguousMedicine`
/// 4. Nothing → `MedicineNotFound`
///
/// ## Example
/// ```rust
/// use pharma_core::catalog::find_by_name;
/// # use pharma_core::{Medicine, Money};
/// # let med = |id: i64, name: &str| Medicine { id, code: id.to_string(), name: name.into(),
/// #   form: String::new(), presentation: String::new(), ppv: Money::zero(), ph: Money::zero(),
/// #   quantity: 0, expiry: None, category: None, raw: Default::default() };
/// let catalog = vec![med(1, "DOLIPRANE 500"), med(2, "DOLIPRANE 1000"), med(3, "SPASFON")];
///
/// assert_eq!(find_by_name(&catalog, "spas").unwrap().id, 3);
/// assert!(find_by_name(&catalog, "doli").is_err());
/// ```
pub fn find_by_name<'a>(catalog: &'a [Medicine], name: &str) -> CoreResult<&'a Medicine> {
    let needle = name.trim().to_lowercase();
    if needle.is_empty() {
        return Err(CoreError::MedicineNotFound(name.to_string()));
    }

    if let Some(exact) = catalog
        .iter()
        .find(|m| m.name.trim().to_lowercase() == needle)
    {
        return Ok(exact);
    }

    let partial: Vec<&Medicine> = catalog
        .iter()
        .filter(|m| m.name.to_lowercase().contains(&needle))
        .collect();

    match partial.as_slice() {
        [] => Err(CoreError::MedicineNotFound(name.to_string())),
        [single] => Ok(*single),
        many => Err(CoreError::AmbiguousMedicine {
            query: name.to_string(),
            candidates: many.iter().map(|m| m.name.clone()).collect(),
        }),
    }
}

/// All stock lines carrying a code.
pub fn find_by_code<'a>(catalog: &'a [Medicine], code: &str) -> Vec<&'a Medicine> {
    let code = code.trim();
    catalog.iter().filter(|m| m.code.trim() == code).collect()
}

/// Search by name or code, case-insensitive, at most `SEARCH_LIMIT` hits.
pub fn search<'a>(catalog: &'a [Medicine], query: &str) -> Vec<&'a Medicine> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    catalog
        .iter()
        .filter(|m| {
            m.name.to_lowercase().contains(&needle) || m.code.to_lowercase().contains(&needle)
        })
        .take(SEARCH_LIMIT)
        .collect()
}

// =============================================================================
// Stock Screen
// =============================================================================

/// Filter of the stock grid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockFilter {
    pub category: Option<Category>,
    pub name: Option<String>,
}

impl StockFilter {
    /// Returns matching lines sorted by designation.
    pub fn apply<'a>(&self, catalog: &'a [Medicine]) -> Vec<&'a Medicine> {
        let needle = self
            .name
            .as_deref()
            .map(|n| n.trim().to_lowercase())
            .filter(|n| !n.is_empty());

        let mut rows: Vec<&Medicine> = catalog
            .iter()
            .filter(|m| match self.category {
                Some(category) => m.category.unwrap_or(Category::Other) == category,
                None => true,
            })
            .filter(|m| match &needle {
                Some(n) => m.name.to_lowercase().contains(n),
                None => true,
            })
            .collect();

        rows.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then(a.expiry.cmp(&b.expiry))
        });
        rows
    }
}

/// Header figures of the stock screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockSummary {
    /// Lines with quantity > 0.
    pub in_stock: usize,
    /// Σ PPV × quantity.
    pub total_value: Money,
}

impl StockSummary {
    pub fn of<'a>(lines: impl IntoIterator<Item = &'a Medicine>) -> Self {
        let mut summary = StockSummary {
            in_stock: 0,
            total_value: Money::zero(),
        };
        for line in lines {
            if line.in_stock() {
                summary.in_stock += 1;
            }
            summary.total_value += line.stock_value();
        }
        summary
    }
}

// =============================================================================
// Returns
// =============================================================================

/// Picks the stock line that receives returned units.
///
/// ## Rule
/// Among lines with the same id:
/// 1. the line whose expiry equals the returned batch
/// 2. otherwise a line with no expiry recorded (it gets the batch); an
///    unreadable expiry counts as recorded
/// 3. otherwise none: a new line must be created
pub fn restock_target<'a>(
    stock: &'a [Medicine],
    id: MedicineId,
    batch: ExpiryBatch,
) -> Option<&'a Medicine> {
    let same_id = || stock.iter().filter(move |m| m.id == id);
    same_id()
        .find(|m| m.expiry == Some(batch))
        .or_else(|| same_id().find(|m| m.has_no_expiry()))
}

// =============================================================================
// Pagination
// =============================================================================

/// One page of a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<'a, T> {
    /// 1-based page number actually shown (clamped).
    pub number: usize,
    pub total_pages: usize,
    pub rows: &'a [T],
}

impl<'a, T> Page<'a, T> {
    /// Slices `items` for a 1-based page number, clamped into range.
    pub fn of(items: &'a [T], page: usize, per_page: usize) -> Self {
        let per_page = per_page.max(1);
        let total_pages = items.len().div_ceil(per_page).max(1);
        let number = page.clamp(1, total_pages);
        let start = (number - 1) * per_page;
        let end = (start + per_page).min(items.len());
        Page {
            number,
            total_pages,
            rows: &items[start.min(end)..end],
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
