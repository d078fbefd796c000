//! # Sales History & Statistics
//!
//! Client-side aggregation over the sales list.
//!
//! ## Figures
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  top_of_month     5 medicines with most articles, current month        │
//! │  monthly_revenue  Σ total price per "YYYY-M", oldest first             │
//! │  weekly_movers    medicines with > 5 articles over the last 7 days     │
//! │  by_sale_type     Σ total price per sale type                          │
//! │  by_operator      Σ total price per operator ("Inconnu" if blank)      │
//! │  recap            today / last 7 days / current month                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `now` is always passed in; nothing here reads the system clock.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::money::Money;
use crate::types::{Sale, SaleType};

/// How many medicines the monthly ranking keeps.
pub const TOP_LIMIT: usize = 5;

/// A medicine only counts as a weekly mover above this many articles.
pub const WEEKLY_MOVER_THRESHOLD: i64 = 5;

/// Label used when a sale has no operator.
pub const UNKNOWN_OPERATOR: &str = "Inconnu";

// =============================================================================
// History
// =============================================================================

/// Formats a sale date as shown in the history: `dd/MM/yyyy HH:mm`.
pub fn format_sale_date(date: NaiveDateTime) -> String {
    date.format("%d/%m/%Y %H:%M").to_string()
}

/// Sales made on a calendar day.
pub fn sales_on(sales: &[Sale], day: NaiveDate) -> Vec<&Sale> {
    sales.iter().filter(|s| s.date.date() == day).collect()
}

/// Revenue of a calendar day.
pub fn total_on(sales: &[Sale], day: NaiveDate) -> Money {
    sales_on(sales, day).into_iter().map(|s| s.total_price).sum()
}

/// Sales of one client, matched case-insensitively (Fiche Client).
pub fn sales_for_client<'a>(sales: &'a [Sale], client_name: &str) -> Vec<&'a Sale> {
    let needle = client_name.trim().to_lowercase();
    sales
        .iter()
        .filter(|s| s.client_name.trim().to_lowercase() == needle)
        .collect()
}

// =============================================================================
// Statistics
// =============================================================================

/// Articles sold for one medicine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicineVolume {
    pub name: String,
    pub articles: i64,
}

/// Revenue of one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthRevenue {
    /// `YYYY-M`, month not zero-padded.
    pub month: String,
    pub total: Money,
}

/// Revenue over three windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recap {
    pub today: Money,
    pub last_7_days: Money,
    pub this_month: Money,
}

/// Everything the statistics screen shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesStats {
    pub top_of_month: Vec<MedicineVolume>,
    pub monthly_revenue: Vec<MonthRevenue>,
    pub weekly_movers: Vec<MedicineVolume>,
    pub by_sale_type: Vec<(SaleType, Money)>,
    pub by_operator: Vec<(String, Money)>,
    pub recap: Recap,
}

impl SalesStats {
    /// Aggregates `sales` relative to `now`.
    pub fn compute(sales: &[Sale], now: NaiveDateTime) -> Self {
        let week_start = now - Duration::days(7);
        let same_month =
            |d: NaiveDateTime| d.year() == now.year() && d.month() == now.month();

        let mut month_volume: HashMap<&str, i64> = HashMap::new();
        let mut week_volume: HashMap<&str, i64> = HashMap::new();
        let mut monthly: BTreeMap<(i32, u32), Money> = BTreeMap::new();
        let mut by_type: BTreeMap<SaleType, Money> = BTreeMap::new();
        let mut by_operator: BTreeMap<String, Money> = BTreeMap::new();
        let mut recap = Recap {
            today: Money::zero(),
            last_7_days: Money::zero(),
            this_month: Money::zero(),
        };

        for sale in sales {
            let name = sale.medicine_name.as_str();

            if same_month(sale.date) {
                *month_volume.entry(name).or_default() += sale.total_articles;
                recap.this_month += sale.total_price;
            }
            if sale.date >= week_start {
                *week_volume.entry(name).or_default() += sale.total_articles;
                recap.last_7_days += sale.total_price;
            }
            if sale.date.date() == now.date() {
                recap.today += sale.total_price;
            }

            *monthly
                .entry((sale.date.year(), sale.date.month()))
                .or_default() += sale.total_price;
            *by_type.entry(sale.sale_type).or_default() += sale.total_price;

            let operator = match sale.operator_trimmed() {
                "" => UNKNOWN_OPERATOR.to_string(),
                name => name.to_string(),
            };
            *by_operator.entry(operator).or_default() += sale.total_price;
        }

        let mut top_of_month = ranked(month_volume);
        top_of_month.truncate(TOP_LIMIT);

        let weekly_movers = ranked(week_volume)
            .into_iter()
            .filter(|v| v.articles > WEEKLY_MOVER_THRESHOLD)
            .collect();

        SalesStats {
            top_of_month,
            monthly_revenue: monthly
                .into_iter()
                .map(|((year, month), total)| MonthRevenue {
                    month: format!("{}-{}", year, month),
                    total,
                })
                .collect(),
            weekly_movers,
            by_sale_type: by_type.into_iter().collect(),
            by_operator: by_operator.into_iter().collect(),
            recap,
        }
    }
}

/// Most articles first; ties by name for a stable display.
fn ranked(volumes: HashMap<&str, i64>) -> Vec<MedicineVolume> {
    let mut rows: Vec<MedicineVolume> = volumes
        .into_iter()
        .map(|(name, articles)| MedicineVolume {
            name: name.to_string(),
            articles,
        })
        .collect();
    rows.sort_by(|a, b| b.articles.cmp(&a.articles).then_with(|| a.name.cmp(&b.name)));
    rows
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 30, 0)
            .unwrap()
    }

    fn sale(date: NaiveDateTime, name: &str, articles: i64, cents: i64, kind: SaleType, operator: &str) -> Sale {
        Sale {
            id: None,
            date,
            medicine_id: Some(1),
            medicine_name: name.to_string(),
            total_articles: articles,
            total_price: Money::from_cents(cents),
            sale_type: kind,
            sale_number: 0,
            client_name: String::new(),
            operator: operator.to_string(),
            expiry: None,
        }
    }

    fn fixture() -> Vec<Sale> {
        vec![
            sale(at(2025, 10, 12, 9), "DOLIPRANE", 4, 6240, SaleType::Cash, "Rabab "),
            sale(at(2025, 10, 10, 11), "DOLIPRANE", 3, 4680, SaleType::Card, "Rabab"),
            sale(at(2025, 10, 2, 16), "SPASFON", 2, 3000, SaleType::Credit, ""),
            sale(at(2025, 9, 28, 10), "AMOXIL", 9, 63000, SaleType::Cash, "Sami"),
        ]
    }

    #[test]
    fn test_format_sale_date() {
        assert_eq!(format_sale_date(at(2025, 3, 7, 8)), "07/03/2025 08:30");
    }

    #[test]
    fn test_history_by_day() {
        let sales = fixture();
        let day = NaiveDate::from_ymd_opt(2025, 10, 12).unwrap();
        assert_eq!(sales_on(&sales, day).len(), 1);
        assert_eq!(total_on(&sales, day).cents(), 6240);
    }

    #[test]
    fn test_top_of_month() {
        let stats = SalesStats::compute(&fixture(), at(2025, 10, 12, 18));
        assert_eq!(
            stats.top_of_month,
            vec![
                MedicineVolume { name: "DOLIPRANE".to_string(), articles: 7 },
                MedicineVolume { name: "SPASFON".to_string(), articles: 2 },
            ]
        );
    }

    #[test]
    fn test_monthly_revenue_is_chronological() {
        let mut sales = fixture();
        sales.push(sale(at(2024, 12, 1, 9), "X", 1, 100, SaleType::Cash, "Sami"));
        let stats = SalesStats::compute(&sales, at(2025, 10, 12, 18));
        let keys: Vec<&str> = stats.monthly_revenue.iter().map(|m| m.month.as_str()).collect();
        assert_eq!(keys, vec!["2024-12", "2025-9", "2025-10"]);
    }

    #[test]
    fn test_weekly_movers_threshold() {
        // last 7 days from 2025-10-12 18:30 → DOLIPRANE 7 articles, AMOXIL outside
        let stats = SalesStats::compute(&fixture(), at(2025, 10, 12, 18));
        assert_eq!(stats.weekly_movers.len(), 1);
        assert_eq!(stats.weekly_movers[0].name, "DOLIPRANE");
    }

    #[test]
    fn test_revenue_by_type_and_operator() {
        let stats = SalesStats::compute(&fixture(), at(2025, 10, 12, 18));
        assert_eq!(
            stats.by_sale_type,
            vec![
                (SaleType::Cash, Money::from_cents(69240)),
                (SaleType::Card, Money::from_cents(4680)),
                (SaleType::Credit, Money::from_cents(3000)),
            ]
        );
        assert_eq!(
            stats.by_operator,
            vec![
                ("Inconnu".to_string(), Money::from_cents(3000)),
                ("Rabab".to_string(), Money::from_cents(10920)),
                ("Sami".to_string(), Money::from_cents(63000)),
            ]
        );
    }

    #[test]
    fn test_recap() {
        let stats = SalesStats::compute(&fixture(), at(2025, 10, 12, 18));
        assert_eq!(stats.recap.today.cents(), 6240);
        assert_eq!(stats.recap.last_7_days.cents(), 10920);
        assert_eq!(stats.recap.this_month.cents(), 13920);
    }

    #[test]
    fn test_client_sales_case_insensitive() {
        let mut sales = fixture();
        sales[2].client_name = "Amine B".to_string();
        assert_eq!(sales_for_client(&sales, "amine b").len(), 1);
    }
}
