//! # Sales History and Statistics

use chrono::{NaiveDate, NaiveDateTime};
use pharma_core::stats::{format_sale_date, sales_on, total_on, SalesStats, UNKNOWN_OPERATOR};
use pharma_core::{Money, Sale, Screen};
use serde::Serialize;

use crate::error::CommandResult;
use crate::state::AppContext;

/// Rows of the history screen plus today's revenue.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct History {
    pub sales: Vec<Sale>,
    pub today_total: Money,
}

/// All sales, or those of `day`.
pub async fn history(
    ctx: &AppContext,
    day: Option<NaiveDate>,
    today: NaiveDate,
) -> CommandResult<History> {
    ctx.session.require(Screen::History).await?;

    let all = ctx.backend.sales().await?;
    let today_total = total_on(&all, today);
    let sales = match day {
        Some(day) => sales_on(&all, day).into_iter().cloned().collect(),
        None => all,
    };

    Ok(History { sales, today_total })
}

pub async fn stats(ctx: &AppContext, now: NaiveDateTime) -> CommandResult<SalesStats> {
    ctx.session.require(Screen::Statistics).await?;
    let sales = ctx.backend.sales().await?;
    Ok(SalesStats::compute(&sales, now))
}

pub fn print_history(ctx: &AppContext, history: &History) {
    println!(
        "{:<16}  {:<30} {:>4} {:>12}  {:<8} {:<18} {}",
        "DATE", "MÉDICAMENT", "QTE", "TOTAL", "TYPE", "CLIENT", "VENDEUR"
    );
    for s in &history.sales {
        let operator = match s.operator_trimmed() {
            "" => UNKNOWN_OPERATOR,
            name => name,
        };
        println!(
            "{:<16}  {:<30} {:>4} {:>12}  {:<8} {:<18} {}",
            format_sale_date(s.date),
            s.medicine_name,
            s.total_articles,
            ctx.money(s.total_price),
            s.sale_type,
            s.client_name,
            operator
        );
    }
    println!("{} sale(s)", history.sales.len());
    println!("Today's sales: {}", ctx.money(history.today_total));
}

pub fn print_stats(ctx: &AppContext, stats: &SalesStats) {
    println!("Recap");
    println!("  Today        {:>14}", ctx.money(stats.recap.today));
    println!("  Last 7 days  {:>14}", ctx.money(stats.recap.last_7_days));
    println!("  This month   {:>14}", ctx.money(stats.recap.this_month));

    println!("\nTop of the month");
    for (rank, v) in stats.top_of_month.iter().enumerate() {
        println!("  {}. {:<30} {:>5}", rank + 1, v.name, v.articles);
    }

    println!("\nMonthly revenue");
    for m in &stats.monthly_revenue {
        println!("  {:<8} {:>14}", m.month, ctx.money(m.total));
    }

    println!("\nMoving this week");
    for v in &stats.weekly_movers {
        println!("  {:<30} {:>5}", v.name, v.articles);
    }

    println!("\nBy sale type");
    for (sale_type, total) in &stats.by_sale_type {
        println!("  {:<8} {:>14}", sale_type, ctx.money(*total));
    }

    println!("\nBy operator");
    for (operator, total) in &stats.by_operator {
        println!("  {:<20} {:>14}", operator, ctx.money(*total));
    }
}
