//! # Credit Commands
//!
//! Client accounts opened by credit sales.
//!
//! ## Payment Rules
//! ```text
//! credit pay 3 120     → 0 < 120.00 ≤ remaining ? POST credits/3/payer {montant: 120}
//! credit pay 3 --all   → montant = remaining
//! credit pay 3 0       → VALIDATION_ERROR, nothing sent
//! ```

use pharma_core::stats::{format_sale_date, sales_for_client};
use pharma_core::validation::validate_payment_amount;
use pharma_core::{Credit, Money, Payment, Sale, Screen};
use serde::Serialize;
use tracing::info;

use crate::cli::CreditCommand;
use crate::error::{CommandError, CommandResult};
use crate::state::AppContext;

/// How much to pay on a credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayAmount {
    Amount(Money),
    Remaining,
}

/// Everything known about one client (Fiche Client).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSheet {
    pub client: String,
    pub credit: Option<Credit>,
    pub sales: Vec<Sale>,
    pub payments: Vec<Payment>,
}

pub async fn list(ctx: &AppContext, client: Option<&str>) -> CommandResult<Vec<Credit>> {
    ctx.session.require(Screen::Credits).await?;

    let needle = client.map(|c| c.trim().to_lowercase()).unwrap_or_default();
    let credits = ctx.backend.credits().await?;
    Ok(credits
        .into_iter()
        .filter(|c| c.client_name.to_lowercase().contains(&needle))
        .collect())
}

pub async fn payments(ctx: &AppContext, credit_id: i64) -> CommandResult<Vec<Payment>> {
    ctx.session.require(Screen::Credits).await?;
    Ok(ctx.backend.payments(credit_id).await?)
}

/// Records a payment and returns the amount paid.
pub async fn pay(ctx: &AppContext, credit_id: i64, amount: PayAmount) -> CommandResult<Money> {
    ctx.session.require(Screen::Credits).await?;

    let credit = ctx
        .backend
        .credits()
        .await?
        .into_iter()
        .find(|c| c.id == credit_id)
        .ok_or_else(|| CommandError::not_found("Credit", &credit_id.to_string()))?;

    if !credit.remaining.is_positive() {
        return Err(CommandError::validation(format!(
            "Credit of {} is already paid",
            credit.client_name
        )));
    }

    let amount = match amount {
        PayAmount::Amount(amount) => amount,
        PayAmount::Remaining => credit.remaining,
    };
    validate_payment_amount(amount, credit.remaining)?;

    ctx.backend.pay_credit(credit_id, amount).await?;
    info!(credit_id, amount = %amount, client = %credit.client_name, "Payment recorded");
    Ok(amount)
}

/// Sales of the client plus the payments of their credit.
pub async fn sheet(ctx: &AppContext, client: &str) -> CommandResult<ClientSheet> {
    ctx.session.require(Screen::Credits).await?;

    let credit = ctx
        .backend
        .credits()
        .await?
        .into_iter()
        .find(|c| c.belongs_to(client));

    let sales = ctx.backend.sales().await?;
    let sales = sales_for_client(&sales, client).into_iter().cloned().collect();

    let payments = match &credit {
        Some(credit) => ctx.backend.payments(credit.id).await?,
        None => Vec::new(),
    };

    Ok(ClientSheet {
        client: client.trim().to_string(),
        credit,
        sales,
        payments,
    })
}

fn print_credits(ctx: &AppContext, credits: &[Credit]) {
    println!(
        "{:>5}  {:<28} {:>14} {:>14} {:<10} {}",
        "ID", "CLIENT", "TOTAL", "RESTANT", "DEPUIS", "STATUT"
    );
    for c in credits {
        println!(
            "{:>5}  {:<28} {:>14} {:>14} {:<10} {}",
            c.id,
            c.client_name,
            ctx.money(c.total),
            ctx.money(c.remaining),
            c.created_at.format("%d/%m/%Y"),
            if c.paid { "Payé" } else { "Non payé" }
        );
    }
}

fn print_payments(ctx: &AppContext, payments: &[Payment]) {
    if payments.is_empty() {
        println!("No payments");
        return;
    }
    for p in payments {
        println!("{}  {:>14}", format_sale_date(p.paid_at), ctx.money(p.amount));
    }
}

pub async fn run(ctx: &AppContext, command: CreditCommand) -> CommandResult<()> {
    match command {
        CreditCommand::List { client } => {
            let credits = list(ctx, client.as_deref()).await?;
            print_credits(ctx, &credits);
        }
        CreditCommand::Payments { id } => {
            print_payments(ctx, &payments(ctx, id).await?);
        }
        CreditCommand::Pay { id, amount, all } => {
            let amount = match (all, amount) {
                (true, _) => PayAmount::Remaining,
                (false, Some(amount)) => PayAmount::Amount(Money::from_decimal(amount)),
                (false, None) => return Err(CommandError::validation("amount is required")),
            };
            let paid = pay(ctx, id, amount).await?;
            println!("Paid {} on credit {}", ctx.money(paid), id);
        }
        CreditCommand::Sheet { client } => {
            let sheet = sheet(ctx, &client).await?;
            println!("Fiche client : {}", sheet.client);
            match &sheet.credit {
                Some(credit) => print_credits(ctx, std::slice::from_ref(credit)),
                None => println!("No credit account"),
            }
            println!();
            println!("Achats ({})", sheet.sales.len());
            for s in &sheet.sales {
                println!(
                    "{}  {:<30} x{:<3} {:>14}  {}",
                    format_sale_date(s.date),
                    s.medicine_name,
                    s.total_articles,
                    ctx.money(s.total_price),
                    s.sale_type
                );
            }
            println!();
            println!("Paiements ({})", sheet.payments.len());
            print_payments(ctx, &sheet.payments);
        }
    }
    Ok(())
}
