//! # Sale Commands
//!
//! Turning the cart into backend records.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Checkout (Especes / TPE / Crédit)                    │
//! │                                                                         │
//! │  cart (≥ 1 line)                                                        │
//! │     │                                                                   │
//! │     ├─ 1. POST /sales                 one record per line, one request  │
//! │     ├─ 2. PATCH /medicines/updateStock/{id}   per line, body = qty      │
//! │     ├─ 3. Crédit only:                                                  │
//! │     │      GET /credits → client found (case-insensitive)?              │
//! │     │        yes → PUT  total += t, remaining += t, paid = false        │
//! │     │        no  → POST total = remaining = t, paid = false             │
//! │     └─ 4. cart cleared (memory + pharmaCart)                            │
//! │                                                                         │
//! │  A failure at any step stops there and is reported. Steps already      │
//! │  done stay done; the cart is kept so the operator can see what failed. │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Return Flow (Avoir)
//! ```text
//! one MMYYYY batch per cart line, all validated before any call
//!     │
//!     ├─ GET /medicines
//!     ├─ per line: restock_target(id, batch)
//!     │      found → PUT quantity += q (expiry filled when empty)
//!     │      none  → POST a copy of the line with the batch and q
//!     ├─ per line: POST /sales [Avoir, client "Pharmacist", batch]
//!     └─ cart cleared
//! ```

use chrono::NaiveDateTime;
use pharma_api::NewMedicinePayload;
use pharma_core::catalog::restock_target;
use pharma_core::validation::validate_client_name;
use pharma_core::{
    Cart, CartItem, CoreError, Credit, ExpiryBatch, Money, Sale, SaleType, Screen,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{CommandError, CommandResult};
use crate::state::AppContext;

/// Client recorded on return sales.
pub const RETURN_CLIENT: &str = "Pharmacist";

/// What a checkout did.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutReceipt {
    pub sale_type: SaleType,
    pub lines: usize,
    pub articles: i64,
    pub total: Money,
    pub credit: Option<CreditChange>,
}

/// Effect of a credit sale on the client's account.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum CreditChange {
    Opened { client: String, remaining: Money },
    Increased { client: String, remaining: Money },
}

/// What a return did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnReceipt {
    /// Existing stock lines that received the units.
    pub restocked: usize,
    /// Stock lines created for an unknown batch.
    pub created: usize,
    pub articles: i64,
}

fn sale_record(
    item: &CartItem,
    sale_type: SaleType,
    client: &str,
    operator: &str,
    now: NaiveDateTime,
) -> Sale {
    Sale {
        id: None,
        date: now,
        medicine_id: Some(item.medicine_id()),
        medicine_name: item.medicine.name.clone(),
        total_articles: item.quantity,
        total_price: item.line_total(),
        sale_type,
        sale_number: 0,
        client_name: client.to_string(),
        operator: operator.to_string(),
        expiry: None,
    }
}

fn non_empty(cart: Cart) -> CommandResult<Cart> {
    if cart.is_empty() {
        return Err(CoreError::EmptyCart.into());
    }
    Ok(cart)
}

/// Confirms the cart as a cash, card or credit sale.
///
/// ## Rules
/// - The cart must not be empty
/// - A credit sale needs a client name
/// - Returns go through [`process_return`]
pub async fn checkout(
    ctx: &AppContext,
    sale_type: SaleType,
    client: Option<&str>,
    now: NaiveDateTime,
) -> CommandResult<CheckoutReceipt> {
    let session = ctx.session.require(Screen::Sales).await?;

    if sale_type == SaleType::Return {
        return Err(CommandError::validation(
            "Returns need an expiry batch per line; use `return <MMYYYY...>`",
        ));
    }

    let cart = non_empty(ctx.cart.snapshot())?;

    let client = client.map(str::trim).unwrap_or_default();
    if sale_type == SaleType::Credit {
        validate_client_name(client)?;
    }

    let sales: Vec<Sale> = cart
        .items
        .iter()
        .map(|item| sale_record(item, sale_type, client, &session.username, now))
        .collect();

    ctx.backend.record_sales(&sales).await?;
    debug!(records = sales.len(), sale_type = %sale_type, "Sales recorded");

    for item in &cart.items {
        ctx.backend
            .update_stock(item.medicine_id(), item.quantity)
            .await?;
    }

    let total = cart.total();
    let credit = if sale_type == SaleType::Credit {
        Some(charge_credit(ctx, client, total, now).await?)
    } else {
        None
    };

    ctx.cart.clear().await?;

    info!(
        sale_type = %sale_type,
        lines = cart.line_count(),
        total = %total,
        operator = %session.username,
        "Sale confirmed"
    );

    Ok(CheckoutReceipt {
        sale_type,
        lines: cart.line_count(),
        articles: cart.article_count(),
        total,
        credit,
    })
}

async fn charge_credit(
    ctx: &AppContext,
    client: &str,
    amount: Money,
    now: NaiveDateTime,
) -> CommandResult<CreditChange> {
    let credits = ctx.backend.credits().await?;

    match credits.into_iter().find(|c| c.belongs_to(client)) {
        Some(mut credit) => {
            credit.record_sale(amount);
            ctx.backend.update_credit(&credit).await?;
            debug!(credit_id = credit.id, remaining = %credit.remaining, "Credit increased");
            Ok(CreditChange::Increased {
                client: credit.client_name,
                remaining: credit.remaining,
            })
        }
        None => {
            let credit = Credit {
                id: 0,
                client_name: client.to_string(),
                total: amount,
                remaining: amount,
                created_at: now,
                paid: false,
            };
            ctx.backend.create_credit(&credit).await?;
            debug!(client = %client, "Credit opened");
            Ok(CreditChange::Opened {
                client: credit.client_name,
                remaining: amount,
            })
        }
    }
}

/// Takes the cart back into stock as a return (Avoir).
///
/// `batches` holds one `MMYYYY` expiry per cart line, in cart order.
pub async fn process_return(
    ctx: &AppContext,
    batches: &[String],
    now: NaiveDateTime,
) -> CommandResult<ReturnReceipt> {
    let session = ctx.session.require(Screen::Sales).await?;
    let cart = non_empty(ctx.cart.snapshot())?;

    if batches.len() != cart.line_count() {
        return Err(CommandError::validation(format!(
            "Expected {} expiry batch(es), one per cart line, got {}",
            cart.line_count(),
            batches.len()
        )));
    }

    // Every batch is checked before anything is sent.
    let batches = batches
        .iter()
        .map(|raw| ExpiryBatch::parse(raw.trim()))
        .collect::<Result<Vec<_>, _>>()?;

    let stock = ctx.backend.medicines().await?;
    let mut receipt = ReturnReceipt {
        restocked: 0,
        created: 0,
        articles: cart.article_count(),
    };

    for (item, batch) in cart.items.iter().zip(&batches) {
        match restock_target(&stock, item.medicine_id(), *batch) {
            Some(line) => {
                let mut line = line.clone();
                line.quantity += item.quantity;
                if line.expiry.is_none() {
                    line.set_expiry(*batch);
                }
                ctx.backend.update_medicine(&line).await?;
                receipt.restocked += 1;
            }
            None => {
                let payload = NewMedicinePayload::from_stock_line(&item.medicine, *batch, item.quantity);
                ctx.backend.create_medicine(&payload).await?;
                receipt.created += 1;
            }
        }
    }

    for (item, batch) in cart.items.iter().zip(&batches) {
        let mut sale = sale_record(item, SaleType::Return, RETURN_CLIENT, &session.username, now);
        sale.expiry = Some(*batch);
        ctx.backend.record_sales(std::slice::from_ref(&sale)).await?;
    }

    ctx.cart.clear().await?;

    info!(
        restocked = receipt.restocked,
        created = receipt.created,
        operator = %session.username,
        "Return recorded"
    );
    Ok(receipt)
}

/// Drops the current sale. The caller asks for confirmation first.
pub async fn cancel(ctx: &AppContext) -> CommandResult<()> {
    ctx.session.require(Screen::Sales).await?;
    ctx.cart.clear().await?;
    info!("Sale cancelled");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::testing::{at, batch, credit, doliprane, logged_in, spasfon, FakeBackend};
    use pharma_core::{Category, Medicine, RawFields};

    async fn ctx_with_cart(fake: &FakeBackend) -> AppContext {
        let ctx = logged_in(fake.clone(), "amina", false).await;
        ctx.cart.update(|c| c.add(&doliprane())).await.unwrap();
        ctx.cart.update(|c| c.add(&doliprane())).await.unwrap();
        ctx.cart.update(|c| c.add(&spasfon())).await.unwrap();
        ctx.cart.update(|c| c.set_discount(2, 10)).await.unwrap();
        ctx
    }

    #[tokio::test]
    async fn test_cash_checkout() {
        let fake = FakeBackend::with_medicines(vec![doliprane(), spasfon()]);
        let ctx = ctx_with_cart(&fake).await;

        let receipt = checkout(&ctx, SaleType::Cash, None, at(2025, 10, 12, 18, 30))
            .await
            .unwrap();

        // 19.80 × 2 + 20.00 × 0.9
        assert_eq!(receipt.total, Money::from_cents(5760));
        assert_eq!(receipt.articles, 3);
        assert_eq!(receipt.credit, None);

        let data = fake.data();
        assert_eq!(data.sale_batches, 1);
        assert_eq!(data.sales.len(), 2);
        assert_eq!(data.sales[0].total_price, Money::from_cents(3960));
        assert_eq!(data.sales[1].total_price, Money::from_cents(1800));
        assert_eq!(data.sales[1].operator, "amina");
        assert_eq!(data.sales[1].sale_number, 0);
        assert_eq!(data.stock_updates, vec![(1, 2), (2, 1)]);
        drop(data);

        assert!(ctx.cart.snapshot().is_empty());
        assert!(ctx.store.cart().load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_cart_rejected() {
        let fake = FakeBackend::default();
        let ctx = logged_in(fake.clone(), "amina", false).await;

        let err = checkout(&ctx, SaleType::Card, None, at(2025, 10, 12, 9, 0))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(fake.data().sale_batches, 0);
    }

    #[tokio::test]
    async fn test_checkout_requires_session() {
        let fake = FakeBackend::default();
        let ctx = crate::testing::context(fake).await;

        let err = checkout(&ctx, SaleType::Cash, None, at(2025, 10, 12, 9, 0))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthorized);
    }

    #[tokio::test]
    async fn test_credit_sale_increases_existing_credit() {
        let fake = FakeBackend::with_medicines(vec![doliprane(), spasfon()]);
        fake.data().credits = vec![credit(7, "Fatima Zahra", 10000, 0)];
        let ctx = ctx_with_cart(&fake).await;

        let receipt = checkout(&ctx, SaleType::Credit, Some(" fatima zahra "), at(2025, 10, 12, 9, 0))
            .await
            .unwrap();

        assert_eq!(
            receipt.credit,
            Some(CreditChange::Increased {
                client: "Fatima Zahra".into(),
                remaining: Money::from_cents(5760),
            })
        );
        let data = fake.data();
        assert_eq!(data.credits.len(), 1);
        assert_eq!(data.credits[0].total, Money::from_cents(15760));
        assert!(!data.credits[0].paid);
        assert_eq!(data.sales[0].client_name, "fatima zahra");
    }

    #[tokio::test]
    async fn test_credit_sale_opens_credit() {
        let fake = FakeBackend::with_medicines(vec![doliprane(), spasfon()]);
        let ctx = ctx_with_cart(&fake).await;

        checkout(&ctx, SaleType::Credit, Some("Karim"), at(2025, 10, 12, 9, 0))
            .await
            .unwrap();

        let data = fake.data();
        assert_eq!(data.credits.len(), 1);
        assert_eq!(data.credits[0].client_name, "Karim");
        assert_eq!(data.credits[0].remaining, Money::from_cents(5760));
        assert_eq!(data.credits[0].total, data.credits[0].remaining);
    }

    #[tokio::test]
    async fn test_credit_sale_needs_client() {
        let fake = FakeBackend::with_medicines(vec![doliprane(), spasfon()]);
        let ctx = ctx_with_cart(&fake).await;

        let err = checkout(&ctx, SaleType::Credit, Some("  "), at(2025, 10, 12, 9, 0))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(fake.data().sale_batches, 0);
        assert_eq!(ctx.cart.snapshot().line_count(), 2);
    }

    #[tokio::test]
    async fn test_failed_checkout_keeps_cart() {
        let fake = FakeBackend::with_medicines(vec![doliprane()]);
        let ctx = ctx_with_cart(&fake).await;
        fake.data().offline = true;

        let err = checkout(&ctx, SaleType::Cash, None, at(2025, 10, 12, 9, 0))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NetworkError);
        assert_eq!(ctx.cart.snapshot().article_count(), 3);
    }

    #[tokio::test]
    async fn test_return_restocks_matching_and_new_batches() {
        // DOLIPRANE has a 032027 line; SPASFON has a line without expiry.
        let fake = FakeBackend::with_medicines(vec![doliprane(), spasfon()]);
        let ctx = ctx_with_cart(&fake).await;

        let receipt = process_return(
            &ctx,
            &["032027".to_string(), "112026".to_string()],
            at(2025, 10, 12, 9, 0),
        )
        .await
        .unwrap();

        assert_eq!(receipt.restocked, 2);
        assert_eq!(receipt.created, 0);

        let data = fake.data();
        assert_eq!(data.medicines[0].quantity, 12);
        assert_eq!(data.medicines[1].quantity, 11);
        assert_eq!(data.medicines[1].expiry, Some(batch("112026")));

        assert_eq!(data.sale_batches, 2);
        assert!(data.sales.iter().all(|s| s.sale_type == SaleType::Return));
        assert!(data.sales.iter().all(|s| s.client_name == RETURN_CLIENT));
        assert_eq!(data.sales[0].expiry, Some(batch("032027")));
    }

    #[tokio::test]
    async fn test_return_with_unknown_batch_creates_line() {
        let fake = FakeBackend::with_medicines(vec![doliprane()]);
        let ctx = logged_in(fake.clone(), "amina", false).await;
        ctx.cart.update(|c| c.add(&doliprane())).await.unwrap();

        let receipt = process_return(&ctx, &["012028".to_string()], at(2025, 10, 12, 9, 0))
            .await
            .unwrap();

        assert_eq!(receipt.created, 1);
        let data = fake.data();
        assert_eq!(data.created_medicines[0].expiry, "012028");
        assert_eq!(data.created_medicines[0].quantity, 1);
        assert_eq!(data.medicines[0].quantity, 10);
    }

    #[tokio::test]
    async fn test_return_leaves_unreadable_expiry_alone() {
        let augmentin = Medicine {
            id: 9,
            name: "AUGMENTIN 1G".into(),
            category: Some(Category::Other),
            raw: RawFields {
                expiry: Some("12/2026".into()),
                category: Some("Antibiotique".into()),
            },
            ..spasfon()
        };
        let fake = FakeBackend::with_medicines(vec![augmentin.clone()]);
        let ctx = logged_in(fake.clone(), "amina", false).await;
        ctx.cart.update(|c| c.add(&augmentin)).await.unwrap();

        let receipt = process_return(&ctx, &["122026".to_string()], at(2025, 10, 12, 9, 0))
            .await
            .unwrap();

        assert_eq!(receipt.restocked, 0);
        assert_eq!(receipt.created, 1);
        let data = fake.data();
        assert_eq!(data.medicines[0], augmentin);
        assert_eq!(data.created_medicines[0].expiry, "122026");
        assert_eq!(data.created_medicines[0].category.as_deref(), Some("Antibiotique"));
    }

    #[tokio::test]
    async fn test_return_rejects_bad_batch_before_sending() {
        let fake = FakeBackend::with_medicines(vec![doliprane(), spasfon()]);
        let ctx = ctx_with_cart(&fake).await;

        let err = process_return(
            &ctx,
            &["032027".to_string(), "132027".to_string()],
            at(2025, 10, 12, 9, 0),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = process_return(&ctx, &["032027".to_string()], at(2025, 10, 12, 9, 0))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let data = fake.data();
        assert_eq!(data.sale_batches, 0);
        assert_eq!(data.medicines[0].quantity, 10);
    }

    #[tokio::test]
    async fn test_cancel_clears_cart() {
        let fake = FakeBackend::default();
        let ctx = ctx_with_cart(&fake).await;

        cancel(&ctx).await.unwrap();
        assert!(ctx.cart.snapshot().is_empty());
    }
}
