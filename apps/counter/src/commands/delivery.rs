//! # Delivery Commands
//!
//! Supplier delivery notes: drafted locally under `documents`, pushed to
//! `POST /livraison` once complete.
//!
//! ```text
//! delivery new BL-104 SOPHADIMS --line 12=10 --line 40=5   → draft saved
//! delivery add-line BL-104 7 20                            → draft updated
//! delivery push BL-104                                     → sent, flagged pushed
//! delivery push BL-104                                     → CONFLICT (already pushed)
//! ```

use chrono::NaiveDate;
use pharma_core::catalog::{search as search_catalog, Page, PAGE_SIZE};
use pharma_core::validation::validate_search_query;
use pharma_core::{CoreError, DeliveryDocument, Medicine, MedicineId, Screen};
use tracing::{debug, info};

use crate::cli::DeliveryCommand;
use crate::error::{CommandError, CommandResult};
use crate::state::AppContext;

use super::today;

fn stock_line(stock: &[Medicine], id: MedicineId) -> CommandResult<&Medicine> {
    stock
        .iter()
        .find(|m| m.id == id)
        .ok_or_else(|| CommandError::not_found("Medicine", &id.to_string()))
}

pub async fn list(ctx: &AppContext) -> CommandResult<Vec<DeliveryDocument>> {
    ctx.session.require(Screen::Deliveries).await?;
    Ok(ctx.store.deliveries().load().await?.documents().to_vec())
}

pub async fn get(ctx: &AppContext, number: &str) -> CommandResult<DeliveryDocument> {
    ctx.session.require(Screen::Deliveries).await?;
    ctx.store
        .deliveries()
        .load()
        .await?
        .get(number)
        .cloned()
        .ok_or_else(|| CommandError::not_found("Delivery document", number.trim()))
}

/// Builds a note from `(medicine id, quantity)` pairs and saves it.
///
/// A medicine listed twice keeps its first line.
pub async fn create(
    ctx: &AppContext,
    number: &str,
    supplier: &str,
    received_on: NaiveDate,
    lines: &[(MedicineId, i64)],
) -> CommandResult<DeliveryDocument> {
    ctx.session.require(Screen::Deliveries).await?;

    let stock = ctx.backend.medicines().await?;
    let mut document = DeliveryDocument::new(number, supplier, received_on);
    for &(id, quantity) in lines {
        if !document.add_line(stock_line(&stock, id)?, quantity)? {
            debug!(id, "Medicine already on the note, line ignored");
        }
    }

    let saved = document.clone();
    ctx.store.deliveries().save_draft(document).await??;
    Ok(saved)
}

/// Adds a line to a saved draft.
///
/// Returns `false` when the medicine was already on the note.
pub async fn add_line(
    ctx: &AppContext,
    number: &str,
    medicine_id: MedicineId,
    quantity: i64,
) -> CommandResult<bool> {
    let mut document = get(ctx, number).await?;
    if document.pushed {
        return Err(CoreError::AlreadyPushed(document.number).into());
    }

    let stock = ctx.backend.medicines().await?;
    let added = document.add_line(stock_line(&stock, medicine_id)?, quantity)?;
    if added {
        ctx.store.deliveries().save_draft(document).await??;
    }
    Ok(added)
}

/// Medicine lookup while drafting: name or code contains the query.
pub async fn search(ctx: &AppContext, query: &str) -> CommandResult<Vec<Medicine>> {
    ctx.session.require(Screen::Deliveries).await?;
    let query = validate_search_query(query)?;
    let stock = ctx.backend.medicines().await?;
    Ok(search_catalog(&stock, &query).into_iter().cloned().collect())
}

/// Sends a draft to the backend and flags it pushed.
pub async fn push(ctx: &AppContext, number: &str) -> CommandResult<DeliveryDocument> {
    let document = get(ctx, number).await?;
    if document.pushed {
        return Err(CoreError::AlreadyPushed(document.number).into());
    }
    document.validate()?;

    ctx.backend.push_delivery(&document).await?;
    ctx.store
        .deliveries()
        .update(|book| book.mark_pushed(&document.number))
        .await??;

    info!(
        number = %document.number,
        supplier = %document.supplier,
        lines = document.lines.len(),
        "Delivery pushed"
    );
    Ok(document)
}

pub async fn remove(ctx: &AppContext, number: &str) -> CommandResult<DeliveryDocument> {
    ctx.session.require(Screen::Deliveries).await?;
    let removed = ctx
        .store
        .deliveries()
        .update(|book| Ok(book.remove(number)))
        .await??;

    let removed =
        removed.ok_or_else(|| CommandError::not_found("Delivery document", number.trim()))?;
    info!(number = %removed.number, "Delivery document removed");
    Ok(removed)
}

// =============================================================================
// Command Line
// =============================================================================

fn print_document(ctx: &AppContext, document: &DeliveryDocument) {
    println!(
        "N° {}  {}  reçu le {}  {}",
        document.number,
        document.supplier,
        document.received_on.format("%d/%m/%Y"),
        if document.pushed { "[envoyé]" } else { "[brouillon]" }
    );
    for line in &document.lines {
        println!(
            "  {:>5} {:<30} x{:<4} PPV {:>12}  PPH {:>12}",
            line.medicine_id,
            line.medicine_name,
            line.quantity,
            ctx.money(line.total_ppv()),
            ctx.money(line.total_ph())
        );
    }
    println!(
        "  {} article(s), total PPV {}, total PPH {}",
        document.article_count(),
        ctx.money(document.total_ppv()),
        ctx.money(document.total_ph())
    );
}

pub async fn run(ctx: &AppContext, command: DeliveryCommand) -> CommandResult<()> {
    match command {
        DeliveryCommand::List { page } => {
            let documents = list(ctx).await?;
            let page = Page::of(&documents, page, PAGE_SIZE);
            for document in page.rows {
                println!(
                    "{:<16} {:<24} {}  {:>3} ligne(s)  {}",
                    document.number,
                    document.supplier,
                    document.received_on.format("%d/%m/%Y"),
                    document.lines.len(),
                    if document.pushed { "envoyé" } else { "brouillon" }
                );
            }
            println!("Page {}/{}", page.number, page.total_pages);
        }
        DeliveryCommand::Show { number } => {
            print_document(ctx, &get(ctx, &number).await?);
        }
        DeliveryCommand::New {
            number,
            supplier,
            date,
            lines,
        } => {
            let received_on = date.unwrap_or_else(today);
            let document = create(ctx, &number, &supplier, received_on, &lines).await?;
            print_document(ctx, &document);
        }
        DeliveryCommand::AddLine {
            number,
            medicine_id,
            quantity,
        } => {
            if add_line(ctx, &number, medicine_id, quantity).await? {
                println!("Line added to {}", number.trim());
            } else {
                println!("Medicine {} is already on {}", medicine_id, number.trim());
            }
        }
        DeliveryCommand::Search { query } => {
            for m in search(ctx, &query).await? {
                println!(
                    "{:>5}  {:<14} {:<30} {:>6} {:>12}",
                    m.id,
                    m.code,
                    m.name,
                    m.expiry_label(),
                    ctx.money(m.ppv)
                );
            }
        }
        DeliveryCommand::Push { number } => {
            let document = push(ctx, &number).await?;
            println!("Delivery {} sent", document.number);
        }
        DeliveryCommand::Remove { number } => {
            let document = remove(ctx, &number).await?;
            println!("Delivery {} removed", document.number);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::testing::{doliprane, logged_in, spasfon, FakeBackend};
    use pharma_core::Money;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 12).unwrap()
    }

    #[tokio::test]
    async fn test_create_and_push() {
        let fake = FakeBackend::with_medicines(vec![doliprane(), spasfon()]);
        // Deliveries are open to non-admins.
        let ctx = logged_in(fake.clone(), "youssef", false).await;

        let document = create(&ctx, "BL-104", "SOPHADIMS", date(), &[(1, 10), (1, 3), (2, 5)])
            .await
            .unwrap();
        assert_eq!(document.lines.len(), 2);
        assert_eq!(document.lines[0].quantity, 10);
        assert_eq!(document.total_ppv(), Money::from_cents(29800));

        push(&ctx, "BL-104").await.unwrap();
        assert_eq!(fake.data().pushed_deliveries.len(), 1);
        assert!(get(&ctx, "BL-104").await.unwrap().pushed);

        let err = push(&ctx, "BL-104").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);
        assert_eq!(fake.data().pushed_deliveries.len(), 1);

        let err = add_line(&ctx, "BL-104", 2, 1).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn test_add_line_to_draft() {
        let fake = FakeBackend::with_medicines(vec![doliprane(), spasfon()]);
        let ctx = logged_in(fake, "youssef", false).await;
        create(&ctx, "BL-105", "COOPER", date(), &[(1, 2)]).await.unwrap();

        assert!(add_line(&ctx, "BL-105", 2, 4).await.unwrap());
        assert!(!add_line(&ctx, "BL-105", 2, 9).await.unwrap());
        assert_eq!(get(&ctx, "BL-105").await.unwrap().lines.len(), 2);

        let err = add_line(&ctx, "BL-105", 1, 0).await;
        assert_eq!(err.unwrap_err().code, ErrorCode::ValidationError);

        let err = add_line(&ctx, "BL-404", 1, 1).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_create_requires_header_and_known_medicine() {
        let fake = FakeBackend::with_medicines(vec![doliprane()]);
        let ctx = logged_in(fake, "youssef", false).await;

        let err = create(&ctx, "BL-106", " ", date(), &[(1, 2)]).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = create(&ctx, "BL-106", "COOPER", date(), &[(99, 2)]).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        assert!(list(&ctx).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_and_remove() {
        let fake = FakeBackend::with_medicines(vec![doliprane(), spasfon()]);
        let ctx = logged_in(fake, "youssef", false).await;

        let hits = search(&ctx, "6118000042").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "SPASFON");

        create(&ctx, "BL-107", "COOPER", date(), &[(2, 1)]).await.unwrap();
        remove(&ctx, "BL-107").await.unwrap();
        assert!(list(&ctx).await.unwrap().is_empty());

        let err = remove(&ctx, "BL-107").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
