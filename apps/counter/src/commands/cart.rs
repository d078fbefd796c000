//! # Cart Commands
//!
//! The cart outlives a counter session (it is restored from `pharmaCart`),
//! so it can be inspected, printed or dropped from the command line.

use std::fmt::Write as _;
use std::path::Path;

use chrono::NaiveDateTime;
use pharma_core::invoice::Invoice;
use pharma_core::{Cart, CartTotals, Screen};
use tracing::info;

use crate::cli::CartCommand;
use crate::error::CommandResult;
use crate::state::AppContext;

use super::{confirm, now};

pub async fn show(ctx: &AppContext) -> CommandResult<Cart> {
    ctx.session.require(Screen::Sales).await?;
    Ok(ctx.cart.snapshot())
}

pub async fn invoice(ctx: &AppContext, issued_at: NaiveDateTime) -> CommandResult<Invoice> {
    ctx.session.require(Screen::Sales).await?;
    Ok(ctx
        .cart
        .with_cart(|cart| Invoice::from_cart(cart, ctx.config.pharmacy.name.clone(), issued_at)))
}

/// Cart as a table, one line per medicine, with its totals.
pub fn render(ctx: &AppContext, cart: &Cart) -> String {
    if cart.is_empty() {
        return "Cart is empty".to_string();
    }

    let mut out = String::new();
    for (i, item) in cart.items.iter().enumerate() {
        let discount = if item.discount_percent > 0 {
            format!(" (-{}%)", item.discount_percent)
        } else {
            String::new()
        };
        let _ = writeln!(
            out,
            "{:>2}. {:<32} {:>8} x{:<3} {:>12}{}",
            i + 1,
            item.medicine.name,
            item.medicine.expiry_label(),
            item.quantity,
            ctx.money(item.line_total()),
            discount
        );
    }

    let totals = CartTotals::from(cart);
    let _ = writeln!(out, "{}", "-".repeat(64));
    let _ = writeln!(out, "Articles : {}", totals.article_count);
    if !totals.discount.is_zero() {
        let _ = writeln!(out, "Remise   : {}", ctx.money(totals.discount));
    }
    let _ = write!(out, "Total    : {}", ctx.money(totals.total));
    out
}

pub async fn run(ctx: &AppContext, command: CartCommand) -> CommandResult<()> {
    match command {
        CartCommand::Show => {
            let cart = show(ctx).await?;
            println!("{}", render(ctx, &cart));
        }
        CartCommand::Clear { yes } => {
            ctx.session.require(Screen::Sales).await?;
            if !yes && !confirm("Empty the cart?")? {
                println!("Cart kept");
                return Ok(());
            }
            ctx.cart.clear().await?;
            println!("Cart emptied");
        }
        CartCommand::Invoice { output } => {
            let text = invoice(ctx, now()).await?.render();
            write_invoice(&text, output.as_deref())?;
        }
    }
    Ok(())
}

pub(crate) fn write_invoice(text: &str, output: Option<&Path>) -> CommandResult<()> {
    match output {
        Some(path) => {
            std::fs::write(path, text)?;
            info!(?path, "Invoice written");
            println!("Invoice written to {}", path.display());
        }
        None => print!("{}", text),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{at, doliprane, logged_in, FakeBackend};

    #[tokio::test]
    async fn test_invoice_uses_configured_pharmacy() {
        let mut ctx = logged_in(FakeBackend::default(), "amina", false).await;
        ctx.config.pharmacy.name = "PHARMACIE DU CENTRE".into();
        ctx.cart.update(|c| c.add(&doliprane())).await.unwrap();

        let text = invoice(&ctx, at(2025, 10, 12, 18, 30)).await.unwrap().render();
        assert!(text.contains("FACTURE"));
        assert!(text.contains("PHARMACIE DU CENTRE"));
        assert!(text.contains("12/10/2025 18:30"));
        assert!(text.contains("DOLIPRANE 1G"));
    }

    #[tokio::test]
    async fn test_render_shows_discount_and_total() {
        let ctx = logged_in(FakeBackend::default(), "amina", false).await;
        ctx.cart.update(|c| c.add(&doliprane())).await.unwrap();
        ctx.cart.update(|c| c.set_discount(1, 50)).await.unwrap();

        let text = render(&ctx, &show(&ctx).await.unwrap());
        assert!(text.contains("(-50%)"));
        assert!(text.contains("Remise   : 9.90 DH"));
        assert!(text.ends_with("Total    : 9.90 DH"));

        assert_eq!(render(&ctx, &Cart::new()), "Cart is empty");
    }
}
