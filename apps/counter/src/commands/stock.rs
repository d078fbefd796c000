//! # Stock Commands
//!
//! The stock grid and the new-product form.
//!
//! ## Stock Lines
//! A medicine can have several stock lines sharing its id, one per expiry
//! batch. Commands that change a single line take `--batch` to pick it
//! when the id alone is ambiguous.
//!
//! ```text
//! id 12  DOLIPRANE 1G  032027  qty 10   ◄── stock edit 12 --batch 032027
//! id 12  DOLIPRANE 1G  112026  qty  4
//! ```

use pharma_api::NewMedicinePayload;
use pharma_core::catalog::{StockFilter, StockSummary};
use pharma_core::validation::{validate_new_medicine, validate_price};
use pharma_core::{Category, ExpiryBatch, Medicine, MedicineId, Money, NewMedicine, Screen};
use tracing::info;

use crate::cli::{EditArgs, NewProductArgs, StockCommand};
use crate::error::{CommandError, CommandResult};
use crate::state::AppContext;

/// Field changes of `stock edit`; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MedicineEdit {
    pub code: Option<String>,
    pub name: Option<String>,
    pub form: Option<String>,
    pub presentation: Option<String>,
    pub ppv: Option<Money>,
    pub ph: Option<Money>,
    pub quantity: Option<i64>,
    pub expiry: Option<ExpiryBatch>,
    pub category: Option<Category>,
}

impl MedicineEdit {
    fn apply(self, medicine: &mut Medicine) -> CommandResult<()> {
        if let Some(code) = self.code {
            medicine.code = code.trim().to_string();
        }
        if let Some(name) = self.name {
            medicine.name = name.trim().to_string();
        }
        if let Some(form) = self.form {
            medicine.form = form;
        }
        if let Some(presentation) = self.presentation {
            medicine.presentation = presentation;
        }
        if let Some(ppv) = self.ppv {
            validate_price("PPV", ppv)?;
            medicine.ppv = ppv;
        }
        if let Some(ph) = self.ph {
            validate_price("PH", ph)?;
            medicine.ph = ph;
        }
        if let Some(quantity) = self.quantity {
            if quantity < 0 {
                return Err(CommandError::validation("quantity cannot be negative"));
            }
            medicine.quantity = quantity;
        }
        if let Some(expiry) = self.expiry {
            medicine.set_expiry(expiry);
        }
        if let Some(category) = self.category {
            medicine.set_category(category);
        }
        Ok(())
    }
}

/// Finds the stock line `id`, narrowed by `batch` when given.
fn stock_line(
    stock: Vec<Medicine>,
    id: MedicineId,
    batch: Option<ExpiryBatch>,
) -> CommandResult<Medicine> {
    let mut lines: Vec<Medicine> = stock
        .into_iter()
        .filter(|m| m.id == id)
        .filter(|m| batch.is_none() || m.expiry == batch)
        .collect();

    match lines.len() {
        0 => Err(CommandError::not_found("Medicine", &id.to_string())),
        1 => Ok(lines.remove(0)),
        n => Err(CommandError::validation(format!(
            "Medicine {} has {} stock lines; pick one with --batch",
            id, n
        ))),
    }
}

fn parse_batch(raw: Option<&str>) -> CommandResult<Option<ExpiryBatch>> {
    Ok(raw.map(|b| ExpiryBatch::parse(b.trim())).transpose()?)
}

pub async fn list(ctx: &AppContext, filter: &StockFilter) -> CommandResult<Vec<Medicine>> {
    ctx.session.require(Screen::Stock).await?;
    let stock = ctx.backend.medicines().await?;
    Ok(filter.apply(&stock).into_iter().cloned().collect())
}

pub async fn stats(ctx: &AppContext) -> CommandResult<StockSummary> {
    ctx.session.require(Screen::Stock).await?;
    let stock = ctx.backend.medicines().await?;
    Ok(StockSummary::of(&stock))
}

/// Saves changes to one stock line and remembers it as last edited.
pub async fn edit(
    ctx: &AppContext,
    id: MedicineId,
    batch: Option<ExpiryBatch>,
    changes: MedicineEdit,
) -> CommandResult<Medicine> {
    ctx.session.require(Screen::Stock).await?;

    let mut medicine = stock_line(ctx.backend.medicines().await?, id, batch)?;
    changes.apply(&mut medicine)?;

    ctx.backend.update_medicine(&medicine).await?;
    ctx.store.session().set_last_edited(id).await?;

    info!(id, name = %medicine.name, "Medicine updated");
    Ok(medicine)
}

pub async fn delete(ctx: &AppContext, id: MedicineId) -> CommandResult<()> {
    ctx.session.require(Screen::Stock).await?;

    ctx.backend.delete_medicine(id).await?;
    if ctx.store.session().clear_last_edited_if(id).await? {
        info!(id, "Last edited medicine deleted");
    }

    info!(id, "Medicine deleted");
    Ok(())
}

/// Posts a copy of a stock line under another expiry batch.
pub async fn duplicate(
    ctx: &AppContext,
    id: MedicineId,
    batch: Option<ExpiryBatch>,
    expiry: ExpiryBatch,
) -> CommandResult<()> {
    ctx.session.require(Screen::Stock).await?;

    let template = stock_line(ctx.backend.medicines().await?, id, batch)?;
    let payload = NewMedicinePayload::from_stock_line(&template, expiry, template.quantity);
    ctx.backend.create_medicine(&payload).await?;

    info!(id, expiry = %expiry, "Stock line duplicated");
    Ok(())
}

/// New-product form. The product starts with no stock.
pub async fn add(ctx: &AppContext, product: &NewMedicine) -> CommandResult<()> {
    ctx.session.require(Screen::NewProduct).await?;

    validate_new_medicine(product)?;
    ctx.backend
        .create_medicine(&NewMedicinePayload::from_form(product))
        .await?;

    info!(code = %product.code, name = %product.name, "Product created");
    Ok(())
}

// =============================================================================
// Command Line
// =============================================================================

impl TryFrom<EditArgs> for MedicineEdit {
    type Error = CommandError;

    fn try_from(args: EditArgs) -> CommandResult<Self> {
        Ok(MedicineEdit {
            code: args.code,
            name: args.name,
            form: args.form,
            presentation: args.presentation,
            ppv: args.ppv.map(Money::from_decimal),
            ph: args.ph.map(Money::from_decimal),
            quantity: args.quantity,
            expiry: args
                .expiry
                .as_deref()
                .map(ExpiryBatch::parse_flexible)
                .transpose()?,
            category: args.category,
        })
    }
}

impl TryFrom<NewProductArgs> for NewMedicine {
    type Error = CommandError;

    fn try_from(args: NewProductArgs) -> CommandResult<Self> {
        Ok(NewMedicine {
            code: args.code,
            name: args.name,
            expiry: ExpiryBatch::parse_flexible(&args.expiry)?,
            ppv: Money::from_decimal(args.ppv),
            presentation: args.presentation,
            form: args.form,
            ph: args.ph.map(Money::from_decimal),
        })
    }
}

fn print_grid(ctx: &AppContext, rows: &[Medicine]) {
    println!(
        "{:>5}  {:<14} {:<30} {:<22} {:>6} {:>5} {:>12}",
        "ID", "CODE", "DESIGNATION", "CATEGORIE", "PER", "QTE", "PPV"
    );
    for m in rows {
        println!(
            "{:>5}  {:<14} {:<30} {:<22} {:>6} {:>5} {:>12}",
            m.id,
            m.code,
            m.name,
            m.category.unwrap_or(Category::Other).label(),
            m.expiry_label(),
            m.quantity,
            ctx.money(m.ppv)
        );
    }
    println!("{} line(s)", rows.len());
}

pub async fn run(ctx: &AppContext, command: StockCommand) -> CommandResult<()> {
    match command {
        StockCommand::List { category, name } => {
            let rows = list(ctx, &StockFilter { category, name }).await?;
            print_grid(ctx, &rows);
        }
        StockCommand::Stats => {
            let summary = stats(ctx).await?;
            println!("Products in stock : {}", summary.in_stock);
            println!("Stock value       : {}", ctx.money(summary.total_value));
        }
        StockCommand::Edit(args) => {
            let id = args.id;
            let batch = parse_batch(args.batch.as_deref())?;
            let medicine = edit(ctx, id, batch, MedicineEdit::try_from(args)?).await?;
            print_grid(ctx, std::slice::from_ref(&medicine));
        }
        StockCommand::Delete { id } => {
            delete(ctx, id).await?;
            println!("Medicine {} deleted", id);
        }
        StockCommand::Duplicate { id, expiry, batch } => {
            let expiry = ExpiryBatch::parse(expiry.trim())?;
            duplicate(ctx, id, parse_batch(batch.as_deref())?, expiry).await?;
            println!("Medicine {} duplicated with expiry {}", id, expiry);
        }
        StockCommand::Add(args) => {
            let product = NewMedicine::try_from(args)?;
            add(ctx, &product).await?;
            println!("Product {} created", product.name.trim());
        }
    }
    Ok(())
}
