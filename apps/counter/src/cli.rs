//! # Command Line
//!
//! One subcommand per screen of the counter.
//!
//! ```text
//! pharma-counter [--config PATH] [--verbose] <command>
//!
//!   login / logout / whoami       session
//!   counter                       interactive sales screen
//!   cart      show|clear|invoice  saved cart
//!   stock     list|stats|edit|delete|duplicate|add
//!   credit    list|payments|pay|sheet
//!   delivery  list|show|new|add-line|search|push|remove
//!   users     list|add|delete|toggle-admin
//!   history   [--date YYYY-MM-DD]
//!   stats
//!   config    show|init
//! ```

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use pharma_core::{Category, MedicineId};

#[derive(Debug, Parser)]
#[command(name = "pharma-counter", version, about = "Pharmacy counter: sales, stock, credits and deliveries")]
pub struct Cli {
    /// Configuration file (defaults to the platform config directory).
    #[arg(long, global = true, env = "PHARMA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Debug logging unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Opens a session.
    Login { username: String, password: String },

    /// Closes the session.
    Logout,

    /// Shows the connected operator.
    Whoami,

    /// Interactive sales screen (barcode scanner input).
    Counter,

    #[command(subcommand)]
    Cart(CartCommand),

    #[command(subcommand)]
    Stock(StockCommand),

    #[command(subcommand)]
    Credit(CreditCommand),

    #[command(subcommand)]
    Delivery(DeliveryCommand),

    #[command(subcommand)]
    Users(UsersCommand),

    /// Sales history.
    History {
        /// Only sales of this day.
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Sales dashboard.
    Stats,

    #[command(subcommand)]
    Config(ConfigCommand),
}

// =============================================================================
// Cart
// =============================================================================

#[derive(Debug, Subcommand)]
pub enum CartCommand {
    /// Lines and totals of the saved cart.
    Show,

    /// Empties the cart.
    Clear {
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },

    /// Prints the invoice of the cart.
    Invoice {
        /// Write to a file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

// =============================================================================
// Stock
// =============================================================================

#[derive(Debug, Subcommand)]
pub enum StockCommand {
    /// Stock grid, sorted by name.
    List {
        #[arg(long)]
        category: Option<Category>,

        /// Name contains (case-insensitive).
        #[arg(long)]
        name: Option<String>,
    },

    /// Products in stock and stock value.
    Stats,

    /// Changes fields of a stock line.
    Edit(EditArgs),

    /// Deletes a medicine.
    Delete { id: MedicineId },

    /// Copies a stock line under another expiry batch.
    Duplicate {
        id: MedicineId,

        /// New expiry batch (MMYYYY).
        expiry: String,

        /// Batch of the line to copy when the id has several.
        #[arg(long)]
        batch: Option<String>,
    },

    /// Creates a product (stock 0).
    Add(NewProductArgs),
}

#[derive(Debug, Args)]
pub struct EditArgs {
    pub id: MedicineId,

    /// Batch of the line to edit when the id has several.
    #[arg(long)]
    pub batch: Option<String>,

    #[arg(long)]
    pub code: Option<String>,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub form: Option<String>,

    #[arg(long)]
    pub presentation: Option<String>,

    #[arg(long)]
    pub ppv: Option<f64>,

    #[arg(long)]
    pub ph: Option<f64>,

    #[arg(long)]
    pub quantity: Option<i64>,

    /// New expiry batch (MMYYYY or YYYY-MM-DD).
    #[arg(long)]
    pub expiry: Option<String>,

    #[arg(long)]
    pub category: Option<Category>,
}

#[derive(Debug, Args)]
pub struct NewProductArgs {
    #[arg(long)]
    pub code: String,

    #[arg(long)]
    pub name: String,

    /// MMYYYY or a calendar date (YYYY-MM-DD).
    #[arg(long)]
    pub expiry: String,

    #[arg(long)]
    pub ppv: f64,

    #[arg(long, default_value = "")]
    pub presentation: String,

    #[arg(long, default_value = "")]
    pub form: String,

    #[arg(long)]
    pub ph: Option<f64>,
}

// =============================================================================
// Credits
// =============================================================================

#[derive(Debug, Subcommand)]
pub enum CreditCommand {
    /// Credit accounts.
    List {
        /// Client name contains (case-insensitive).
        #[arg(long)]
        client: Option<String>,
    },

    /// Payments of a credit.
    Payments { id: i64 },

    /// Records a payment.
    Pay {
        id: i64,

        #[arg(required_unless_present = "all")]
        amount: Option<f64>,

        /// Pay the whole remaining amount.
        #[arg(long, conflicts_with = "amount")]
        all: bool,
    },

    /// Sales and payments of one client.
    Sheet { client: String },
}

// =============================================================================
// Deliveries
// =============================================================================

#[derive(Debug, Subcommand)]
pub enum DeliveryCommand {
    /// Saved delivery notes.
    List {
        #[arg(long, default_value_t = 1)]
        page: usize,
    },

    /// Lines of one note.
    Show { number: String },

    /// Saves a new draft.
    New {
        number: String,
        supplier: String,

        /// Reception date (today when omitted).
        #[arg(long)]
        date: Option<NaiveDate>,

        /// `MEDICINE_ID=QUANTITY`, at least one.
        #[arg(long = "line", required = true, value_parser = parse_line)]
        lines: Vec<(MedicineId, i64)>,
    },

    /// Adds a line to a draft.
    AddLine {
        number: String,
        medicine_id: MedicineId,
        quantity: i64,
    },

    /// Finds medicines by name or code (5 hits at most).
    Search { query: String },

    /// Sends a draft to the backend.
    Push { number: String },

    /// Deletes a note.
    Remove { number: String },
}

fn parse_line(raw: &str) -> Result<(MedicineId, i64), String> {
    let (id, quantity) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected MEDICINE_ID=QUANTITY, got '{}'", raw))?;
    let id = id
        .trim()
        .parse()
        .map_err(|_| format!("invalid medicine id '{}'", id))?;
    let quantity = quantity
        .trim()
        .parse()
        .map_err(|_| format!("invalid quantity '{}'", quantity))?;
    Ok((id, quantity))
}

// =============================================================================
// Users
// =============================================================================

#[derive(Debug, Subcommand)]
pub enum UsersCommand {
    List,

    /// Creates a non-admin user.
    Add { username: String, password: String },

    Delete { id: i64 },

    /// Grants or revokes admin rights.
    ToggleAdmin { id: i64 },
}

// =============================================================================
// Config
// =============================================================================

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Prints the effective configuration.
    Show,

    /// Writes a config file with the effective values.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}
