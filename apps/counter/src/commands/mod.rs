//! # Commands Module
//!
//! One module per screen. Each exposes typed operations that return data
//! (tested against a fake backend) and a `run` that prints them.
//!
//! ## Module Organization
//! ```text
//! commands/
//! ├── mod.rs       ◄─── You are here (dispatch + prompt helpers)
//! ├── auth.rs      ◄─── login, logout, whoami
//! ├── counter.rs   ◄─── interactive sales screen
//! ├── sale.rs      ◄─── checkout, return, cancel
//! ├── cart.rs      ◄─── saved cart, invoice
//! ├── stock.rs     ◄─── stock grid and product edits
//! ├── credit.rs    ◄─── credit accounts and payments
//! ├── delivery.rs  ◄─── delivery notes
//! ├── users.rs     ◄─── accounts (settings screen)
//! ├── history.rs   ◄─── sales history and dashboard
//! └── config.rs    ◄─── config show / init
//! ```

pub mod auth;
pub mod cart;
pub mod config;
pub mod counter;
pub mod credit;
pub mod delivery;
pub mod history;
pub mod sale;
pub mod stock;
pub mod users;

use std::io::{BufRead, Write};

use chrono::{Local, NaiveDate, NaiveDateTime};

use crate::cli::Command;
use crate::error::{CommandError, CommandResult};
use crate::state::AppContext;

/// Local wall-clock time, as sales are dated.
pub(crate) fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

pub(crate) fn today() -> NaiveDate {
    now().date()
}

/// Asks a yes/no question on stdin. Anything but y/yes/o/oui is a no.
pub(crate) fn confirm(question: &str) -> std::io::Result<bool> {
    print!("{} (y/n) ", question);
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_lowercase().as_str(),
        "y" | "yes" | "o" | "oui"
    ))
}

/// Routes a parsed command to its screen.
///
/// `config` subcommands never get here: they run before the context exists.
pub async fn dispatch(ctx: &AppContext, command: Command) -> CommandResult<()> {
    match command {
        Command::Login { username, password } => {
            let session = auth::login(ctx, &username, &password).await?;
            println!("Logged in as {}", auth::describe(&session));
        }
        Command::Logout => {
            auth::logout(ctx).await?;
            println!("Logged out");
        }
        Command::Whoami => match auth::whoami(ctx).await? {
            Some(session) => println!("{}", auth::describe(&session)),
            None => println!("Not logged in"),
        },
        Command::Counter => counter::run(ctx).await?,
        Command::Cart(cmd) => cart::run(ctx, cmd).await?,
        Command::Stock(cmd) => stock::run(ctx, cmd).await?,
        Command::Credit(cmd) => credit::run(ctx, cmd).await?,
        Command::Delivery(cmd) => delivery::run(ctx, cmd).await?,
        Command::Users(cmd) => users::run(ctx, cmd).await?,
        Command::History { date } => {
            let history = history::history(ctx, date, today()).await?;
            history::print_history(ctx, &history);
        }
        Command::Stats => {
            let stats = history::stats(ctx, now()).await?;
            history::print_stats(ctx, &stats);
        }
        Command::Config(_) => {
            return Err(CommandError::internal(
                "config commands run without the application context",
            ))
        }
    }
    Ok(())
}
