//! # Counter Screen
//!
//! The interactive sales screen. Lines typed (or sent by a barcode scanner)
//! on stdin are either counter commands or scanner keystrokes.
//!
//! ## Input Loop
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Counter Input Loop                                   │
//! │                                                                         │
//! │   stdin line ──► handle(line)                                           │
//! │                    ├── command word (+, -, del, add, sell, ...)        │
//! │                    ├── empty line    → Enter on an empty buffer        │
//! │                    └── anything else → keystrokes, then Enter          │
//! │                                                                         │
//! │   A scanner sends "6118000041\n": the newline is its terminator, so    │
//! │   the code resolves on the same line. The same code again inside the   │
//! │   duplicate window is ignored.                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Commands
//! | Input                            | Effect                               |
//! |----------------------------------|--------------------------------------|
//! | `+` / `-` / `del`                | last line: +1, −1, remove            |
//! | `add <name>`                     | adds a medicine by name              |
//! | `pick <n>`                       | chooses among ambiguous stock lines  |
//! | `discount <n> <pct>`             | discount on cart line n              |
//! | `cart`                           | cart and totals                      |
//! | `invoice [path]`                 | prints or writes the invoice         |
//! | `sell <cash\|card\|credit> [client]` | confirms the sale                |
//! | `return <MMYYYY...>`             | return, one batch per line           |
//! | `cancel`                         | drops the sale after a `y`           |
//! | `refresh`                        | reloads the catalog                  |
//! | `quit`                           | leaves the screen                    |

use std::io::Write as _;
use std::path::Path;

use chrono::NaiveDateTime;
use pharma_core::catalog::find_by_name;
use pharma_core::{
    Clock, Medicine, SaleType, SalesDesk, ScanKey, ScanOutcome, Screen, SystemClock,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use crate::error::{CommandError, CommandResult};
use crate::state::AppContext;

use super::sale::{self, CreditChange};
use super::{cart, now};

const HELP: &[&str] = &[
    "scan or type a code, then press Enter",
    "+ | - | del                       last cart line",
    "add <name>                        add by name",
    "pick <n>                          choose a stock line",
    "discount <n> <pct>                discount on line n",
    "cart | invoice [path]             show the sale",
    "sell <cash|card|credit> [client]  confirm the sale",
    "return <MMYYYY...>                return, one batch per line",
    "cancel | refresh | quit",
];

/// What the screen has to say after an input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Say(Vec<String>),
    Quit,
}

impl Reply {
    fn line(text: impl Into<String>) -> Self {
        Reply::Say(vec![text.into()])
    }
}

/// Sales screen state: the desk (scan buffer and catalog) over the shared
/// cart.
pub struct CounterScreen<C: Clock> {
    ctx: AppContext,
    desk: SalesDesk<C>,
    catalog: Vec<Medicine>,
    confirming_cancel: bool,
}

impl<C: Clock> CounterScreen<C> {
    /// Opens the screen with a fresh catalog.
    pub async fn open(ctx: AppContext, clock: C) -> CommandResult<Self> {
        ctx.session.require(Screen::Sales).await?;
        let catalog = ctx.backend.medicines().await?;
        let desk = SalesDesk::new(clock, ctx.config.scan_timing(), catalog.clone());
        debug!(entries = catalog.len(), "Counter catalog loaded");

        Ok(CounterScreen {
            ctx,
            desk,
            catalog,
            confirming_cancel: false,
        })
    }

    /// Handles one input line.
    pub async fn handle(&mut self, line: &str, now: NaiveDateTime) -> CommandResult<Reply> {
        if self.confirming_cancel {
            self.confirming_cancel = false;
            return if is_yes(line) {
                sale::cancel(&self.ctx).await?;
                Ok(Reply::line("Sale cancelled"))
            } else {
                Ok(Reply::line("Sale kept"))
            };
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            return self.key(ScanKey::Enter).await.map(Reply::Say);
        }

        let (word, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (trimmed, ""),
        };

        match word.to_lowercase().as_str() {
            "+" => self.key(ScanKey::ArrowUp).await.map(Reply::Say),
            "-" => self.key(ScanKey::ArrowDown).await.map(Reply::Say),
            "del" => self.key(ScanKey::Delete).await.map(Reply::Say),
            "add" => self.add_by_name(rest).await,
            "pick" => self.pick(rest).await,
            "discount" => self.discount(rest).await,
            "cart" => {
                let text = self.ctx.cart.with_cart(|c| cart::render(&self.ctx, c));
                Ok(Reply::Say(text.lines().map(str::to_string).collect()))
            }
            "invoice" => self.invoice(rest, now).await,
            "sell" => self.sell(rest, now).await,
            "return" => self.process_return(rest, now).await,
            "cancel" => {
                if self.ctx.cart.with_cart(|c| c.is_empty()) {
                    return Ok(Reply::line("Cart is empty"));
                }
                self.confirming_cancel = true;
                Ok(Reply::line("Cancel the current sale? (y/n)"))
            }
            "refresh" => {
                self.catalog = self.ctx.backend.medicines().await?;
                self.desk.set_catalog(self.catalog.clone());
                Ok(Reply::line(format!("{} stock line(s) loaded", self.catalog.len())))
            }
            "help" | "?" => Ok(Reply::Say(HELP.iter().map(|s| s.to_string()).collect())),
            "quit" | "exit" => Ok(Reply::Quit),
            _ => {
                // Scanner keystrokes; the end of the line is the Enter key.
                let desk = &mut self.desk;
                let outcome = self
                    .ctx
                    .cart
                    .update(|c| {
                        for ch in trimmed.chars() {
                            desk.key(ScanKey::Char(ch), c)?;
                        }
                        desk.key(ScanKey::Enter, c)
                    })
                    .await?;
                Ok(Reply::Say(self.describe(outcome)))
            }
        }
    }

    async fn key(&mut self, key: ScanKey) -> CommandResult<Vec<String>> {
        let desk = &mut self.desk;
        let outcome = self.ctx.cart.update(|c| desk.key(key, c)).await?;
        Ok(self.describe(outcome))
    }

    async fn add_by_name(&mut self, name: &str) -> CommandResult<Reply> {
        let medicine = find_by_name(&self.catalog, name)?.clone();
        let quantity = self.ctx.cart.update(|c| c.add(&medicine)).await?;
        Ok(Reply::Say(self.describe(ScanOutcome::Added {
            medicine_id: medicine.id,
            name: medicine.name,
            quantity,
        })))
    }

    async fn pick(&mut self, raw: &str) -> CommandResult<Reply> {
        let index = parse_position(raw)?;
        let desk = &mut self.desk;
        match self.ctx.cart.update(|c| desk.select(index, c)).await? {
            Some(outcome) => Ok(Reply::Say(self.describe(outcome))),
            None => Ok(Reply::line("Nothing to pick at that position")),
        }
    }

    async fn discount(&mut self, rest: &str) -> CommandResult<Reply> {
        let (position, percent) = rest
            .split_once(char::is_whitespace)
            .ok_or_else(|| CommandError::validation("Usage: discount <line> <percent>"))?;
        let index = parse_position(position)?;
        let percent: u32 = percent
            .trim()
            .trim_end_matches('%')
            .parse()
            .map_err(|_| CommandError::validation(format!("Invalid percent '{}'", percent.trim())))?;

        let id = self
            .ctx
            .cart
            .with_cart(|c| c.items.get(index).map(|item| item.medicine_id()))
            .ok_or_else(|| CommandError::not_found("Cart line", position.trim()))?;

        self.ctx.cart.update(|c| c.set_discount(id, percent)).await?;
        Ok(Reply::Say(vec![
            format!("Line {}: -{}%", index + 1, percent),
            self.total_line(),
        ]))
    }

    async fn invoice(&mut self, path: &str, now: NaiveDateTime) -> CommandResult<Reply> {
        let text = cart::invoice(&self.ctx, now).await?.render();
        if path.is_empty() {
            return Ok(Reply::Say(text.lines().map(str::to_string).collect()));
        }
        std::fs::write(Path::new(path), &text)?;
        info!(path, "Invoice written");
        Ok(Reply::line(format!("Invoice written to {}", path)))
    }

    async fn sell(&mut self, rest: &str, now: NaiveDateTime) -> CommandResult<Reply> {
        let (kind, client) = match rest.split_once(char::is_whitespace) {
            Some((kind, client)) => (kind, Some(client.trim())),
            None => (rest, None),
        };
        if kind.is_empty() {
            return Err(CommandError::validation("Usage: sell <cash|card|credit> [client]"));
        }
        let sale_type: SaleType = kind.parse()?;

        let receipt = sale::checkout(&self.ctx, sale_type, client, now).await?;
        let mut lines = vec![format!(
            "{} sale confirmed: {} article(s), {}",
            receipt.sale_type,
            receipt.articles,
            self.ctx.money(receipt.total)
        )];
        match receipt.credit {
            Some(CreditChange::Opened { client, remaining }) => lines.push(format!(
                "Credit opened for {}: {} due",
                client,
                self.ctx.money(remaining)
            )),
            Some(CreditChange::Increased { client, remaining }) => lines.push(format!(
                "Credit of {} now {} due",
                client,
                self.ctx.money(remaining)
            )),
            None => {}
        }

        self.refresh_quietly().await;
        Ok(Reply::Say(lines))
    }

    async fn process_return(&mut self, rest: &str, now: NaiveDateTime) -> CommandResult<Reply> {
        let batches: Vec<String> = rest.split_whitespace().map(str::to_string).collect();
        let receipt = sale::process_return(&self.ctx, &batches, now).await?;
        self.refresh_quietly().await;
        Ok(Reply::line(format!(
            "Return recorded: {} article(s), {} line(s) restocked, {} created",
            receipt.articles, receipt.restocked, receipt.created
        )))
    }

    /// Stock moved; a failed reload keeps the old catalog.
    async fn refresh_quietly(&mut self) {
        match self.ctx.backend.medicines().await {
            Ok(catalog) => {
                self.desk.set_catalog(catalog.clone());
                self.catalog = catalog;
            }
            Err(e) => warn!(error = %e, "Catalog reload failed"),
        }
    }

    fn total_line(&self) -> String {
        let total = self.ctx.cart.with_cart(|c| c.total());
        format!("Total: {}", self.ctx.money(total))
    }

    fn describe(&self, outcome: ScanOutcome) -> Vec<String> {
        match outcome {
            ScanOutcome::Pending | ScanOutcome::Empty => Vec::new(),
            ScanOutcome::Suppressed { code } => {
                vec![format!("Duplicate scan of {} ignored", code)]
            }
            ScanOutcome::NotFound { code } => vec![format!("No medicine with code {}", code)],
            ScanOutcome::Ambiguous { code, candidates } => {
                let mut lines = vec![format!(
                    "{} stock lines for {}, choose with pick <n>:",
                    candidates.len(),
                    code
                )];
                for (i, m) in candidates.iter().enumerate() {
                    lines.push(format!(
                        "  {}. {:<30} {:>8} {:>12}  stock {}",
                        i + 1,
                        m.name,
                        m.expiry_label(),
                        self.ctx.money(m.ppv),
                        m.quantity
                    ));
                }
                lines
            }
            ScanOutcome::Added { name, quantity, .. } => {
                vec![format!("{} x{}", name, quantity), self.total_line()]
            }
            ScanOutcome::Adjusted { quantity, .. } => {
                vec![format!("Quantity {}", quantity), self.total_line()]
            }
            ScanOutcome::Removed { .. } => vec!["Line removed".to_string(), self.total_line()],
            ScanOutcome::NoLine => vec!["Cart is empty".to_string()],
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(
        answer.trim().to_lowercase().as_str(),
        "y" | "yes" | "o" | "oui"
    )
}

/// 1-based position typed by the operator, as an index.
fn parse_position(raw: &str) -> CommandResult<usize> {
    match raw.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n - 1),
        _ => Err(CommandError::validation(format!(
            "Invalid position '{}'",
            raw.trim()
        ))),
    }
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

/// Runs the counter until `quit` or end of input.
pub async fn run(ctx: &AppContext) -> CommandResult<()> {
    let mut screen = CounterScreen::open(ctx.clone(), SystemClock).await?;
    info!("Counter opened");

    println!("Counter ready, `help` lists the commands");
    if !ctx.cart.with_cart(|c| c.is_empty()) {
        println!("{}", ctx.cart.with_cart(|c| cart::render(ctx, c)));
    }
    prompt();

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = input.next_line().await? {
        match screen.handle(&line, now()).await {
            Ok(Reply::Quit) => break,
            Ok(Reply::Say(lines)) => print_lines(&lines),
            Err(e) => eprintln!("{}", e),
        }
        prompt();
    }

    info!("Counter closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::testing::{at, batch, doliprane, logged_in, spasfon, FakeBackend};
    use pharma_core::{ManualClock, Money};

    async fn screen(medicines: Vec<Medicine>) -> (CounterScreen<ManualClock>, ManualClock, FakeBackend) {
        let fake = FakeBackend::with_medicines(medicines);
        let ctx = logged_in(fake.clone(), "youssef", false).await;
        let clock = ManualClock::new();
        let screen = CounterScreen::open(ctx, clock.clone()).await.unwrap();
        (screen, clock, fake)
    }

    fn now() -> NaiveDateTime {
        at(2025, 10, 12, 10, 0)
    }

    fn said(reply: Reply) -> Vec<String> {
        match reply {
            Reply::Say(lines) => lines,
            Reply::Quit => panic!("unexpected quit"),
        }
    }

    #[tokio::test]
    async fn test_scanned_line_resolves_at_once() {
        let (mut screen, _, _) = screen(vec![doliprane(), spasfon()]).await;

        let lines = said(screen.handle("6118000041", now()).await.unwrap());
        assert_eq!(lines[0], "DOLIPRANE 1G x1");
        assert_eq!(screen.ctx.cart.snapshot().total(), Money::from_cents(1980));
        assert!(screen.desk.deadline().is_none());

        let lines = said(screen.handle("9999", now()).await.unwrap());
        assert_eq!(lines, vec!["No medicine with code 9999".to_string()]);

        assert!(said(screen.handle("", now()).await.unwrap()).is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_scan_ignored() {
        let (mut screen, clock, _) = screen(vec![doliprane()]).await;

        screen.handle("6118000041", now()).await.unwrap();

        clock.advance(100);
        let lines = said(screen.handle("6118000041", now()).await.unwrap());
        assert!(lines[0].contains("ignored"));
        assert_eq!(screen.ctx.cart.snapshot().article_count(), 1);

        clock.advance(2000);
        screen.handle("6118000041", now()).await.unwrap();
        assert_eq!(screen.ctx.cart.snapshot().article_count(), 2);
    }

    #[tokio::test]
    async fn test_ambiguous_code_then_pick() {
        let other_batch = Medicine {
            id: 7,
            expiry: Some(batch("112026")),
            ..doliprane()
        };
        let (mut screen, _, _) = screen(vec![doliprane(), other_batch]).await;

        let lines = said(screen.handle("6118000041", now()).await.unwrap());
        assert!(lines[0].starts_with("2 stock lines"));
        assert!(screen.ctx.cart.snapshot().is_empty());

        let err = screen.handle("pick 0", now()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        screen.handle("pick 2", now()).await.unwrap();
        let cart = screen.ctx.cart.snapshot();
        assert_eq!(cart.items[0].medicine_id(), 7);
    }

    #[tokio::test]
    async fn test_shortcuts_on_last_line() {
        let (mut screen, _, _) = screen(vec![doliprane(), spasfon()]).await;

        screen.handle("add doli", now()).await.unwrap();
        screen.handle("add spasfon", now()).await.unwrap();
        screen.handle("+", now()).await.unwrap();
        assert_eq!(screen.ctx.cart.snapshot().items[1].quantity, 2);

        screen.handle("del", now()).await.unwrap();
        screen.handle("-", now()).await.unwrap();
        assert!(screen.ctx.cart.snapshot().is_empty());

        let lines = said(screen.handle("del", now()).await.unwrap());
        assert_eq!(lines, vec!["Cart is empty".to_string()]);
    }

    #[tokio::test]
    async fn test_discount_and_sell() {
        let (mut screen, _, fake) = screen(vec![doliprane(), spasfon()]).await;

        screen.handle("add spasfon", now()).await.unwrap();
        screen.handle("discount 1 10%", now()).await.unwrap();
        assert_eq!(screen.ctx.cart.snapshot().total(), Money::from_cents(1800));

        let err = screen.handle("discount 3 10", now()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err = screen.handle("sell credit", now()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let lines = said(screen.handle("sell credit Karim", now()).await.unwrap());
        assert!(lines[1].contains("Karim"));
        assert!(screen.ctx.cart.snapshot().is_empty());
        assert_eq!(fake.data().credits.len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_asks_first() {
        let (mut screen, _, _) = screen(vec![doliprane()]).await;
        screen.handle("add doliprane", now()).await.unwrap();

        screen.handle("cancel", now()).await.unwrap();
        assert_eq!(said(screen.handle("n", now()).await.unwrap()), vec!["Sale kept"]);
        assert!(!screen.ctx.cart.snapshot().is_empty());

        screen.handle("cancel", now()).await.unwrap();
        screen.handle("oui", now()).await.unwrap();
        assert!(screen.ctx.cart.snapshot().is_empty());

        assert_eq!(screen.handle("quit", now()).await.unwrap(), Reply::Quit);
    }
}
