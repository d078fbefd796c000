//! # Pharmacy Counter Library
//!
//! Everything behind the `pharma-counter` binary: command line, config,
//! state and the command handlers of each screen.
//!
//! ## Application Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Pharmacy Counter                                 │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                  Terminal (stdin / stdout)                       │  │
//! │  │  • Barcode scanner       • Sales screen (counter)               │  │
//! │  │  • One-shot commands     • Invoice printing                     │  │
//! │  └──────────────────────────────┬───────────────────────────────────┘  │
//! │                                 ▼                                       │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                    Rust application (this crate)                 │  │
//! │  │                                                                  │  │
//! │  │  cli.rs ─────► clap definitions                                 │  │
//! │  │  config.rs ──► TOML file + environment                          │  │
//! │  │  commands/ ──► counter, sale, stock, credit, delivery, users    │  │
//! │  │  state/ ─────► AppContext { backend, store, cart, session }     │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                    │                              │                     │
//! │                    ▼                              ▼                     │
//! │  ┌──────────────────────────────┐  ┌──────────────────────────────┐    │
//! │  │ REST backend (pharma-api)    │  │ counter.db (pharma-store)    │    │
//! │  │ medicines, sales, credits,   │  │ cart, drafts, session flags  │    │
//! │  │ users, deliveries            │  │                              │    │
//! │  └──────────────────────────────┘  └──────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Startup Sequence
//! 1. Parse the command line
//! 2. Initialize tracing (stderr)
//! 3. Load configuration (file, then environment)
//! 4. `config` commands run here and stop
//! 5. Open the local store (app data directory) and build the HTTP client
//! 6. Restore the saved cart into the context
//! 7. Dispatch the command

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod state;

#[cfg(test)]
mod testing;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use directories::ProjectDirs;
use pharma_api::PharmacyClient;
use pharma_store::{LocalStore, StoreConfig, DATABASE_FILE};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::config::{AppConfig, ConfigError};
use crate::error::CommandResult;
use crate::state::AppContext;

/// Platform folders of the application.
///
/// ## Platform-Specific Paths
/// - **Linux**: `~/.config/counter/`, `~/.local/share/counter/`
/// - **macOS**: `~/Library/Application Support/com.pharma.counter/`
/// - **Windows**: `%APPDATA%\pharma\counter\`
pub(crate) fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "pharma", "counter")
}

/// Runs the command line and returns the process exit code.
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("error [INTERNAL_ERROR]: cannot start the async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(execute(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: Cli) -> CommandResult<()> {
    let config_path = cli.config.as_deref();

    if let Command::Config(cmd) = cli.command {
        // `config init` must work before the file exists.
        let config = AppConfig::load_or_default(config_path);
        return commands::config::run(&config, config_path, cmd);
    }

    let config = AppConfig::load(config_path)?;

    let db_path = database_path(&config)?;
    debug!(?db_path, "Database path determined");
    let store = LocalStore::new(StoreConfig::new(db_path)).await?;

    let client = PharmacyClient::new(&config.client_settings())?;
    info!(base_url = %config.api.base_url, "Backend client ready");

    let ctx = AppContext::new(config, Arc::new(client), store).await?;
    let result = commands::dispatch(&ctx, cli.command).await;

    ctx.store.close().await;
    result
}

/// Sets up the tracing subscriber.
///
/// `RUST_LOG` wins; otherwise `info` with debug for our crates, or `debug`
/// everywhere with `--verbose`. Logs go to stderr, command output to stdout.
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "debug"
    } else {
        "info,pharma=debug,sqlx=warn,reqwest=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// `store.database_path`, or `counter.db` in the platform data directory.
fn database_path(config: &AppConfig) -> Result<PathBuf, ConfigError> {
    if let Some(path) = &config.store.database_path {
        return Ok(path.clone());
    }
    let dirs = project_dirs().ok_or(ConfigError::NoConfigDir)?;
    Ok(dirs.data_dir().join(DATABASE_FILE))
}
