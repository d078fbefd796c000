//! # State Module
//!
//! Everything a command handler needs, gathered in one explicit
//! [`AppContext`] that is passed to every screen.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                        AppContext                               │   │
//! │  │                                                                 │   │
//! │  │  ┌──────────────┐ ┌──────────────┐ ┌──────────────────────────┐ │   │
//! │  │  │ SessionState │ │  CartState   │ │ backend                  │ │   │
//! │  │  │              │ │              │ │ Arc<dyn PharmacyBackend> │ │   │
//! │  │  │ connectedUser│ │ Arc<Mutex<   │ │ (HTTP client, or a fake  │ │   │
//! │  │  │ isAdmin      │ │   Cart>>     │ │  in tests)               │ │   │
//! │  │  └──────────────┘ └──────────────┘ └──────────────────────────┘ │   │
//! │  │  ┌──────────────┐ ┌──────────────────────────────────────────┐  │   │
//! │  │  │ LocalStore   │ │ AppConfig (read-only after start)        │  │   │
//! │  │  │ (SQLite kv)  │ │                                          │  │   │
//! │  │  └──────────────┘ └──────────────────────────────────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod cart;
mod session;

use std::sync::Arc;

use pharma_api::PharmacyBackend;
use pharma_core::Money;
use pharma_store::{LocalStore, StoreResult};

use crate::config::AppConfig;

pub use cart::CartState;
pub use session::SessionState;

/// Handles shared by every command.
#[derive(Clone)]
pub struct AppContext {
    pub config: AppConfig,
    pub backend: Arc<dyn PharmacyBackend>,
    pub store: LocalStore,
    pub cart: CartState,
    pub session: SessionState,
}

impl AppContext {
    /// Wires the context and restores the saved cart.
    pub async fn new(
        config: AppConfig,
        backend: Arc<dyn PharmacyBackend>,
        store: LocalStore,
    ) -> StoreResult<Self> {
        let cart = CartState::restore(store.cart()).await?;
        let session = SessionState::new(store.session());
        Ok(AppContext {
            config,
            backend,
            store,
            cart,
            session,
        })
    }

    /// Formats an amount with the configured currency label.
    pub fn money(&self, amount: Money) -> String {
        amount.format_with(&self.config.pharmacy.currency)
    }
}
