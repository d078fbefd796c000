//! # Cart State
//!
//! The current sale, shared by every command that touches it and mirrored
//! to the local store after each change.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart State Operations                                │
//! │                                                                         │
//! │  Counter action           CartState               Local store           │
//! │  ──────────────           ─────────               ───────────           │
//! │                                                                         │
//! │  scan / add <name> ──────► update(|c| c.add) ───► pharmaCart = [...]   │
//! │  + / - / del ────────────► update(|c| ...) ─────► pharmaCart = [...]   │
//! │  discount ───────────────► update(|c| ...) ─────► pharmaCart = [...]   │
//! │  sell / return / cancel ─► clear() ─────────────► pharmaCart deleted   │
//! │  cart show / invoice ────► with_cart(|c| ...)     (read only)          │
//! │                                                                         │
//! │  NOTE: the lock is never held across an await; the snapshot is        │
//! │        cloned out before it is written.                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use pharma_core::{Cart, CoreResult};
use pharma_store::{CartRepository, StoreResult};
use tracing::debug;

use crate::error::CommandResult;

/// Shared cart plus its persistence.
#[derive(Debug, Clone)]
pub struct CartState {
    cart: Arc<Mutex<Cart>>,
    repo: CartRepository,
}

impl CartState {
    /// Restores the cart saved by the previous session.
    pub async fn restore(repo: CartRepository) -> StoreResult<Self> {
        let cart = repo.load().await?;
        if !cart.is_empty() {
            debug!(lines = cart.line_count(), "Restored saved cart");
        }
        Ok(CartState {
            cart: Arc::new(Mutex::new(cart)),
            repo,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Cart> {
        // A panic mid-mutation leaves a usable cart; keep going with it.
        self.cart.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Executes a function with read access to the cart.
    pub fn with_cart<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Cart) -> R,
    {
        f(&self.lock())
    }

    /// Copy of the cart as it is now.
    pub fn snapshot(&self) -> Cart {
        self.lock().clone()
    }

    /// Applies a mutation and saves the result.
    ///
    /// A rejected mutation is returned as-is and nothing is written; an
    /// accepted one that left the cart unchanged is not written either.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let quantity = cart.update(|c| c.add(&medicine)).await?;
    /// ```
    pub async fn update<F, R>(&self, f: F) -> CommandResult<R>
    where
        F: FnOnce(&mut Cart) -> CoreResult<R>,
    {
        let (result, changed) = {
            let mut cart = self.lock();
            let before = cart.clone();
            let result = f(&mut cart)?;
            let changed = (*cart != before).then(|| cart.clone());
            (result, changed)
        };
        if let Some(snapshot) = changed {
            self.repo.save(&snapshot).await?;
        }
        Ok(result)
    }

    /// Empties the cart in memory and in the store.
    pub async fn clear(&self) -> StoreResult<()> {
        self.lock().clear();
        self.repo.clear().await
    }
}
