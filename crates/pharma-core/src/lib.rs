//! # pharma-core: Pure Business Logic for the Pharmacy Counter
//!
//! Everything the counter computes lives here as plain functions and types
//! with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Pharmacy Counter Architecture                       │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 pharma-counter (terminal screens)               │   │
//! │  │   Sales ─ Stock ─ Credits ─ Deliveries ─ History ─ Settings     │   │
//! │  └──────────────┬──────────────────────────────┬───────────────────┘   │
//! │                 │                              │                        │
//! │  ┌──────────────▼───────────────┐  ┌───────────▼──────────────────┐    │
//! │  │ pharma-api (REST backend)    │  │ pharma-store (local SQLite)  │    │
//! │  └──────────────┬───────────────┘  └───────────┬──────────────────┘    │
//! │                 │                              │                        │
//! │  ┌──────────────▼──────────────────────────────▼───────────────────┐   │
//! │  │               ★ pharma-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   types   money   expiry   cart   scan   desk   catalog         │   │
//! │  │   delivery   session   stats   invoice   validation             │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • NO SYSTEM CLOCK                         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Medicine, Sale, Credit, Payment, User
//! - [`money`] - Integer centimes
//! - [`expiry`] - The `MMYYYY` expiry batch
//! - [`cart`] - Lines, discounts, totals
//! - [`scan`] - Barcode keystroke buffer and layout decoding
//! - [`desk`] - Sales screen keys: scan resolution and cart shortcuts
//! - [`catalog`] - Lookups, stock filter, restock target, pagination
//! - [`delivery`] - Delivery notes and the local draft book
//! - [`session`] - Login and route guard
//! - [`stats`] - Sales history and dashboard figures
//! - [`invoice`] - Printable invoice
//! - [`validation`] - Input rules
//! - [`error`] - Domain errors
//!
//! ## Example Usage
//!
//! ```rust
//! use pharma_core::{Cart, Money};
//! # use pharma_core::Medicine;
//! # let doliprane = Medicine { id: 1, code: "611".into(), name: "DOLIPRANE".into(),
//! #   form: String::new(), presentation: String::new(), ppv: Money::from_cents(1560),
//! #   ph: Money::zero(), quantity: 10, expiry: None, category: None,
//! #   raw: Default::default() };
//!
//! let mut cart = Cart::new();
//! cart.add(&doliprane).unwrap();
//! cart.add(&doliprane).unwrap();
//! cart.set_discount(doliprane.id, 10).unwrap();
//!
//! // 15.60 × 2 × 0.9
//! assert_eq!(cart.total(), Money::from_cents(2808));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod catalog;
pub mod delivery;
pub mod desk;
pub mod error;
pub mod expiry;
pub mod invoice;
pub mod money;
pub mod scan;
pub mod session;
pub mod stats;
pub mod types;
pub mod validation;

#[cfg(test)]
pub(crate) mod testing;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartItem, CartTotals};
pub use delivery::{DeliveryBook, DeliveryDocument, DeliveryLine};
pub use desk::{SalesDesk, ScanKey, ScanOutcome};
pub use error::{CoreError, CoreResult, ValidationError};
pub use expiry::ExpiryBatch;
pub use money::Money;
pub use scan::{Clock, ManualClock, ScanTiming, SystemClock};
pub use session::{Access, Screen, Session};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line.
///
/// Guards against a stuck key or a mistyped quantity (1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Pharmacy name printed on invoices when none is configured.
pub const DEFAULT_PHARMACY_NAME: &str = "PHARMACIE EL ABAWAIN";
