//! # pharma-store: Local Storage for the Pharmacy Counter
//!
//! Everything the counter keeps between runs on the workstation itself: the
//! cart being sold, delivery drafts, the logged-in operator, and the last
//! edited stock row. The backend remains the source of truth for everything
//! else.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Counter Data Flow                                │
//! │                                                                         │
//! │  pharma-counter command (sell, delivery new, login ...)                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  pharma-store (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │  LocalStore   │    │  Repositories  │    │  Migrations  │  │   │
//! │  │   │  (pool.rs)    │◄───│ Cart Delivery  │    │  (embedded)  │  │   │
//! │  │   │  SqlitePool   │    │ Session Kv     │    │ 001_local..  │  │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  <data dir>/counter.db   (kv_entries: key → JSON text)                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pharma_store::{LocalStore, StoreConfig};
//!
//! let store = LocalStore::new(StoreConfig::new(data_dir.join("counter.db"))).await?;
//! let cart = store.cart().load().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{StoreError, StoreResult};
pub use pool::{LocalStore, StoreConfig};

pub use repository::cart::CartRepository;
pub use repository::deliveries::DeliveryRepository;
pub use repository::kv::KvRepository;
pub use repository::session::SessionRepository;

/// File name of the store inside the data directory.
pub const DATABASE_FILE: &str = "counter.db";
