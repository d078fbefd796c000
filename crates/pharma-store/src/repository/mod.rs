//! # Repository Module
//!
//! Typed access to the local key-value table.
//!
//! ## Layering
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  CartRepository      DeliveryRepository      SessionRepository         │
//! │  "pharmaCart"        "documents"             "connectedUser"           │
//! │                                              "isAdmin"                 │
//! │                                              "lastEditedId"            │
//! │       │                     │                        │                  │
//! │       └─────────────────────┼────────────────────────┘                  │
//! │                             ▼                                           │
//! │                      KvRepository                                       │
//! │          get<T> / put<T> / delete / keys  (JSON text values)           │
//! │                             │                                           │
//! │                             ▼                                           │
//! │                     kv_entries (SQLite)                                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`KvRepository`](kv::KvRepository) - Raw JSON values by key
//! - [`CartRepository`](cart::CartRepository) - Cart snapshot
//! - [`DeliveryRepository`](deliveries::DeliveryRepository) - Delivery drafts
//! - [`SessionRepository`](session::SessionRepository) - Login flags, last edited row

pub mod cart;
pub mod deliveries;
pub mod kv;
pub mod session;

/// Local storage keys. Shared with the browser build of the counter, so the
/// names must not change.
pub mod keys {
    pub const CART: &str = "pharmaCart";
    pub const DOCUMENTS: &str = "documents";
    pub const LAST_EDITED_ID: &str = "lastEditedId";
    pub const CONNECTED_USER: &str = "connectedUser";
    pub const IS_ADMIN: &str = "isAdmin";
}
