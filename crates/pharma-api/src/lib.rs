//! # pharma-api: Pharmacy Backend Client
//!
//! JSON/HTTP access to the pharmacy backend that owns medicines, sales,
//! credits, users and deliveries.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  pharma-counter commands                                               │
//! │       │  Arc<dyn PharmacyBackend>                                      │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  pharma-api (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │  backend.rs   PharmacyBackend trait (one method per endpoint)   │   │
//! │  │  client.rs    PharmacyClient: reqwest, timeouts, status mapping │   │
//! │  │  wire.rs      DTOs with the backend's field names               │   │
//! │  │  error.rs     ClientError                                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  http://localhost:7194/api                                             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! use pharma_api::{ClientSettings, PharmacyBackend, PharmacyClient};
//!
//! let client = PharmacyClient::new(&ClientSettings::default())?;
//! let medicines = client.medicines().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod backend;
pub mod client;
pub mod error;
pub mod wire;

// =============================================================================
// Re-exports
// =============================================================================

pub use backend::PharmacyBackend;
pub use client::{ClientSettings, PharmacyClient, DEFAULT_BASE_URL};
pub use error::{ClientError, ClientResult};
pub use wire::NewMedicinePayload;
