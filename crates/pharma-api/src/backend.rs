//! # Backend Trait
//!
//! Every call the counter makes to the pharmacy backend, as one trait.
//! [`PharmacyClient`](crate::PharmacyClient) implements it over HTTP; the
//! counter's workflow tests implement it in memory.
//!
//! ## Endpoints
//! ```text
//! medicines()            GET    /medicines
//! create_medicine()      POST   /medicines
//! update_medicine()      PUT    /medicines/{id}
//! delete_medicine()      DELETE /medicines/{id}
//! update_stock()         PATCH  /medicines/updateStock/{id}   body: quantity
//! sales()                GET    /sales
//! record_sales()         POST   /sales                        body: [sale, ...]
//! credits()              GET    /credits
//! create_credit()        POST   /credits
//! update_credit()        PUT    /credits/{id}
//! payments()             GET    /credits/{id}/paiements
//! pay_credit()           POST   /credits/{id}/payer           body: {montant}
//! users()                GET    /utilisateurs
//! create_user()          POST   /utilisateurs                 409 → Conflict
//! delete_user()          DELETE /utilisateurs/{id}
//! update_user()          PUT    /utilisateurs/{id}
//! push_delivery()        POST   /livraison
//! ```

use async_trait::async_trait;
use pharma_core::{Credit, DeliveryDocument, Medicine, MedicineId, Money, Payment, Sale, User};

use crate::error::ClientResult;
use crate::wire::NewMedicinePayload;

#[async_trait]
pub trait PharmacyBackend: Send + Sync {
    // =========================================================================
    // Medicines
    // =========================================================================
    async fn medicines(&self) -> ClientResult<Vec<Medicine>>;

    async fn create_medicine(&self, payload: &NewMedicinePayload) -> ClientResult<()>;

    async fn update_medicine(&self, medicine: &Medicine) -> ClientResult<()>;

    async fn delete_medicine(&self, id: MedicineId) -> ClientResult<()>;

    /// Decrements the stock of `id` by `quantity` sold units.
    async fn update_stock(&self, id: MedicineId, quantity: i64) -> ClientResult<()>;

    // =========================================================================
    // Sales
    // =========================================================================
    async fn sales(&self) -> ClientResult<Vec<Sale>>;

    /// Posts all records of one checkout in a single request.
    async fn record_sales(&self, sales: &[Sale]) -> ClientResult<()>;

    // =========================================================================
    // Credits
    // =========================================================================
    async fn credits(&self) -> ClientResult<Vec<Credit>>;

    /// Opens a credit. The `id` of `credit` is ignored.
    async fn create_credit(&self, credit: &Credit) -> ClientResult<()>;

    async fn update_credit(&self, credit: &Credit) -> ClientResult<()>;

    async fn payments(&self, credit_id: i64) -> ClientResult<Vec<Payment>>;

    async fn pay_credit(&self, credit_id: i64, amount: Money) -> ClientResult<()>;

    // =========================================================================
    // Users
    // =========================================================================
    async fn users(&self) -> ClientResult<Vec<User>>;

    /// Creates a non-admin user and returns it as stored.
    async fn create_user(&self, username: &str, password: &str) -> ClientResult<User>;

    async fn delete_user(&self, id: i64) -> ClientResult<()>;

    async fn update_user(&self, user: &User) -> ClientResult<()>;

    // =========================================================================
    // Deliveries
    // =========================================================================
    async fn push_delivery(&self, document: &DeliveryDocument) -> ClientResult<()>;
}
