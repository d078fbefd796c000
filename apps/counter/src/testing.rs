//! In-memory backend and fixtures for command tests.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use pharma_api::{ClientError, ClientResult, NewMedicinePayload, PharmacyBackend};
use pharma_core::{
    Category, Credit, DeliveryDocument, ExpiryBatch, Medicine, MedicineId, Money, Payment,
    RawFields, Sale, Session, User,
};
use pharma_store::{LocalStore, StoreConfig};

use crate::config::AppConfig;
use crate::state::AppContext;

// =============================================================================
// Fake Backend
// =============================================================================

/// Backend rows plus a log of what the commands sent.
#[derive(Debug, Default)]
pub struct FakeData {
    pub medicines: Vec<Medicine>,
    pub sales: Vec<Sale>,
    pub credits: Vec<Credit>,
    pub payments: Vec<Payment>,
    pub users: Vec<User>,

    pub created_medicines: Vec<NewMedicinePayload>,
    pub stock_updates: Vec<(MedicineId, i64)>,
    pub sale_batches: usize,
    pub pushed_deliveries: Vec<DeliveryDocument>,
    pub next_id: i64,

    /// Every call fails as if the backend were down.
    pub offline: bool,
}

/// Cloneable handle; tests keep one copy to inspect what commands did.
#[derive(Debug, Clone, Default)]
pub struct FakeBackend {
    data: Arc<Mutex<FakeData>>,
}

impl FakeBackend {
    pub fn with_medicines(medicines: Vec<Medicine>) -> Self {
        let fake = FakeBackend::default();
        fake.data().medicines = medicines;
        fake
    }

    pub fn data(&self) -> MutexGuard<'_, FakeData> {
        self.data.lock().unwrap()
    }

    fn online(&self) -> ClientResult<MutexGuard<'_, FakeData>> {
        let data = self.data();
        if data.offline {
            return Err(ClientError::Network("connection refused".into()));
        }
        Ok(data)
    }
}

impl FakeData {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        100 + self.next_id
    }
}

#[async_trait]
impl PharmacyBackend for FakeBackend {
    async fn medicines(&self) -> ClientResult<Vec<Medicine>> {
        Ok(self.online()?.medicines.clone())
    }

    async fn create_medicine(&self, payload: &NewMedicinePayload) -> ClientResult<()> {
        let mut data = self.online()?;
        let id = data.next_id();
        data.medicines.push(Medicine {
            id,
            code: payload.code.clone(),
            name: payload.name.clone(),
            form: payload.form.clone(),
            presentation: payload.presentation.clone(),
            ppv: Money::from_decimal(payload.ppv),
            ph: Money::from_decimal(payload.ph),
            quantity: payload.quantity,
            expiry: ExpiryBatch::parse(&payload.expiry).ok(),
            category: payload.category.as_deref().map(Category::from_label),
            raw: RawFields {
                expiry: None,
                category: payload
                    .category
                    .clone()
                    .filter(|c| Category::from_known_label(c).is_none()),
            },
        });
        data.created_medicines.push(payload.clone());
        Ok(())
    }

    async fn update_medicine(&self, medicine: &Medicine) -> ClientResult<()> {
        let mut data = self.online()?;
        // (id, expiry) is the stock line key; a line without expiry may be
        // receiving one.
        let line = data
            .medicines
            .iter_mut()
            .find(|m| {
                m.id == medicine.id
                    && ((m.expiry == medicine.expiry && m.expiry_text() == medicine.expiry_text())
                        || m.has_no_expiry())
            })
            .ok_or_else(|| ClientError::NotFound(format!("medicines/{}", medicine.id)))?;
        *line = medicine.clone();
        Ok(())
    }

    async fn delete_medicine(&self, id: MedicineId) -> ClientResult<()> {
        let mut data = self.online()?;
        let before = data.medicines.len();
        data.medicines.retain(|m| m.id != id);
        if data.medicines.len() == before {
            return Err(ClientError::NotFound(format!("medicines/{}", id)));
        }
        Ok(())
    }

    async fn update_stock(&self, id: MedicineId, quantity: i64) -> ClientResult<()> {
        let mut data = self.online()?;
        data.stock_updates.push((id, quantity));
        if let Some(line) = data.medicines.iter_mut().find(|m| m.id == id) {
            line.quantity -= quantity;
        }
        Ok(())
    }

    async fn sales(&self) -> ClientResult<Vec<Sale>> {
        Ok(self.online()?.sales.clone())
    }

    async fn record_sales(&self, sales: &[Sale]) -> ClientResult<()> {
        let mut data = self.online()?;
        data.sale_batches += 1;
        data.sales.extend_from_slice(sales);
        Ok(())
    }

    async fn credits(&self) -> ClientResult<Vec<Credit>> {
        Ok(self.online()?.credits.clone())
    }

    async fn create_credit(&self, credit: &Credit) -> ClientResult<()> {
        let mut data = self.online()?;
        let id = data.next_id();
        data.credits.push(Credit {
            id,
            ..credit.clone()
        });
        Ok(())
    }

    async fn update_credit(&self, credit: &Credit) -> ClientResult<()> {
        let mut data = self.online()?;
        let row = data
            .credits
            .iter_mut()
            .find(|c| c.id == credit.id)
            .ok_or_else(|| ClientError::NotFound(format!("credits/{}", credit.id)))?;
        *row = credit.clone();
        Ok(())
    }

    async fn payments(&self, credit_id: i64) -> ClientResult<Vec<Payment>> {
        let data = self.online()?;
        if !data.credits.iter().any(|c| c.id == credit_id) {
            return Err(ClientError::NotFound(format!("credits/{}/paiements", credit_id)));
        }
        Ok(data
            .payments
            .iter()
            .filter(|p| p.credit_id == credit_id)
            .cloned()
            .collect())
    }

    async fn pay_credit(&self, credit_id: i64, amount: Money) -> ClientResult<()> {
        let mut data = self.online()?;
        let id = data.next_id();
        let credit = data
            .credits
            .iter_mut()
            .find(|c| c.id == credit_id)
            .ok_or_else(|| ClientError::NotFound(format!("credits/{}/payer", credit_id)))?;
        credit.remaining -= amount;
        credit.paid = credit.remaining.is_zero();
        data.payments.push(Payment {
            id,
            credit_id,
            amount,
            paid_at: at(2025, 10, 12, 10, 0),
        });
        Ok(())
    }

    async fn users(&self) -> ClientResult<Vec<User>> {
        Ok(self.online()?.users.clone())
    }

    async fn create_user(&self, username: &str, password: &str) -> ClientResult<User> {
        let mut data = self.online()?;
        if data.users.iter().any(|u| u.username == username) {
            return Err(ClientError::Conflict(username.to_string()));
        }
        let user = User {
            id: data.next_id(),
            username: username.to_string(),
            password: password.to_string(),
            is_admin: false,
        };
        data.users.push(user.clone());
        Ok(user)
    }

    async fn delete_user(&self, id: i64) -> ClientResult<()> {
        let mut data = self.online()?;
        data.users.retain(|u| u.id != id);
        Ok(())
    }

    async fn update_user(&self, user: &User) -> ClientResult<()> {
        let mut data = self.online()?;
        let row = data
            .users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or_else(|| ClientError::NotFound(format!("utilisateurs/{}", user.id)))?;
        *row = user.clone();
        Ok(())
    }

    async fn push_delivery(&self, document: &DeliveryDocument) -> ClientResult<()> {
        self.online()?.pushed_deliveries.push(document.clone());
        Ok(())
    }
}

// =============================================================================
// Fixtures
// =============================================================================

pub async fn memory_store() -> LocalStore {
    LocalStore::new(StoreConfig::in_memory()).await.unwrap()
}

/// Context over `backend` with default config and a fresh store.
pub async fn context(backend: FakeBackend) -> AppContext {
    AppContext::new(AppConfig::default(), Arc::new(backend), memory_store().await)
        .await
        .unwrap()
}

/// Context with `username` already logged in.
pub async fn logged_in(backend: FakeBackend, username: &str, is_admin: bool) -> AppContext {
    let ctx = context(backend).await;
    ctx.session
        .open(&Session {
            username: username.to_string(),
            is_admin,
        })
        .await
        .unwrap();
    ctx
}

pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

pub fn batch(raw: &str) -> ExpiryBatch {
    ExpiryBatch::parse(raw).unwrap()
}

pub fn medicine(id: MedicineId, code: &str, name: &str, ppv_cents: i64) -> Medicine {
    Medicine {
        id,
        code: code.to_string(),
        name: name.to_string(),
        form: "Comprimé".to_string(),
        presentation: "B/20".to_string(),
        ppv: Money::from_cents(ppv_cents),
        ph: Money::from_cents(ppv_cents * 3 / 4),
        quantity: 10,
        expiry: None,
        category: None,
        raw: RawFields::default(),
    }
}

pub fn doliprane() -> Medicine {
    Medicine {
        expiry: Some(batch("032027")),
        ..medicine(1, "6118000041", "DOLIPRANE 1G", 1980)
    }
}

pub fn spasfon() -> Medicine {
    medicine(2, "6118000042", "SPASFON", 2000)
}

pub fn user(id: i64, username: &str, is_admin: bool) -> User {
    User {
        id,
        username: username.to_string(),
        password: "secret".to_string(),
        is_admin,
    }
}

pub fn credit(id: i64, client: &str, total_cents: i64, remaining_cents: i64) -> Credit {
    Credit {
        id,
        client_name: client.to_string(),
        total: Money::from_cents(total_cents),
        remaining: Money::from_cents(remaining_cents),
        created_at: at(2025, 9, 1, 9, 0),
        paid: remaining_cents == 0,
    }
}
