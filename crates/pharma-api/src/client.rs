//! # HTTP Client
//!
//! [`PharmacyClient`] implements [`PharmacyBackend`] over reqwest.
//!
//! ## Request Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  endpoint("credits/7/payer")  ← joined onto base URL (…/api/)          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  RequestBuilder + x-request-id (uuid v4)                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  send() ──► transport error ──► ClientError::Network / Timeout         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  status check                                                          │
//! │    2xx  → body decoded (ClientError::Decode on mismatch)               │
//! │    404  → ClientError::NotFound                                        │
//! │    409  → ClientError::Conflict                                        │
//! │    else → ClientError::Status                                          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No retries and no offline queue: a failed call is reported once.

use async_trait::async_trait;
use pharma_core::{Credit, DeliveryDocument, Medicine, MedicineId, Money, Payment, Sale, User};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use crate::backend::PharmacyBackend;
use crate::error::{ClientError, ClientResult};
use crate::wire::{
    CreditDto, DeliveryPayload, MedicineDto, NewMedicinePayload, PayRequest, PaymentDto, SaleDto,
    UserDto,
};

/// Default backend location.
pub const DEFAULT_BASE_URL: &str = "http://localhost:7194/api";

/// Header carrying the per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

// =============================================================================
// Settings
// =============================================================================

/// Connection settings for [`PharmacyClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    /// Base URL, e.g. `http://localhost:7194/api`.
    pub base_url: String,

    /// Whole-request timeout.
    /// Default: 15 seconds
    pub timeout: Duration,

    /// TCP connect timeout.
    /// Default: 10 seconds
    pub connect_timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        ClientSettings {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(15),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl ClientSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        ClientSettings {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

/// Parses a base URL and makes sure relative paths append to it.
///
/// `http://host/api` and `http://host/api/` both become `http://host/api/`.
pub fn normalize_base_url(raw: &str) -> ClientResult<Url> {
    let mut url = Url::parse(raw.trim())?;

    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(ClientError::InvalidUrl(format!(
            "'{}' is not an http(s) URL",
            raw
        )));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

// =============================================================================
// Client
// =============================================================================

/// REST client for the pharmacy backend.
///
/// Cheap to clone: reqwest pools connections internally.
#[derive(Debug, Clone)]
pub struct PharmacyClient {
    http: reqwest::Client,
    base: Url,
}

impl PharmacyClient {
    /// Builds the client. Fails only on a malformed base URL or TLS setup.
    pub fn new(settings: &ClientSettings) -> ClientResult<Self> {
        let base = normalize_base_url(&settings.base_url)?;

        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;

        info!(base_url = %base, timeout_secs = settings.timeout.as_secs(), "Backend client ready");
        Ok(PharmacyClient { http, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> ClientResult<Url> {
        Ok(self.base.join(path)?)
    }

    fn request(&self, method: Method, path: &str) -> ClientResult<RequestBuilder> {
        let url = self.endpoint(path)?;
        Ok(self
            .http
            .request(method, url)
            .header(REQUEST_ID_HEADER, Uuid::new_v4().to_string()))
    }

    /// Sends and maps non-2xx statuses to errors.
    async fn send(&self, path: &str, request: RequestBuilder) -> ClientResult<Response> {
        let started = Instant::now();
        let response = request.send().await.map_err(|e| {
            warn!(endpoint = %path, error = %e, "Backend call failed");
            ClientError::from(e)
        })?;

        let status = response.status();
        debug!(
            endpoint = %path,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Backend answered"
        );

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!(endpoint = %path, status = status.as_u16(), body = %body, "Backend refused the call");

        Err(match status {
            StatusCode::NOT_FOUND => ClientError::NotFound(path.to_string()),
            StatusCode::CONFLICT => ClientError::Conflict(if body.trim().is_empty() {
                path.to_string()
            } else {
                body
            }),
            _ => ClientError::Status {
                endpoint: path.to_string(),
                status: status.as_u16(),
                body,
            },
        })
    }

    async fn decode<T: DeserializeOwned>(path: &str, response: Response) -> ClientResult<T> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| ClientError::Decode {
            endpoint: path.to_string(),
            reason: e.to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let response = self.send(path, self.request(Method::GET, path)?).await?;
        Self::decode(path, response).await
    }

    async fn send_json<B: serde::Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> ClientResult<Response> {
        let request = self.request(method, path)?.json(body);
        self.send(path, request).await
    }
}

#[async_trait]
impl PharmacyBackend for PharmacyClient {
    // =========================================================================
    // Medicines
    // =========================================================================
    async fn medicines(&self) -> ClientResult<Vec<Medicine>> {
        let rows: Vec<MedicineDto> = self.get_json("medicines").await?;
        debug!(count = rows.len(), "Fetched medicines");
        Ok(rows.into_iter().map(Medicine::from).collect())
    }

    async fn create_medicine(&self, payload: &NewMedicinePayload) -> ClientResult<()> {
        self.send_json(Method::POST, "medicines", payload).await?;
        info!(code = %payload.code, expiry = %payload.expiry, "Medicine created");
        Ok(())
    }

    async fn update_medicine(&self, medicine: &Medicine) -> ClientResult<()> {
        let path = format!("medicines/{}", medicine.id);
        self.send_json(Method::PUT, &path, &MedicineDto::from(medicine)).await?;
        info!(id = medicine.id, quantity = medicine.quantity, "Medicine updated");
        Ok(())
    }

    async fn delete_medicine(&self, id: MedicineId) -> ClientResult<()> {
        let path = format!("medicines/{}", id);
        self.send(&path, self.request(Method::DELETE, &path)?).await?;
        info!(id, "Medicine deleted");
        Ok(())
    }

    async fn update_stock(&self, id: MedicineId, quantity: i64) -> ClientResult<()> {
        let path = format!("medicines/updateStock/{}", id);
        self.send_json(Method::PATCH, &path, &quantity).await?;
        debug!(id, quantity, "Stock decremented");
        Ok(())
    }

    // =========================================================================
    // Sales
    // =========================================================================
    async fn sales(&self) -> ClientResult<Vec<Sale>> {
        let rows: Vec<SaleDto> = self.get_json("sales").await?;
        debug!(count = rows.len(), "Fetched sales");
        Ok(rows.into_iter().map(Sale::from).collect())
    }

    async fn record_sales(&self, sales: &[Sale]) -> ClientResult<()> {
        let body: Vec<SaleDto> = sales.iter().map(SaleDto::from).collect();
        self.send_json(Method::POST, "sales", &body).await?;
        info!(records = body.len(), "Sales recorded");
        Ok(())
    }

    // =========================================================================
    // Credits
    // =========================================================================
    async fn credits(&self) -> ClientResult<Vec<Credit>> {
        let rows: Vec<CreditDto> = self.get_json("credits").await?;
        Ok(rows.into_iter().map(Credit::from).collect())
    }

    async fn create_credit(&self, credit: &Credit) -> ClientResult<()> {
        self.send_json(Method::POST, "credits", &CreditDto::new(credit)).await?;
        info!(client = %credit.client_name, total = %credit.total, "Credit opened");
        Ok(())
    }

    async fn update_credit(&self, credit: &Credit) -> ClientResult<()> {
        let path = format!("credits/{}", credit.id);
        self.send_json(Method::PUT, &path, &CreditDto::existing(credit)).await?;
        info!(id = credit.id, remaining = %credit.remaining, "Credit updated");
        Ok(())
    }

    async fn payments(&self, credit_id: i64) -> ClientResult<Vec<Payment>> {
        let rows: Vec<PaymentDto> = self
            .get_json(&format!("credits/{}/paiements", credit_id))
            .await?;
        Ok(rows.into_iter().map(Payment::from).collect())
    }

    async fn pay_credit(&self, credit_id: i64, amount: Money) -> ClientResult<()> {
        let path = format!("credits/{}/payer", credit_id);
        let body = PayRequest {
            montant: amount.to_decimal(),
        };
        self.send_json(Method::POST, &path, &body).await?;
        info!(credit_id, amount = %amount, "Payment recorded");
        Ok(())
    }

    // =========================================================================
    // Users
    // =========================================================================
    async fn users(&self) -> ClientResult<Vec<User>> {
        let rows: Vec<UserDto> = self.get_json("utilisateurs").await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn create_user(&self, username: &str, password: &str) -> ClientResult<User> {
        let body = UserDto {
            id: None,
            nom_utilisateur: username.trim().to_string(),
            mot_de_passe: password.to_string(),
            is_admin: false,
        };
        let response = self.send_json(Method::POST, "utilisateurs", &body).await?;
        let created: UserDto = Self::decode("utilisateurs", response).await?;
        info!(user = %created.nom_utilisateur, "User created");
        Ok(created.into())
    }

    async fn delete_user(&self, id: i64) -> ClientResult<()> {
        let path = format!("utilisateurs/{}", id);
        self.send(&path, self.request(Method::DELETE, &path)?).await?;
        info!(id, "User deleted");
        Ok(())
    }

    async fn update_user(&self, user: &User) -> ClientResult<()> {
        let path = format!("utilisateurs/{}", user.id);
        self.send_json(Method::PUT, &path, &UserDto::from(user)).await?;
        info!(id = user.id, admin = user.is_admin, "User updated");
        Ok(())
    }

    // =========================================================================
    // Deliveries
    // =========================================================================
    async fn push_delivery(&self, document: &DeliveryDocument) -> ClientResult<()> {
        let body = DeliveryPayload::from(document);
        self.send_json(Method::POST, "livraison", &body).await?;
        info!(number = %document.number, lines = body.items.len(), "Delivery pushed");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
