//! End-to-end tests of `PharmacyClient` against a stub backend served by
//! axum on an ephemeral port.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use pharma_api::{ClientError, ClientSettings, PharmacyBackend, PharmacyClient};
use pharma_core::{DeliveryDocument, Medicine, Money, Sale, SaleType};

// =============================================================================
// Stub Backend
// =============================================================================

/// What the stub saw: (method + path, body, had x-request-id).
#[derive(Clone, Default)]
struct Recorder {
    calls: Arc<Mutex<Vec<(String, String, bool)>>>,
}

impl Recorder {
    fn push(&self, route: String, body: &[u8], headers: &HeaderMap) {
        self.calls.lock().unwrap().push((
            route,
            String::from_utf8_lossy(body).into_owned(),
            headers.contains_key("x-request-id"),
        ));
    }

    fn find(&self, route: &str) -> Option<(String, bool)> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .find(|(r, _, _)| r == route)
            .map(|(_, body, id)| (body.clone(), *id))
    }
}

async fn list_medicines() -> Json<Value> {
    Json(json!([
        {
            "id": 1, "code": "6118000041", "nom_medicament": "DOLIPRANE 1G",
            "forme": "Comprimé", "ppv": 19.8, "presentation": "B/8",
            "datE_PER": "032027", "quantite": 12, "ph": 15.0, "categorie": "Comprimé"
        },
        {
            "id": 2, "code": "6118000042", "nom_medicament": "SPASFON",
            "forme": null, "ppv": "20", "presentation": null,
            "datE_PER": null, "quantite": 0, "ph": null, "categorie": null
        }
    ]))
}

async fn record_sales(State(rec): State<Recorder>, headers: HeaderMap, body: Bytes) -> StatusCode {
    rec.push("POST /sales".into(), &body, &headers);
    StatusCode::CREATED
}

async fn update_stock(
    State(rec): State<Recorder>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    rec.push(format!("PATCH /medicines/updateStock/{}", id), &body, &headers);
    StatusCode::NO_CONTENT
}

async fn pay(
    State(rec): State<Recorder>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    rec.push(format!("POST /credits/{}/payer", id), &body, &headers);
    StatusCode::OK
}

async fn payments(Path(id): Path<i64>) -> Result<Json<Value>, StatusCode> {
    if id != 3 {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(json!([
        { "id": 1, "creditId": 3, "montant": 20.5, "datePaiement": "2025-10-10T09:00:00" }
    ])))
}

async fn create_user(Json(body): Json<Value>) -> Result<(StatusCode, Json<Value>), (StatusCode, String)> {
    if body["nomUtilisateur"] == "amina" {
        return Err((StatusCode::CONFLICT, "Nom d'utilisateur déjà utilisé".into()));
    }
    let mut created = body.clone();
    created["id"] = json!(9);
    Ok((StatusCode::CREATED, Json(created)))
}

async fn push_delivery(State(rec): State<Recorder>, headers: HeaderMap, body: Bytes) -> StatusCode {
    rec.push("POST /livraison".into(), &body, &headers);
    StatusCode::OK
}

async fn broken_sales() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "database offline")
}

async fn spawn_backend(rec: Recorder, sales_broken: bool) -> String {
    let sales = if sales_broken {
        get(broken_sales).post(broken_sales)
    } else {
        post(record_sales)
    };

    let app = Router::new()
        .route("/api/medicines", get(list_medicines))
        .route("/api/medicines/updateStock/{id}", patch(update_stock))
        .route("/api/sales", sales)
        .route("/api/credits/{id}/payer", post(pay))
        .route("/api/credits/{id}/paiements", get(payments))
        .route("/api/utilisateurs", post(create_user))
        .route("/api/livraison", post(push_delivery))
        .with_state(rec);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}/api", addr)
}

fn client(base_url: &str) -> PharmacyClient {
    PharmacyClient::new(&ClientSettings::new(base_url).timeout(Duration::from_secs(5))).unwrap()
}

fn sale(medicine: &Medicine, quantity: i64) -> Sale {
    Sale {
        id: None,
        date: NaiveDate::from_ymd_opt(2025, 10, 12)
            .unwrap()
            .and_hms_opt(18, 30, 0)
            .unwrap(),
        medicine_id: Some(medicine.id),
        medicine_name: medicine.name.clone(),
        total_articles: quantity,
        total_price: medicine.ppv * quantity,
        sale_type: SaleType::Cash,
        sale_number: 0,
        client_name: String::new(),
        operator: "amina".into(),
        expiry: None,
    }
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn test_fetch_medicines_decodes_backend_rows() {
    let base = spawn_backend(Recorder::default(), false).await;
    let medicines = client(&base).medicines().await.unwrap();

    assert_eq!(medicines.len(), 2);
    assert_eq!(medicines[0].ppv, Money::from_cents(1980));
    assert_eq!(medicines[0].expiry.map(|e| e.to_string()).as_deref(), Some("032027"));
    assert_eq!(medicines[1].ppv, Money::from_cents(2000));
    assert_eq!(medicines[1].expiry, None);
}

#[tokio::test]
async fn test_checkout_calls_carry_expected_bodies() {
    let rec = Recorder::default();
    let base = spawn_backend(rec.clone(), false).await;
    let api = client(&base);

    let medicines = api.medicines().await.unwrap();
    api.record_sales(&[sale(&medicines[0], 2)]).await.unwrap();
    api.update_stock(medicines[0].id, 2).await.unwrap();

    let (body, has_id) = rec.find("POST /sales").unwrap();
    assert!(has_id);
    let sent: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(sent[0]["typeDeVente"], "Especes");
    assert_eq!(sent[0]["totalArticles"], 2);
    assert_eq!(sent[0]["totalPrice"], 39.6);

    let (body, _) = rec.find("PATCH /medicines/updateStock/1").unwrap();
    assert_eq!(body, "2");
}

#[tokio::test]
async fn test_pay_credit_sends_montant() {
    let rec = Recorder::default();
    let base = spawn_backend(rec.clone(), false).await;

    client(&base)
        .pay_credit(3, Money::from_cents(2050))
        .await
        .unwrap();

    let (body, _) = rec.find("POST /credits/3/payer").unwrap();
    let sent: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(sent["montant"], 20.5);
}

#[tokio::test]
async fn test_payments_and_not_found() {
    let base = spawn_backend(Recorder::default(), false).await;
    let api = client(&base);

    let payments = api.payments(3).await.unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].amount, Money::from_cents(2050));

    let err = api.payments(4).await.unwrap_err();
    assert!(matches!(err, ClientError::NotFound(ref path) if path == "credits/4/paiements"));
}

#[tokio::test]
async fn test_duplicate_user_is_conflict() {
    let base = spawn_backend(Recorder::default(), false).await;
    let api = client(&base);

    let created = api.create_user("youssef", "secret").await.unwrap();
    assert_eq!(created.id, 9);
    assert!(!created.is_admin);

    let err = api.create_user("amina", "secret").await.unwrap_err();
    assert!(matches!(err, ClientError::Conflict(_)));
}

#[tokio::test]
async fn test_server_error_is_status() {
    let base = spawn_backend(Recorder::default(), true).await;

    let err = client(&base).sales().await.unwrap_err();
    match err {
        ClientError::Status { status, body, .. } => {
            assert_eq!(status, 500);
            assert_eq!(body, "database offline");
        }
        other => panic!("expected Status, got {:?}", other),
    }
}

#[tokio::test]
async fn test_push_delivery_payload() {
    let rec = Recorder::default();
    let base = spawn_backend(rec.clone(), false).await;
    let api = client(&base);

    let medicines = api.medicines().await.unwrap();
    let mut doc = DeliveryDocument::new(
        "BL-2025-104",
        "SOPHADIMS",
        NaiveDate::from_ymd_opt(2025, 10, 12).unwrap(),
    );
    doc.add_line(&medicines[0], 10).unwrap();

    api.push_delivery(&doc).await.unwrap();

    let (body, _) = rec.find("POST /livraison").unwrap();
    let sent: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(sent["N_DOCUMENT"], "BL-2025-104");
    assert_eq!(sent["DATE_RECEIVED"], "2025-10-12");
    assert_eq!(sent["Items"][0]["QTE_LIVR"], 10);
    assert_eq!(sent["Items"][0]["TOTAL_PPV"], 198.0);
    assert_eq!(sent["Items"][0]["TOTAL_PPH"], 150.0);
}

#[tokio::test]
async fn test_unreachable_backend() {
    // Grab a free port, then close it again
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(&format!("http://{}/api", addr))
        .medicines()
        .await
        .unwrap_err();
    assert!(err.is_unreachable());
}
