use axum::{
    body::Body,
    http::{HeaderMap, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use sqlx::{Pool, Postgres};
use tokio::sync::{Mutex, MutexGuard};
use tower::ServiceExt;

use server::db::AppState;
use server::sms::{LoggingSmsGateway, SmsSender};
use server::storage::{DocumentStore, LocalObjectStore};

/// Global mutex ensuring tests run sequentially against the shared database.
static TEST_MUTEX: std::sync::LazyLock<Mutex<()>> = std::sync::LazyLock::new(|| Mutex::new(()));

const ALL_TABLES: &str = "communications, validation_rules, trigger_events, trigger_rules, \
    generated_notices, notice_templates, case_documents, lawyer_allocations, lawyers, \
    case_status_history, case_hearings, legal_cases, case_id_sequences, sms_templates, \
    dpd_buckets, languages, products, states";

/// A router over a freshly truncated database. Hold it for the whole test.
pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Postgres>,
    pub state: AppState,
    storage: tempfile::TempDir,
    _guard: MutexGuard<'static, ()>,
}

/// Build the API against `TEST_DATABASE_URL`, falling back to `DATABASE_URL`.
pub async fn test_app() -> TestApp {
    let guard = TEST_MUTEX.lock().await;
    let _ = dotenvy::dotenv();

    let database_url = std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .expect("TEST_DATABASE_URL or DATABASE_URL must be set for tests");

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    server::db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    sqlx::query(&format!("TRUNCATE {ALL_TABLES} RESTART IDENTITY CASCADE"))
        .execute(&pool)
        .await
        .expect("Failed to truncate");

    let storage = tempfile::tempdir().expect("Failed to create storage dir");
    let state = AppState::new(
        pool.clone(),
        DocumentStore::Local(LocalObjectStore::new(storage.path())),
        SmsSender::Logging(LoggingSmsGateway),
    );
    let router = server::rest::api_router().with_state(state.clone());

    TestApp {
        router,
        pool,
        state,
        storage,
        _guard: guard,
    }
}

impl TestApp {
    /// Root directory of the filesystem document store.
    pub fn storage_path(&self) -> &std::path::Path {
        self.storage.path()
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let req = Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        send(&self.router, req).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.json("POST", uri, body).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.json("PUT", uri, body).await
    }

    pub async fn patch(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.json("PATCH", uri, body).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        let req = Request::builder()
            .method("DELETE")
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        send(&self.router, req).await
    }

    /// POST JSON as a named user (`X-User-Id`).
    pub async fn post_as(&self, user: &str, uri: &str, body: Value) -> (StatusCode, Value) {
        let req = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .header("x-user-id", user)
            .body(Body::from(body.to_string()))
            .unwrap();
        send(&self.router, req).await
    }

    /// GET returning raw bytes and headers (downloads).
    pub async fn get_raw(&self, uri: &str) -> (StatusCode, HeaderMap, Vec<u8>) {
        let req = Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        (status, headers, bytes.to_vec())
    }

    async fn json(&self, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        send(&self.router, req).await
    }
}

/// Send a request through the router and parse the response.
async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(req)
        .await
        .expect("Failed to send request");

    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");

    let body: Value = if body_bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap_or(Value::String(
            String::from_utf8_lossy(&body_bytes).to_string(),
        ))
    };

    (status, body)
}

// ── Fixtures ────────────────────────────────────────────────────────

/// Create state MH, product PL and language en.
pub async fn seed_master_data(app: &TestApp) {
    let (status, _) = app
        .post("/api/states", json!({ "code": "MH", "name": "Maharashtra" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app
        .post("/api/products", json!({ "code": "PL", "name": "Personal Loan" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app
        .post("/api/languages", json!({ "code": "en", "name": "English" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

/// A valid case body against the seeded master data.
pub fn case_body(loan_account_number: &str) -> Value {
    json!({
        "loan_account_number": loan_account_number,
        "borrower_name": "Ravi Kumar",
        "borrower_mobile": "9876543210",
        "borrower_email": "ravi@example.com",
        "borrower_address": "12 MG Road, Pune",
        "state_code": "MH",
        "product_code": "PL",
        "language_code": "en",
        "dpd": 120,
        "outstanding_amount": 250000.0,
        "case_type": "section_138",
    })
}

/// Create a case and return the response body.
pub async fn create_case(app: &TestApp, loan_account_number: &str) -> Value {
    let (status, body) = app.post("/api/cases", case_body(loan_account_number)).await;
    assert_eq!(status, StatusCode::CREATED, "create case failed: {body}");
    body
}

/// Create an active lawyer covering MH with the given capacity.
pub async fn create_lawyer(app: &TestApp, email: &str, bar: &str, max_active_cases: i32) -> Value {
    let (status, body) = app
        .post(
            "/api/lawyers",
            json!({
                "name": "Anita Sharma",
                "email": email,
                "phone": "9123456780",
                "bar_registration_number": bar,
                "state_codes": ["MH"],
                "language_codes": ["en"],
                "max_active_cases": max_active_cases,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "create lawyer failed: {body}");
    body
}

/// Extract a string id field from a response body.
pub fn id_of(body: &Value) -> String {
    body["id"].as_str().expect("response has no id").to_string()
}
