#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Method, Request, StatusCode},
    response::Response,
    Router,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use vetclinic_api::{app_router, config::AppConfig, db, middleware_helpers::CLINIC_ID_HEADER, AppState};

/// Helper harness for spinning up the application backed by an in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    /// Clinic registered during setup; sent as `X-Clinic-Id` by default
    pub clinic_id: Uuid,
}

impl TestApp {
    /// Construct a new test application with a fresh schema and one clinic without tax.
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        // every connection to sqlite::memory: is its own database
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.default_tax_rate = Decimal::ZERO;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = AppState::new(Arc::new(pool), cfg);
        let router = app_router(state.clone());

        let mut app = Self {
            router,
            state,
            clinic_id: Uuid::nil(),
        };
        app.clinic_id = app.register_clinic("Test Vet").await;
        app
    }

    /// Registers another clinic through the API and returns its id.
    pub async fn register_clinic(&self, name: &str) -> Uuid {
        let response = self
            .request_unscoped(
                Method::POST,
                "/api/v1/clinics",
                Some(json!({ "name": name, "default_tax_rate": "0", "invoice_prefix": "INV" })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED, "clinic registration failed");
        let body = response_json(response).await;
        id_of(&body["data"])
    }

    /// Request scoped to the default test clinic.
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        let clinic = self.clinic_id.to_string();
        self.request_with_headers(method, uri, body, &[(CLINIC_ID_HEADER, clinic.as_str())])
            .await
    }

    /// Request scoped to an explicit clinic.
    pub async fn request_as(
        &self,
        clinic_id: Uuid,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> Response {
        let clinic = clinic_id.to_string();
        self.request_with_headers(method, uri, body, &[(CLINIC_ID_HEADER, clinic.as_str())])
            .await
    }

    /// Request without a clinic header; the scope falls back to the oldest clinic.
    pub async fn request_unscoped(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        self.request_with_headers(method, uri, body, &[]).await
    }

    pub async fn request_with_headers(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// POSTs `body` and returns the `data` object, asserting 201.
    pub async fn create(&self, uri: &str, body: Value) -> Value {
        let response = self.request(Method::POST, uri, Some(body)).await;
        let status = response.status();
        let json = response_json(response).await;
        assert_eq!(status, StatusCode::CREATED, "POST {} failed: {}", uri, json);
        json["data"].clone()
    }

    /// GETs `uri` and returns the `data` payload, asserting 200.
    pub async fn get(&self, uri: &str) -> Value {
        let response = self.request(Method::GET, uri, None).await;
        let status = response.status();
        let json = response_json(response).await;
        assert_eq!(status, StatusCode::OK, "GET {} failed: {}", uri, json);
        json["data"].clone()
    }

    pub async fn seed_client(&self, first_name: &str) -> Uuid {
        let client = self
            .create(
                "/api/v1/clients",
                json!({ "first_name": first_name, "last_name": "Tester", "phone": "+34 600 123 456" }),
            )
            .await;
        id_of(&client)
    }

    pub async fn seed_pet(&self, client_id: Uuid, name: &str) -> Uuid {
        let pet = self
            .create(
                "/api/v1/pets",
                json!({ "client_id": client_id, "name": name, "species": "DOG" }),
            )
            .await;
        id_of(&pet)
    }

    pub async fn seed_service(&self, name: &str, price: &str) -> Uuid {
        let service = self
            .create("/api/v1/services", json!({ "name": name, "price": price }))
            .await;
        id_of(&service)
    }

    pub async fn seed_product(&self, name: &str, price: &str, stock: i32, min_stock: i32) -> Uuid {
        let product = self
            .create(
                "/api/v1/products",
                json!({
                    "name": name,
                    "unit_price": price,
                    "initial_stock": stock,
                    "min_stock": min_stock
                }),
            )
            .await;
        id_of(&product)
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

pub async fn response_text(response: Response) -> String {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

pub fn id_of(value: &Value) -> Uuid {
    value["id"]
        .as_str()
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(|| panic!("missing id in {}", value))
}

/// Reads a money field regardless of scale ("50", "50.00" or 50).
pub fn money(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).expect("decimal string"),
        Value::Number(n) => Decimal::from_str(&n.to_string()).expect("decimal number"),
        other => panic!("not a money value: {}", other),
    }
}
