mod common;

use axum::http::{Method, StatusCode};
use common::{id_of, response_json, TestApp};
use serde_json::json;
use vetclinic_api::middleware_helpers::CLINIC_ID_HEADER;

#[tokio::test]
async fn records_are_invisible_to_other_clinics() {
    let app = TestApp::new().await;
    let client = app.seed_client("Nora").await;
    let other = app.register_clinic("Across Town Vet").await;

    let response = app
        .request_as(other, Method::GET, &format!("/api/v1/clients/{}", client), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .request_as(
            other,
            Method::POST,
            "/api/v1/pets",
            Some(json!({ "client_id": client, "name": "Intruder", "species": "CAT" })),
        )
        .await;
    assert!(
        response.status() == StatusCode::NOT_FOUND || response.status() == StatusCode::BAD_REQUEST,
        "unexpected status {}",
        response.status()
    );

    let response = app
        .request_as(other, Method::GET, "/api/v1/clients", None)
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["total"], 0);
}

#[tokio::test]
async fn malformed_clinic_header_is_rejected() {
    let app = TestApp::new().await;
    let response = app
        .request_with_headers(Method::GET, "/api/v1/clients", None, &[(CLINIC_ID_HEADER, "clinic-1")])
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_clinic_is_not_found() {
    let app = TestApp::new().await;
    let response = app
        .request_as(uuid::Uuid::new_v4(), Method::GET, "/api/v1/clinic", None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missing_header_falls_back_to_oldest_clinic() {
    let app = TestApp::new().await;
    app.register_clinic("Second Clinic").await;

    let response = app.request_unscoped(Method::GET, "/api/v1/clinic", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(id_of(&body["data"]), app.clinic_id);
    assert_eq!(body["data"]["name"], "Test Vet");
}

#[tokio::test]
async fn profile_and_schedule_round_trip() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::PUT,
            "/api/v1/clinic",
            Some(json!({ "phone": "+34 911 000 000", "default_tax_rate": "21" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["phone"], "+34 911 000 000");

    let response = app
        .request(
            Method::PUT,
            "/api/v1/clinic/schedule",
            Some(json!({ "days": [
                { "day": "MONDAY", "closed": false, "open": "09:00", "close": "18:00" },
                { "day": "SUNDAY", "closed": true }
            ]})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let schedule = app.get("/api/v1/clinic/schedule").await;
    let days = schedule["days"].as_array().unwrap();
    let monday = days.iter().find(|d| d["day"] == "MONDAY").unwrap();
    assert_eq!(monday["open"], "09:00");

    let response = app
        .request(
            Method::PUT,
            "/api/v1/clinic/schedule",
            Some(json!({ "days": [
                { "day": "MONDAY", "closed": false, "open": "18:00", "close": "09:00" }
            ]})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_and_status_need_no_clinic() {
    let app = TestApp::new().await;
    let response = app.request_unscoped(Method::GET, "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["checks"]["database"], "healthy");

    let response = app.request_unscoped(Method::GET, "/api/v1/status", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}
