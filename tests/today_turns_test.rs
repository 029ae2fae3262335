mod common;

use axum::http::{Method, StatusCode};
use common::{id_of, response_json, TestApp};
use serde_json::json;

#[tokio::test]
async fn walk_in_moves_across_the_board() {
    let app = TestApp::new().await;
    let client = app.seed_client("Sara").await;
    let pet = app.seed_pet(client, "Pipo").await;

    let first = app
        .create(
            "/api/v1/today-turns",
            json!({ "pet_id": pet, "service_description": "Bath" }),
        )
        .await;
    assert_eq!(first["ticket_number"], 1);
    assert_eq!(first["status"], "WAITING");
    assert_eq!(first["pet_name"], "Pipo");
    assert_eq!(first["owner_name"], "Sara Tester");

    let second = app
        .create(
            "/api/v1/today-turns",
            json!({ "owner_name": "Walk-in", "pet_name": "Max" }),
        )
        .await;
    assert_eq!(second["ticket_number"], 2);

    let id = id_of(&first);
    for expected in ["IN_PROGRESS", "READY", "DELIVERED"] {
        let response = app
            .request(Method::POST, &format!("/api/v1/today-turns/{}/advance", id), None)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = response_json(response).await;
        assert_eq!(body["data"]["status"], expected);
    }

    let response = app
        .request(Method::POST, &format!("/api/v1/today-turns/{}/advance", id), None)
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let board = app.get("/api/v1/today-turns").await;
    assert_eq!(board["delivered"].as_array().unwrap().len(), 1);
    assert_eq!(board["waiting"].as_array().unwrap().len(), 1);
    assert_eq!(board["waiting"][0]["pet_name"], "Max");
}

#[tokio::test]
async fn skipping_a_column_is_rejected() {
    let app = TestApp::new().await;
    let turn = app
        .create(
            "/api/v1/today-turns",
            json!({ "owner_name": "Tomas", "pet_name": "Lua" }),
        )
        .await;
    let id = id_of(&turn);

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/today-turns/{}/status", id),
            Some(json!({ "status": "READY" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .request(Method::POST, &format!("/api/v1/today-turns/{}/cancel", id), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["status"], "CANCELLED");
    assert!(!body["data"]["cancelled_at"].is_null());

    let response = app
        .request(Method::POST, &format!("/api/v1/today-turns/{}/notify", id), None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn turn_needs_owner_and_pet() {
    let app = TestApp::new().await;
    let response = app
        .request(Method::POST, "/api/v1/today-turns", Some(json!({ "notes": "?" })))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert!(body["field_errors"]["owner_name"].is_array());
    assert!(body["field_errors"]["pet_name"].is_array());
}

#[tokio::test]
async fn notifying_owner_returns_contact_links() {
    let app = TestApp::new().await;
    let turn = app
        .create(
            "/api/v1/today-turns",
            json!({ "owner_name": "Ursula", "owner_phone": "+34 600 11 22 33", "pet_name": "Kira" }),
        )
        .await;
    let id = id_of(&turn);

    let response = app
        .request(Method::POST, &format!("/api/v1/today-turns/{}/notify", id), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["phone_link"], "tel:+34600112233");
    assert_eq!(body["data"]["whatsapp_link"], "https://wa.me/34600112233");
    assert_eq!(body["data"]["turn"]["owner_notified"], true);
}

#[tokio::test]
async fn dashboard_counts_the_day() {
    let app = TestApp::new().await;
    let client = app.seed_client("Vera").await;
    let consult = app.seed_service("Consultation", "30.00").await;
    app.create(
        "/api/v1/today-turns",
        json!({ "owner_name": "Vera", "pet_name": "Tom" }),
    )
    .await;
    app.create(
        "/api/v1/invoices",
        json!({
            "client_id": client,
            "items": [{ "item_type": "SERVICE", "service_id": consult, "quantity": 1 }],
            "payment": { "amount": "10.00" }
        }),
    )
    .await;

    let summary = app.get("/api/v1/dashboard").await;
    assert_eq!(summary["open_invoices"], 1);
    assert_eq!(common::money(&summary["revenue_today"]), rust_decimal_macros::dec!(10));
    assert_eq!(common::money(&summary["outstanding_balance"]), rust_decimal_macros::dec!(20));
    assert_eq!(summary["turns"]["waiting"], 1);
}
