//! End-to-end invoicing: totals, payments, numbering, validation, void and the printable ticket.

mod common;

use axum::http::{Method, StatusCode};
use chrono::NaiveDate;
use common::{id_of, money, response_json, response_text, TestApp};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::json;
use uuid::Uuid;
use vetclinic_api::entities::invoice::{self, InvoiceStatus};

#[tokio::test]
async fn service_and_product_paid_in_full() {
    let app = TestApp::new().await;
    let client = app.seed_client("Ana").await;
    let pet = app.seed_pet(client, "Rocky").await;
    let consult = app.seed_service("Consultation", "25.00").await;
    let food = app.seed_product("Dog food", "25.00", 10, 2).await;

    let invoice = app
        .create(
            "/api/v1/invoices",
            json!({
                "client_id": client,
                "pet_id": pet,
                "items": [
                    { "item_type": "SERVICE", "service_id": consult, "quantity": 1 },
                    { "item_type": "PRODUCT", "product_id": food, "quantity": 1 }
                ],
                "payment": { "amount": "50.00", "method": "CARD" }
            }),
        )
        .await;

    assert_eq!(money(&invoice["invoice"]["subtotal"]), dec!(50));
    assert_eq!(money(&invoice["invoice"]["total"]), dec!(50));
    assert_eq!(money(&invoice["balance_due"]), dec!(0));
    assert_eq!(invoice["invoice"]["status"], "PAID");
    assert_eq!(invoice["items"].as_array().unwrap().len(), 2);
    assert_eq!(invoice["payments"].as_array().unwrap().len(), 1);
    assert_eq!(invoice["items"][0]["description"], "Consultation");

    let product = app.get(&format!("/api/v1/products/{}", food)).await;
    assert_eq!(product["stock_on_hand"], 9);
}

#[tokio::test]
async fn partial_payments_reconcile_status() {
    let app = TestApp::new().await;
    let client = app.seed_client("Bea").await;
    let consult = app.seed_service("Consultation", "40.00").await;

    let invoice = app
        .create(
            "/api/v1/invoices",
            json!({
                "client_id": client,
                "items": [{ "item_type": "SERVICE", "service_id": consult, "quantity": 2 }],
                "discount": "10.00",
                "tax_rate": "10"
            }),
        )
        .await;
    // (80 - 10) * 1.10
    assert_eq!(money(&invoice["invoice"]["total"]), dec!(77));
    assert_eq!(invoice["invoice"]["status"], "ISSUED");
    let id = invoice["invoice"]["id"].as_str().unwrap().to_string();

    let partial = app
        .create(
            &format!("/api/v1/invoices/{}/payments", id),
            json!({ "amount": "30.00", "method": "CASH" }),
        )
        .await;
    assert_eq!(partial["invoice"]["status"], "PARTIALLY_PAID");
    assert_eq!(money(&partial["balance_due"]), dec!(47));

    let settled = app
        .create(
            &format!("/api/v1/invoices/{}/payments", id),
            json!({ "amount": "47.00", "method": "TRANSFER", "reference": "TRX-1" }),
        )
        .await;
    assert_eq!(settled["invoice"]["status"], "PAID");
    assert_eq!(money(&settled["invoice"]["amount_paid"]), dec!(77));

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/invoices/{}/payments", id),
            Some(json!({ "amount": "5.00" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn invoice_numbers_are_sequential_per_day() {
    let app = TestApp::new().await;
    let client = app.seed_client("Carla").await;
    let consult = app.seed_service("Consultation", "20.00").await;
    let body = json!({
        "client_id": client,
        "issue_date": "2024-05-02",
        "items": [{ "item_type": "SERVICE", "service_id": consult, "quantity": 1 }]
    });

    let first = app.create("/api/v1/invoices", body.clone()).await;
    let second = app.create("/api/v1/invoices", body.clone()).await;
    let third = app.create("/api/v1/invoices", body).await;

    assert_eq!(first["invoice"]["number"], "INV-20240502-0001");
    assert_eq!(second["invoice"]["number"], "INV-20240502-0002");
    assert_eq!(third["invoice"]["number"], "INV-20240502-0003");
}

#[tokio::test]
async fn taken_invoice_number_answers_conflict() {
    let app = TestApp::new().await;
    let client = app.seed_client("Carmen").await;
    let consult = app.seed_service("Consultation", "20.00").await;

    // sequence 1 carrying the number sequence 2 would get
    invoice::ActiveModel {
        id: Set(Uuid::new_v4()),
        clinic_id: Set(app.clinic_id),
        client_id: Set(client),
        pet_id: Set(None),
        appointment_id: Set(None),
        number: Set("INV-20240502-0002".to_string()),
        sequence: Set(1),
        issue_date: Set(NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()),
        status: Set(InvoiceStatus::Issued),
        subtotal: Set(Decimal::ZERO),
        discount: Set(Decimal::ZERO),
        tax_rate: Set(Decimal::ZERO),
        tax_amount: Set(Decimal::ZERO),
        total: Set(Decimal::ZERO),
        amount_paid: Set(Decimal::ZERO),
        notes: Set(None),
        voided_at: Set(None),
        void_reason: Set(None),
        ..Default::default()
    }
    .insert(app.state.db.as_ref())
    .await
    .unwrap();

    let response = app
        .request(
            Method::POST,
            "/api/v1/invoices",
            Some(json!({
                "client_id": client,
                "issue_date": "2024-05-02",
                "items": [{ "item_type": "SERVICE", "service_id": consult, "quantity": 1 }]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let list = app.get("/api/v1/invoices").await;
    assert_eq!(list["total"], 1);
}

#[tokio::test]
async fn amounts_beyond_a_money_column_are_rejected() {
    let app = TestApp::new().await;
    let client = app.seed_client("Dolores").await;
    let consult = app.seed_service("Consultation", "20.00").await;

    let huge_price = app
        .request(
            Method::POST,
            "/api/v1/invoices",
            Some(json!({
                "client_id": client,
                "items": [{
                    "item_type": "SERVICE",
                    "service_id": consult,
                    "quantity": 2,
                    "unit_price": "79228162514264337593543950335"
                }]
            })),
        )
        .await;
    assert_eq!(huge_price.status(), StatusCode::BAD_REQUEST);
    let body = response_json(huge_price).await;
    assert!(body["field_errors"]["items[0].unit_price"].is_array(), "{}", body);

    let overflowing_line = app
        .request(
            Method::POST,
            "/api/v1/invoices",
            Some(json!({
                "client_id": client,
                "items": [{
                    "item_type": "SERVICE",
                    "service_id": consult,
                    "quantity": 2,
                    "unit_price": "9999999999.99"
                }]
            })),
        )
        .await;
    assert_eq!(overflowing_line.status(), StatusCode::BAD_REQUEST);
    let body = response_json(overflowing_line).await;
    assert!(body["field_errors"]["items[0].quantity"].is_array(), "{}", body);

    let fractional_cents = app
        .request(
            Method::POST,
            "/api/v1/invoices",
            Some(json!({
                "client_id": client,
                "items": [{
                    "item_type": "SERVICE",
                    "service_id": consult,
                    "quantity": 1,
                    "unit_price": "10.005"
                }]
            })),
        )
        .await;
    assert_eq!(fractional_cents.status(), StatusCode::BAD_REQUEST);

    let invoice = app
        .create(
            "/api/v1/invoices",
            json!({
                "client_id": client,
                "items": [{ "item_type": "SERVICE", "service_id": consult, "quantity": 1 }]
            }),
        )
        .await;
    let payment = app
        .request(
            Method::POST,
            &format!("/api/v1/invoices/{}/payments", id_of(&invoice["invoice"])),
            Some(json!({ "amount": "10000000000.00", "method": "CASH" })),
        )
        .await;
    assert_eq!(payment.status(), StatusCode::BAD_REQUEST);
    let body = response_json(payment).await;
    assert!(body["field_errors"]["amount"].is_array(), "{}", body);

    let list = app.get("/api/v1/invoices").await;
    assert_eq!(list["total"], 1);
}

#[tokio::test]
async fn invalid_line_reports_field_path() {
    let app = TestApp::new().await;
    let client = app.seed_client("Dario").await;
    let consult = app.seed_service("Consultation", "20.00").await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/invoices",
            Some(json!({
                "client_id": client,
                "items": [
                    { "item_type": "SERVICE", "service_id": consult, "quantity": 1 },
                    { "item_type": "SERVICE", "service_id": consult, "quantity": 0 }
                ]
            })),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert!(body["field_errors"]["items[1].quantity"].is_array(), "{}", body);

    let list = app.get("/api/v1/invoices").await;
    assert_eq!(list["total"], 0);
}

#[tokio::test]
async fn empty_invoice_is_rejected() {
    let app = TestApp::new().await;
    let client = app.seed_client("Eva").await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/invoices",
            Some(json!({ "client_id": client, "items": [] })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert!(body["field_errors"]["items"].is_array());
}

#[tokio::test]
async fn draft_moves_stock_only_when_issued() {
    let app = TestApp::new().await;
    let client = app.seed_client("Fede").await;
    let collar = app.seed_product("Flea collar", "12.00", 5, 1).await;

    let draft = app
        .create(
            "/api/v1/invoices",
            json!({
                "client_id": client,
                "save_as_draft": true,
                "items": [{ "item_type": "PRODUCT", "product_id": collar, "quantity": 2 }]
            }),
        )
        .await;
    assert_eq!(draft["invoice"]["status"], "DRAFT");
    let product = app.get(&format!("/api/v1/products/{}", collar)).await;
    assert_eq!(product["stock_on_hand"], 5);

    let id = draft["invoice"]["id"].as_str().unwrap();
    let response = app
        .request(Method::POST, &format!("/api/v1/invoices/{}/issue", id), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let issued = response_json(response).await;
    assert_eq!(issued["data"]["invoice"]["status"], "ISSUED");

    let product = app.get(&format!("/api/v1/products/{}", collar)).await;
    assert_eq!(product["stock_on_hand"], 3);
}

#[tokio::test]
async fn void_restocks_sold_units() {
    let app = TestApp::new().await;
    let client = app.seed_client("Gala").await;
    let toy = app.seed_product("Chew toy", "6.00", 10, 0).await;

    let invoice = app
        .create(
            "/api/v1/invoices",
            json!({
                "client_id": client,
                "items": [{ "item_type": "PRODUCT", "product_id": toy, "quantity": 4 }]
            }),
        )
        .await;
    let id = invoice["invoice"]["id"].as_str().unwrap();
    assert_eq!(app.get(&format!("/api/v1/products/{}", toy)).await["stock_on_hand"], 6);

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/invoices/{}/void", id),
            Some(json!({ "reason": "Billed to the wrong client" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let voided = response_json(response).await;
    assert_eq!(voided["data"]["invoice"]["status"], "VOID");
    assert_eq!(voided["data"]["invoice"]["void_reason"], "Billed to the wrong client");

    assert_eq!(app.get(&format!("/api/v1/products/{}", toy)).await["stock_on_hand"], 10);
    let movements = app.get(&format!("/api/v1/products/{}/movements", toy)).await;
    let kinds: Vec<&str> = movements["items"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|m| m["movement_type"].as_str())
        .collect();
    assert!(kinds.contains(&"SALE"));
    assert!(kinds.contains(&"RETURN"));

    let again = app
        .request(Method::POST, &format!("/api/v1/invoices/{}/void", id), None)
        .await;
    assert_eq!(again.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn paid_invoice_cannot_be_voided() {
    let app = TestApp::new().await;
    let client = app.seed_client("Hugo").await;
    let consult = app.seed_service("Consultation", "30.00").await;

    let invoice = app
        .create(
            "/api/v1/invoices",
            json!({
                "client_id": client,
                "items": [{ "item_type": "SERVICE", "service_id": consult, "quantity": 1 }],
                "payment": { "amount": "10.00" }
            }),
        )
        .await;
    assert_eq!(invoice["invoice"]["status"], "PARTIALLY_PAID");

    let id = invoice["invoice"]["id"].as_str().unwrap();
    let response = app
        .request(Method::POST, &format!("/api/v1/invoices/{}/void", id), None)
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn ticket_renders_escaped_html() {
    let app = TestApp::new().await;
    let client = app
        .create(
            "/api/v1/clients",
            json!({ "first_name": "<Iris>", "last_name": "Lopez" }),
        )
        .await;
    let consult = app.seed_service("Consultation", "30.00").await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/invoices",
            Some(json!({
                "client_id": client["id"],
                "items": [{ "item_type": "SERVICE", "service_id": consult, "quantity": 1 }]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = response_json(response).await;
    let id = created["data"]["invoice"]["id"].as_str().unwrap().to_string();
    let message = created["message"].as_str().unwrap_or_default();
    assert!(message.contains(&format!("/api/v1/invoices/{}/ticket", id)));

    let response = app
        .request(Method::GET, &format!("/api/v1/invoices/{}/ticket", id), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = response_text(response).await;
    assert!(html.contains(created["data"]["invoice"]["number"].as_str().unwrap()));
    assert!(html.contains("&lt;Iris&gt;"));
    assert!(!html.contains("<Iris>"));
}

#[tokio::test]
async fn client_invoice_history_lists_invoices() {
    let app = TestApp::new().await;
    let client = app.seed_client("Jon").await;
    let consult = app.seed_service("Consultation", "15.00").await;
    for _ in 0..2 {
        app.create(
            "/api/v1/invoices",
            json!({
                "client_id": client,
                "items": [{ "item_type": "SERVICE", "service_id": consult, "quantity": 1 }]
            }),
        )
        .await;
    }

    let invoices = app.get(&format!("/api/v1/clients/{}/invoices", client)).await;
    assert_eq!(invoices.as_array().unwrap().len(), 2);

    let filtered = app.get("/api/v1/invoices?status=ISSUED").await;
    assert_eq!(filtered["total"], 2);
}
