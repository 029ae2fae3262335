mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp};
use serde_json::json;

#[tokio::test]
async fn overselling_floors_stock_and_raises_low_stock() {
    let app = TestApp::new().await;
    let client = app.seed_client("Lola").await;
    let dewormer = app.seed_product("Dewormer", "4.50", 3, 2).await;

    app.create(
        "/api/v1/invoices",
        json!({
            "client_id": client,
            "items": [{ "item_type": "PRODUCT", "product_id": dewormer, "quantity": 5 }]
        }),
    )
    .await;

    let product = app.get(&format!("/api/v1/products/{}", dewormer)).await;
    assert_eq!(product["stock_on_hand"], 0);

    let movements = app
        .get(&format!("/api/v1/products/{}/movements", dewormer))
        .await;
    let sale = movements["items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|m| m["movement_type"] == "SALE")
        .expect("sale movement recorded");
    assert_eq!(sale["previous_quantity"], 3);
    assert_eq!(sale["new_quantity"], 0);
    assert_eq!(sale["quantity"], -3);
    assert_eq!(sale["reference_type"], "invoice");

    let notifications = app.get("/api/v1/notifications?kind=LOW_STOCK").await;
    assert_eq!(notifications["total"], 1);
    assert_eq!(notifications["items"][0]["reference_id"], dewormer.to_string());

    let low = app.get("/api/v1/products/low-stock").await;
    assert_eq!(low.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn manual_adjustments_are_audited() {
    let app = TestApp::new().await;
    let litter = app.seed_product("Cat litter", "9.50", 10, 2).await;

    let adjusted = app
        .create(
            &format!("/api/v1/products/{}/stock-adjustments", litter),
            json!({ "delta": 5, "reason": "Supplier delivery" }),
        )
        .await;
    assert_eq!(adjusted["product"]["stock_on_hand"], 15);
    assert_eq!(adjusted["movement"]["movement_type"], "PURCHASE");
    assert_eq!(adjusted["movement"]["quantity"], 5);

    let counted = app
        .create(
            &format!("/api/v1/products/{}/stock-adjustments", litter),
            json!({ "set_to": 1, "reason": "Stock count" }),
        )
        .await;
    assert_eq!(counted["product"]["stock_on_hand"], 1);
    assert_eq!(counted["movement"]["movement_type"], "ADJUSTMENT");
    assert_eq!(counted["movement"]["quantity"], -14);

    let unread = app.get("/api/v1/notifications/unread-count").await;
    assert_eq!(unread["unread"], 1);

    let movements = app.get(&format!("/api/v1/products/{}/movements", litter)).await;
    // initial stock, delivery, count
    assert_eq!(movements["total"], 3);
}

#[tokio::test]
async fn adjustment_needs_exactly_one_mode() {
    let app = TestApp::new().await;
    let toy = app.seed_product("Toy", "3.00", 4, 0).await;

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/products/{}/stock-adjustments", toy),
            Some(json!({ "delta": 1, "set_to": 3 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert!(body["field_errors"]["set_to"].is_array());
}

#[tokio::test]
async fn referenced_products_are_deactivated_not_deleted() {
    let app = TestApp::new().await;
    let client = app.seed_client("Mara").await;
    let sold = app.seed_product("Shampoo", "8.00", 5, 0).await;
    let unused = app.seed_product("Brush", "5.00", 0, 0).await;

    app.create(
        "/api/v1/invoices",
        json!({
            "client_id": client,
            "items": [{ "item_type": "PRODUCT", "product_id": sold, "quantity": 1 }]
        }),
    )
    .await;

    let response = app
        .request(Method::DELETE, &format!("/api/v1/products/{}", sold), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await["data"], "deactivated");

    let response = app
        .request(Method::DELETE, &format!("/api/v1/products/{}", unused), None)
        .await;
    assert_eq!(response_json(response).await["data"], "deleted");

    let listed = app.get("/api/v1/products").await;
    assert_eq!(listed["total"], 0);
    let all = app.get("/api/v1/products?include_inactive=true").await;
    assert_eq!(all["total"], 1);
}

#[tokio::test]
async fn billed_services_stay_for_history() {
    let app = TestApp::new().await;
    let client = app.seed_client("Nico").await;
    let billed = app.seed_service("Grooming", "30.00").await;
    let unused = app.seed_service("Microchip", "40.00").await;

    app.create(
        "/api/v1/invoices",
        json!({
            "client_id": client,
            "items": [{ "item_type": "SERVICE", "service_id": billed, "quantity": 1 }]
        }),
    )
    .await;

    let response = app
        .request(Method::DELETE, &format!("/api/v1/services/{}", billed), None)
        .await;
    assert_eq!(response_json(response).await["data"], "deactivated");
    let response = app
        .request(Method::DELETE, &format!("/api/v1/services/{}", unused), None)
        .await;
    assert_eq!(response_json(response).await["data"], "deleted");

    // inactive services can no longer be billed
    let response = app
        .request(
            Method::POST,
            "/api/v1/invoices",
            Some(json!({
                "client_id": client,
                "items": [{ "item_type": "SERVICE", "service_id": billed, "quantity": 1 }]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert!(body["field_errors"]["items[0].service_id"].is_array());
}

#[tokio::test]
async fn manual_notifications_can_be_read_in_bulk() {
    let app = TestApp::new().await;
    for title in ["Call the lab", "Order gloves"] {
        app.create("/api/v1/notifications", json!({ "title": title }))
            .await;
    }

    let response = app
        .request(Method::POST, "/api/v1/notifications/read-all", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await["data"]["updated"], 2);

    let unread = app.get("/api/v1/notifications/unread-count").await;
    assert_eq!(unread["unread"], 0);
    let all = app.get("/api/v1/notifications").await;
    assert_eq!(all["items"][0]["kind"], "GENERAL");
}
