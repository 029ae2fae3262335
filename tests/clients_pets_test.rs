mod common;

use axum::http::{Method, StatusCode};
use common::{id_of, money, response_json, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;

#[tokio::test]
async fn client_crud_with_archive() {
    let app = TestApp::new().await;
    let created = app
        .create(
            "/api/v1/clients",
            json!({
                "first_name": "  Olga ",
                "last_name": "Perez",
                "email": "olga@example.com",
                "phone": "   "
            }),
        )
        .await;
    let id = id_of(&created);
    assert_eq!(created["first_name"], "Olga");
    assert!(created["phone"].is_null());

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/clients/{}", id),
            Some(json!({ "phone": "+34 699 000 111" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = response_json(response).await;
    assert_eq!(updated["data"]["phone"], "+34 699 000 111");
    assert_eq!(updated["data"]["email"], "olga@example.com");

    let found = app.get("/api/v1/clients?search=PEREZ").await;
    assert_eq!(found["total"], 1);

    let response = app
        .request(Method::DELETE, &format!("/api/v1/clients/{}", id), None)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let listed = app.get("/api/v1/clients").await;
    assert_eq!(listed["total"], 0);
    let archived = app.get("/api/v1/clients?include_archived=true").await;
    assert_eq!(archived["total"], 1);
    assert!(!archived["items"][0]["archived_at"].is_null());
}

#[tokio::test]
async fn client_requires_names() {
    let app = TestApp::new().await;
    let response = app
        .request(
            Method::POST,
            "/api/v1/clients",
            Some(json!({ "first_name": "", "last_name": "Solo", "email": "not-an-email" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert!(body["field_errors"]["first_name"].is_array());
    assert!(body["field_errors"]["email"].is_array());
}

#[tokio::test]
async fn pet_belongs_to_known_client() {
    let app = TestApp::new().await;
    let response = app
        .request(
            Method::POST,
            "/api/v1/pets",
            Some(json!({ "client_id": uuid::Uuid::new_v4(), "name": "Ghost", "species": "CAT" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert!(body["field_errors"]["client_id"].is_array());
}

#[tokio::test]
async fn deactivated_pet_leaves_owner_list() {
    let app = TestApp::new().await;
    let client = app.seed_client("Pilar").await;
    let rex = app.seed_pet(client, "Rex").await;
    app.seed_pet(client, "Bimba").await;

    let pets = app.get(&format!("/api/v1/clients/{}/pets", client)).await;
    assert_eq!(pets.as_array().unwrap().len(), 2);

    let response = app
        .request(Method::DELETE, &format!("/api/v1/pets/{}", rex), None)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let pets = app.get(&format!("/api/v1/clients/{}/pets", client)).await;
    let names: Vec<&str> = pets
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|p| p["name"].as_str())
        .collect();
    assert_eq!(names, vec!["Bimba"]);

    // the record itself stays readable for history
    let pet = app.get(&format!("/api/v1/pets/{}", rex)).await;
    assert_eq!(pet["is_active"], false);
}

#[tokio::test]
async fn visit_updates_weight_and_history() {
    let app = TestApp::new().await;
    let client = app.seed_client("Quique").await;
    let pet = app.seed_pet(client, "Nala").await;

    let visit = app
        .create(
            "/api/v1/visits",
            json!({
                "pet_id": pet,
                "reason": "Limping",
                "diagnosis": "Sprain",
                "weight_kg": "18.30",
                "temperature_c": "38.6"
            }),
        )
        .await;
    assert_eq!(visit["diagnosis"], "Sprain");

    let pet_row = app.get(&format!("/api/v1/pets/{}", pet)).await;
    assert_eq!(money(&pet_row["weight_kg"]), dec!(18.3));

    let history = app.get(&format!("/api/v1/pets/{}/history", pet)).await;
    assert_eq!(history["visits"].as_array().unwrap().len(), 1);
    assert_eq!(history["vaccinations"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn appointment_window_and_status() {
    let app = TestApp::new().await;
    let client = app.seed_client("Rosa").await;
    let pet = app.seed_pet(client, "Coco").await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/appointments",
            Some(json!({
                "client_id": client,
                "pet_id": pet,
                "starts_at": "2030-01-10T10:00:00Z",
                "ends_at": "2030-01-10T09:30:00Z"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let appointment = app
        .create(
            "/api/v1/appointments",
            json!({
                "client_id": client,
                "pet_id": pet,
                "starts_at": "2030-01-10T10:00:00Z",
                "ends_at": "2030-01-10T10:30:00Z",
                "reason": "Vaccines"
            }),
        )
        .await;
    assert_eq!(appointment["status"], "SCHEDULED");
    let id = id_of(&appointment);

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/appointments/{}/status", id),
            Some(json!({ "status": "COMPLETED" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/appointments/{}/status", id),
            Some(json!({ "status": "SCHEDULED" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let listed = app
        .get("/api/v1/appointments?from=2030-01-10&to=2030-01-10")
        .await;
    assert_eq!(listed["total"], 1);
}
