mod common;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use common::{id_of, response_json, TestApp};
use serde_json::json;

#[tokio::test]
async fn booster_date_comes_from_the_catalog() {
    let app = TestApp::new().await;
    let client = app.seed_client("Wanda").await;
    let pet = app.seed_pet(client, "Thor").await;
    let rabies = app
        .create(
            "/api/v1/vaccines",
            json!({ "name": "Rabies", "booster_interval_days": 365 }),
        )
        .await;

    let applied = Utc::now().date_naive() - Duration::days(10);
    let record = app
        .create(
            "/api/v1/vaccinations",
            json!({ "pet_id": pet, "vaccine_id": rabies["id"], "applied_on": applied }),
        )
        .await;
    assert_eq!(record["vaccine_name"], "Rabies");
    assert_eq!(
        record["next_due_on"],
        (applied + Duration::days(365)).to_string()
    );

    let listed = app.get(&format!("/api/v1/pets/{}/vaccinations", pet)).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn species_specific_vaccine_is_checked() {
    let app = TestApp::new().await;
    let client = app.seed_client("Xavi").await;
    let dog = app.seed_pet(client, "Bruno").await;
    let feline = app
        .create(
            "/api/v1/vaccines",
            json!({ "name": "Feline trivalent", "species": "CAT" }),
        )
        .await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/vaccinations",
            Some(json!({ "pet_id": dog, "vaccine_id": feline["id"] })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert!(body["field_errors"]["vaccine_id"].is_array());
}

#[tokio::test]
async fn future_application_is_rejected() {
    let app = TestApp::new().await;
    let client = app.seed_client("Yago").await;
    let pet = app.seed_pet(client, "Sol").await;
    let tomorrow = Utc::now().date_naive() + Duration::days(1);

    let response = app
        .request(
            Method::POST,
            "/api/v1/vaccinations",
            Some(json!({ "pet_id": pet, "vaccine_name": "Parvo", "applied_on": tomorrow })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert!(body["field_errors"]["applied_on"].is_array());
}

#[tokio::test]
async fn due_list_and_reminders_run_once() {
    let app = TestApp::new().await;
    let client = app.seed_client("Zoe").await;
    let soon = app.seed_pet(client, "Soon").await;
    let later = app.seed_pet(client, "Later").await;
    let today = Utc::now().date_naive();

    for (pet, due_in) in [(soon, 5), (later, 60)] {
        app.create(
            "/api/v1/vaccinations",
            json!({
                "pet_id": pet,
                "vaccine_name": "DHPPi",
                "applied_on": today - Duration::days(300),
                "next_due_on": today + Duration::days(due_in)
            }),
        )
        .await;
    }

    let due = app.get("/api/v1/vaccinations/due").await;
    let due = due.as_array().unwrap();
    assert_eq!(due.len(), 1);
    assert_eq!(due[0]["pet_name"], "Soon");
    assert_eq!(due[0]["days_until_due"], 5);

    let wide = app.get("/api/v1/vaccinations/due?days=90").await;
    assert_eq!(wide.as_array().unwrap().len(), 2);

    let response = app
        .request(Method::GET, "/api/v1/vaccinations/due?days=400", None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .request(Method::POST, "/api/v1/notifications/vaccine-reminders", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let run = response_json(response).await;
    assert_eq!(run["data"]["created"].as_array().unwrap().len(), 1);
    assert_eq!(run["data"]["created"][0]["kind"], "VACCINE_DUE");

    let response = app
        .request(Method::POST, "/api/v1/notifications/vaccine-reminders", None)
        .await;
    let rerun = response_json(response).await;
    assert_eq!(rerun["data"]["created"].as_array().unwrap().len(), 0);

    let notifications = app.get("/api/v1/notifications?unread=true").await;
    assert_eq!(notifications["total"], 1);
    let id = id_of(&notifications["items"][0]);

    let response = app
        .request(Method::POST, &format!("/api/v1/notifications/{}/read", id), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let unread = app.get("/api/v1/notifications/unread-count").await;
    assert_eq!(unread["unread"], 0);
}

#[tokio::test]
async fn deactivated_pets_drop_out_of_the_due_list() {
    let app = TestApp::new().await;
    let client = app.seed_client("Abel").await;
    let pet = app.seed_pet(client, "Old Timer").await;
    let today = Utc::now().date_naive();
    app.create(
        "/api/v1/vaccinations",
        json!({
            "pet_id": pet,
            "vaccine_name": "Rabies",
            "applied_on": today - Duration::days(360),
            "next_due_on": today + Duration::days(2)
        }),
    )
    .await;

    app.request(Method::DELETE, &format!("/api/v1/pets/{}", pet), None)
        .await;

    let due = app.get("/api/v1/vaccinations/due").await;
    assert!(due.as_array().unwrap().is_empty());
}
