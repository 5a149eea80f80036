use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::{id_of, test_app};

#[tokio::test]
async fn state_codes_are_uppercased() {
    let app = test_app().await;

    let (status, body) = app
        .post("/api/states", json!({ "code": "ka", "name": "Karnataka" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["code"], "KA");
    assert_eq!(body["is_active"], true);
}

#[tokio::test]
async fn duplicate_state_code_409() {
    let app = test_app().await;

    let (status, _) = app
        .post("/api/states", json!({ "code": "MH", "name": "Maharashtra" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .post("/api/states", json!({ "code": "mh", "name": "Maharashtra again" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "Conflict");
}

#[tokio::test]
async fn malformed_codes_400() {
    let app = test_app().await;

    let (status, _) = app
        .post("/api/states", json!({ "code": "MAHA", "name": "Too long" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post("/api/languages", json!({ "code": "e1", "name": "Digits" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn language_codes_are_lowercased() {
    let app = test_app().await;

    let (status, body) = app
        .post("/api/languages", json!({ "code": "MR", "name": "Marathi" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["code"], "mr");
}

#[tokio::test]
async fn product_update_and_active_filter() {
    let app = test_app().await;

    let (_, pl) = app
        .post("/api/products", json!({ "code": "PL", "name": "Personal Loan" }))
        .await;
    let (_, _) = app
        .post("/api/products", json!({ "code": "TW", "name": "Two Wheeler" }))
        .await;

    let (status, updated) = app
        .put(
            &format!("/api/products/{}", id_of(&pl)),
            json!({ "is_active": false, "description": "Unsecured" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["is_active"], false);
    assert_eq!(updated["description"], "Unsecured");

    let (status, active) = app.get("/api/products?active=true").await;
    assert_eq!(status, StatusCode::OK);
    let codes: Vec<&str> = active
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["code"].as_str().unwrap())
        .collect();
    assert_eq!(codes, vec!["TW"]);
}

#[tokio::test]
async fn blank_name_on_update_422() {
    let app = test_app().await;

    let (_, state) = app
        .post("/api/states", json!({ "code": "GJ", "name": "Gujarat" }))
        .await;
    let (status, body) = app
        .put(&format!("/api/states/{}", id_of(&state)), json!({ "name": "  " }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["field_errors"]["name"].is_string());
}

#[tokio::test]
async fn deleted_state_is_gone() {
    let app = test_app().await;

    let (_, state) = app
        .post("/api/states", json!({ "code": "GJ", "name": "Gujarat" }))
        .await;
    let uri = format!("/api/states/{}", id_of(&state));

    let (status, _) = app.delete(&uri).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get(&uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.delete(&uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bad_uuid_400() {
    let app = test_app().await;

    let (status, body) = app.get("/api/states/not-a-uuid").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid UUID format");
}
