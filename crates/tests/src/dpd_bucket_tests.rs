use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::{id_of, test_app};

#[tokio::test]
async fn resolve_picks_the_containing_bucket() {
    let app = test_app().await;

    for (code, min, max) in [("B0", 0, Some(30)), ("B1", 31, Some(90)), ("B2", 91, None)] {
        let (status, _) = app
            .post(
                "/api/dpd-buckets",
                json!({ "code": code, "name": code, "min_days": min, "max_days": max }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = app.get("/api/dpd-buckets/resolve/31").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], "B1");

    let (_, body) = app.get("/api/dpd-buckets/resolve/5000").await;
    assert_eq!(body["code"], "B2");

    let (status, _) = app.get("/api/dpd-buckets/resolve/-1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn overlapping_range_409() {
    let app = test_app().await;

    let (status, _) = app
        .post(
            "/api/dpd-buckets",
            json!({ "code": "B0", "name": "Current", "min_days": 0, "max_days": 30 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .post(
            "/api/dpd-buckets",
            json!({ "code": "B1", "name": "Overlap", "min_days": 30, "max_days": 60 }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["message"].as_str().unwrap().contains("B0"));
}

#[tokio::test]
async fn inverted_range_400() {
    let app = test_app().await;

    let (status, _) = app
        .post(
            "/api/dpd-buckets",
            json!({ "code": "BX", "name": "Backwards", "min_days": 60, "max_days": 30 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn no_bucket_for_days_404() {
    let app = test_app().await;

    let (status, _) = app
        .post(
            "/api/dpd-buckets",
            json!({ "code": "B0", "name": "Current", "min_days": 0, "max_days": 30 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app.get("/api/dpd-buckets/resolve/45").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_can_open_the_upper_bound() {
    let app = test_app().await;

    let (_, bucket) = app
        .post(
            "/api/dpd-buckets",
            json!({ "code": "B2", "name": "Late", "min_days": 91, "max_days": 180 }),
        )
        .await;

    let (status, body) = app
        .put(
            &format!("/api/dpd-buckets/{}", id_of(&bucket)),
            json!({ "max_days": null }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["max_days"].is_null());

    let (_, resolved) = app.get("/api/dpd-buckets/resolve/400").await;
    assert_eq!(resolved["code"], "B2");
}
