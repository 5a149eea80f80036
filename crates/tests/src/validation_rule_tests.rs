use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::{id_of, test_app};

fn min_dpd_rule() -> serde_json::Value {
    json!({
        "name": "Arbitration needs 60+ DPD",
        "field": "dpd",
        "operator": "gte",
        "value": 60,
        "case_type": "ARBITRATION",
        "message": "DPD must be at least 60 before arbitration",
    })
}

#[tokio::test]
async fn crud_round() {
    let app = test_app().await;

    let (status, rule) = app.post("/api/validation-rules", min_dpd_rule()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(rule["case_type"], "arbitration");
    assert_eq!(rule["is_active"], true);

    let uri = format!("/api/validation-rules/{}", id_of(&rule));
    let (status, updated) = app.put(&uri, json!({ "value": 45 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["value"], 45.0);

    let (_, list) = app.get("/api/validation-rules").await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, _) = app.delete(&uri).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.get(&uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_rules_rejected() {
    let app = test_app().await;

    let mut bad_field = min_dpd_rule();
    bad_field["field"] = json!("borrower_name");
    let (status, _) = app.post("/api/validation-rules", bad_field).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut bad_operator = min_dpd_rule();
    bad_operator["operator"] = json!("between");
    let (status, _) = app.post("/api/validation-rules", bad_operator).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut blank_message = min_dpd_rule();
    blank_message["message"] = json!("   ");
    let (status, _) = app.post("/api/validation-rules", blank_message).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn evaluate_reports_violations_for_the_case_type() {
    let app = test_app().await;

    app.post("/api/validation-rules", min_dpd_rule()).await;
    app.post(
        "/api/validation-rules",
        json!({
            "name": "Minimum claim",
            "field": "outstanding_amount",
            "operator": "gt",
            "value": 10000,
            "message": "Outstanding must exceed 10,000",
        }),
    )
    .await;

    let (status, result) = app
        .post(
            "/api/validation-rules/evaluate",
            json!({ "case_type": "arbitration", "dpd": 30, "outstanding_amount": 50000.0 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["valid"], false);
    assert_eq!(result["rules_checked"], 2);
    assert_eq!(result["violations"][0]["field"], "dpd");

    let (_, other) = app
        .post(
            "/api/validation-rules/evaluate",
            json!({ "case_type": "civil_suit", "dpd": 30, "outstanding_amount": 5000.0 }),
        )
        .await;
    assert_eq!(other["rules_checked"], 1);
    assert_eq!(other["violations"][0]["field"], "outstanding_amount");

    let (status, _) = app
        .post(
            "/api/validation-rules/evaluate",
            json!({ "case_type": "lottery", "dpd": 1, "outstanding_amount": 1.0 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
