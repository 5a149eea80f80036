use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::{case_body, create_case, id_of, seed_master_data, test_app};

#[tokio::test]
async fn create_case_starts_in_draft() {
    let app = test_app().await;
    seed_master_data(&app).await;

    let case = create_case(&app, "LN0001").await;
    assert_eq!(case["status"], "draft");
    assert_eq!(case["state_code"], "MH");
    assert!(case["case_id"].as_str().unwrap().starts_with("LC-"));
    assert!(case["case_id"].as_str().unwrap().ends_with("-0001"));

    let second = create_case(&app, "LN0002").await;
    assert!(second["case_id"].as_str().unwrap().ends_with("-0002"));
}

#[tokio::test]
async fn create_case_normalises_codes() {
    let app = test_app().await;
    seed_master_data(&app).await;

    let mut body = case_body("LN0003");
    body["state_code"] = json!("mh");
    body["language_code"] = json!("EN");
    let (status, case) = app.post("/api/cases", body).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(case["state_code"], "MH");
    assert_eq!(case["language_code"], "en");
}

#[tokio::test]
async fn unknown_master_data_400() {
    let app = test_app().await;
    seed_master_data(&app).await;

    let mut body = case_body("LN0004");
    body["state_code"] = json!("KA");
    let (status, resp) = app.post("/api/cases", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(resp["message"].as_str().unwrap().contains("state_code"));
}

#[tokio::test]
async fn bad_mobile_422() {
    let app = test_app().await;
    seed_master_data(&app).await;

    let mut body = case_body("LN0005");
    body["borrower_mobile"] = json!("12345");
    let (status, resp) = app.post("/api/cases", body).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(resp["field_errors"]["borrower_mobile"].is_string());
}

#[tokio::test]
async fn duplicate_open_case_409() {
    let app = test_app().await;
    seed_master_data(&app).await;

    create_case(&app, "LN0006").await;
    let (status, _) = app.post("/api/cases", case_body("LN0006")).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn status_walks_the_lifecycle() {
    let app = test_app().await;
    seed_master_data(&app).await;

    let case = create_case(&app, "LN0007").await;
    let uri = format!("/api/cases/{}/status", id_of(&case));

    let (status, body) = app.patch(&uri, json!({ "status": "filed" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "filed");

    let (status, _) = app.patch(&uri, json!({ "status": "draft" })).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .patch(&uri, json!({ "status": "settled", "remarks": "Paid in full" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["closed_date"].is_string());

    let (status, history) = app
        .get(&format!("/api/cases/{}/history", id_of(&case)))
        .await;
    assert_eq!(status, StatusCode::OK);
    let to: Vec<&str> = history
        .as_array()
        .unwrap()
        .iter()
        .map(|h| h["to_status"].as_str().unwrap())
        .collect();
    assert_eq!(to, vec!["draft", "filed", "settled"]);
}

#[tokio::test]
async fn unknown_status_400() {
    let app = test_app().await;
    seed_master_data(&app).await;

    let case = create_case(&app, "LN0008").await;
    let (status, _) = app
        .patch(
            &format!("/api/cases/{}/status", id_of(&case)),
            json!({ "status": "archived" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn hearings_need_a_filed_case() {
    let app = test_app().await;
    seed_master_data(&app).await;

    let case = create_case(&app, "LN0009").await;
    let hearings = format!("/api/cases/{}/hearings", id_of(&case));
    let hearing = json!({
        "hearing_date": "2026-01-15",
        "outcome": "Adjourned",
        "next_hearing_date": "2099-03-01",
    });

    let (status, _) = app.post(&hearings, hearing.clone()).await;
    assert_eq!(status, StatusCode::CONFLICT);

    app.patch(
        &format!("/api/cases/{}/status", id_of(&case)),
        json!({ "status": "filed" }),
    )
    .await;

    let (status, body) = app.post(&hearings, hearing).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["outcome"], "Adjourned");

    let (_, fetched) = app.get(&format!("/api/cases/{}", id_of(&case))).await;
    assert_eq!(fetched["next_hearing_date"], "2099-03-01");

    let (_, list) = app.get(&hearings).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn hearing_without_next_date_keeps_the_scheduled_one() {
    let app = test_app().await;
    seed_master_data(&app).await;

    let case = create_case(&app, "LN0015").await;
    app.patch(
        &format!("/api/cases/{}/status", id_of(&case)),
        json!({ "status": "filed" }),
    )
    .await;
    let hearings = format!("/api/cases/{}/hearings", id_of(&case));

    let (status, _) = app
        .post(
            &hearings,
            json!({
                "hearing_date": "2026-01-15",
                "outcome": "Adjourned",
                "next_hearing_date": "2099-03-01",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .post(
            &hearings,
            json!({ "hearing_date": "2026-02-10", "outcome": "Arguments heard" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, fetched) = app.get(&format!("/api/cases/{}", id_of(&case))).await;
    assert_eq!(fetched["next_hearing_date"], "2099-03-01");
    assert_eq!(fetched["status"], "hearing");
}

#[tokio::test]
async fn settled_case_rejects_filing_date_after_closure() {
    let app = test_app().await;
    seed_master_data(&app).await;

    let case = create_case(&app, "LN0016").await;
    let status_uri = format!("/api/cases/{}/status", id_of(&case));
    app.patch(&status_uri, json!({ "status": "notice_sent" })).await;
    let (status, settled) = app
        .patch(
            &status_uri,
            json!({ "status": "settled", "closed_date": "2025-01-10" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(settled["closed_date"], "2025-01-10");

    let case_uri = format!("/api/cases/{}", id_of(&case));
    let (status, body) = app
        .put(&case_uri, json!({ "filing_date": "2025-06-01" }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["field_errors"]["filing_date"]
        .as_str()
        .unwrap()
        .contains("closed_date"));

    let (status, body) = app
        .put(&case_uri, json!({ "filing_date": "2024-12-01" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["filing_date"], "2024-12-01");
}

#[tokio::test]
async fn search_filters_and_paginates() {
    let app = test_app().await;
    seed_master_data(&app).await;

    for n in 0..3 {
        create_case(&app, &format!("LN10{n}")).await;
    }
    let mut low = case_body("LN200");
    low["dpd"] = json!(10);
    app.post("/api/cases", low).await;

    let (status, page) = app.get("/api/cases?min_dpd=100&limit=2&page=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["meta"]["total"], 3);
    assert_eq!(page["data"].as_array().unwrap().len(), 2);

    let (_, by_q) = app.get("/api/cases?q=LN200").await;
    assert_eq!(by_q["meta"]["total"], 1);

    let (status, _) = app.get("/api/cases?status=bogus").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn lookup_by_case_id_and_statistics() {
    let app = test_app().await;
    seed_master_data(&app).await;

    let case = create_case(&app, "LN0010").await;
    create_case(&app, "LN0011").await;

    let (status, found) = app
        .get(&format!(
            "/api/cases/by-case-id/{}",
            case["case_id"].as_str().unwrap()
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["id"], case["id"]);

    let (status, stats) = app.get("/api/cases/statistics").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total"], 2);
    assert_eq!(stats["total_outstanding"], 500000.0);
}

#[tokio::test]
async fn deleted_case_disappears() {
    let app = test_app().await;
    seed_master_data(&app).await;

    let case = create_case(&app, "LN0012").await;
    let uri = format!("/api/cases/{}", id_of(&case));

    let (status, _) = app.delete(&uri).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.get(&uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn validation_rules_block_case_creation() {
    let app = test_app().await;
    seed_master_data(&app).await;

    let (status, _) = app
        .post(
            "/api/validation-rules",
            json!({
                "name": "Section 138 needs 90+ DPD",
                "field": "dpd",
                "operator": "gte",
                "value": 90,
                "case_type": "section_138",
                "message": "DPD must be at least 90 for a cheque bounce case",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let mut body = case_body("LN0013");
    body["dpd"] = json!(30);
    let (status, resp) = app.post("/api/cases", body).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(resp["field_errors"]["dpd"].as_str().unwrap().contains("90"));

    create_case(&app, "LN0014").await;
}
