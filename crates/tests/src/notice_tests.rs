use axum::http::{header, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use server::actor::Actor;
use shared_types::{AppErrorKind, GenerateNoticeRequest};
use uuid::Uuid;

use crate::common::{create_case, id_of, seed_master_data, test_app, TestApp};

async fn demand_template(app: &TestApp, code: &str, output_format: &str) -> Value {
    let (status, template) = app
        .post(
            "/api/notice-templates",
            json!({
                "code": code,
                "name": "Demand notice",
                "notice_type": "demand_notice",
                "language_code": "en",
                "output_format": output_format,
                "subject": "Demand notice for {{ case.case_id }}",
                "body": "Dear {{ case.borrower_name }},\nYour mobile {{ case.borrower_mobile }} is on record.\nOutstanding: {{ case.outstanding_amount_display }}",
                "required_fields": ["case.borrower_address"],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "create template failed: {template}");
    template
}

#[tokio::test]
async fn template_starts_at_version_one() {
    let app = test_app().await;
    seed_master_data(&app).await;

    let template = demand_template(&app, "demand_en", "text").await;
    assert_eq!(template["code"], "DEMAND_EN");
    assert_eq!(template["version"], 1);

    let (status, updated) = app
        .put(
            &format!("/api/notice-templates/{}", id_of(&template)),
            json!({ "body": "Dear {{ case.borrower_name }}, please pay." }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["version"], 2);
}

#[tokio::test]
async fn invalid_notice_type_400() {
    let app = test_app().await;
    seed_master_data(&app).await;

    let (status, _) = app
        .post(
            "/api/notice-templates",
            json!({
                "code": "SUMMONS",
                "name": "Summons",
                "notice_type": "summons",
                "language_code": "en",
                "output_format": "text",
                "body": "Hello",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn preview_from_sample_masks_by_default() {
    let app = test_app().await;
    seed_master_data(&app).await;
    let template = demand_template(&app, "DEMAND_EN", "text").await;

    let sample = json!({
        "case": {
            "case_id": "LC-20260101-0001",
            "borrower_name": "Ravi Kumar",
            "borrower_mobile": "9876543210",
            "borrower_address": "Pune",
            "outstanding_amount_display": "1000.00",
        }
    });
    let uri = format!("/api/notice-templates/{}/preview", id_of(&template));

    let (status, preview) = app.post(&uri, json!({ "sample": sample })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(preview["masked"], true);
    assert_eq!(preview["subject"], "Demand notice for LC-20260101-0001");
    assert!(preview["content"].as_str().unwrap().contains("XXXXXX3210"));

    let (_, unmasked) = app
        .post(&uri, json!({ "sample": sample, "mask": false }))
        .await;
    assert!(unmasked["content"].as_str().unwrap().contains("9876543210"));
}

#[tokio::test]
async fn missing_required_field_422() {
    let app = test_app().await;
    seed_master_data(&app).await;
    let template = demand_template(&app, "DEMAND_EN", "text").await;

    let sample = json!({
        "case": {
            "case_id": "LC-20260101-0001",
            "borrower_name": "Ravi Kumar",
            "borrower_mobile": "9876543210",
            "borrower_address": "  ",
            "outstanding_amount_display": "1000.00",
        }
    });
    let (status, body) = app
        .post(
            &format!("/api/notice-templates/{}/preview", id_of(&template)),
            json!({ "sample": sample }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["field_errors"]["case.borrower_address"].is_string());
}

#[tokio::test]
async fn preview_needs_case_or_sample() {
    let app = test_app().await;
    seed_master_data(&app).await;
    let template = demand_template(&app, "DEMAND_EN", "text").await;

    let (status, _) = app
        .post(
            &format!("/api/notice-templates/{}/preview", id_of(&template)),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn generating_a_demand_notice_advances_a_draft() {
    let app = test_app().await;
    seed_master_data(&app).await;
    demand_template(&app, "DEMAND_EN", "text").await;
    let case = create_case(&app, "LN6001").await;

    let (status, notice) = app
        .post_as(
            "legal.ops",
            &format!("/api/cases/{}/notices", id_of(&case)),
            json!({ "template_code": "demand_en" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(notice["template_version"], 1);
    assert_eq!(notice["generated_by"], "legal.ops");
    assert!(notice["content"]
        .as_str()
        .unwrap()
        .contains("Outstanding: 250000.00"));

    let (_, fetched) = app.get(&format!("/api/cases/{}", id_of(&case))).await;
    assert_eq!(fetched["status"], "notice_sent");

    let (_, list) = app
        .get(&format!("/api/cases/{}/notices", id_of(&case)))
        .await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, _) = app
        .get(&format!("/api/notices/{}/download", id_of(&notice)))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn pdf_notice_is_stored_as_a_document() {
    let app = test_app().await;
    seed_master_data(&app).await;
    demand_template(&app, "DEMAND_PDF", "pdf").await;
    let case = create_case(&app, "LN6002").await;

    let (status, notice) = app
        .post(
            &format!("/api/cases/{}/notices", id_of(&case)),
            json!({ "template_code": "DEMAND_PDF" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "generate failed: {notice}");
    assert!(notice["document_id"].is_string());

    let (status, headers, bytes) = app
        .get_raw(&format!("/api/notices/{}/download", id_of(&notice)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
    assert!(bytes.starts_with(b"%PDF"));

    let (_, docs) = app
        .get(&format!("/api/cases/{}/documents", id_of(&case)))
        .await;
    assert_eq!(docs[0]["document_type"], "legal_notice");
}

#[tokio::test]
async fn notices_blocked_on_closed_cases() {
    let app = test_app().await;
    seed_master_data(&app).await;
    demand_template(&app, "DEMAND_EN", "text").await;
    let case = create_case(&app, "LN6003").await;

    let (status, _) = app
        .patch(
            &format!("/api/cases/{}/status", id_of(&case)),
            json!({ "status": "withdrawn" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .post(
            &format!("/api/cases/{}/notices", id_of(&case)),
            json!({ "template_code": "DEMAND_EN" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["field_errors"]["case"].is_string());
}

#[tokio::test]
async fn failed_pdf_notice_leaves_no_stored_file() {
    let app = test_app().await;
    seed_master_data(&app).await;
    demand_template(&app, "DEMAND_PDF", "pdf").await;
    let case = create_case(&app, "LN6004").await;
    let id = Uuid::parse_str(&id_of(&case)).unwrap();

    // Snapshot taken while the case is still a draft.
    let stale = server::repo::legal_case::find_by_id(&app.pool, id)
        .await
        .unwrap()
        .unwrap();
    let (status, _) = app
        .patch(
            &format!("/api/cases/{}/status", id_of(&case)),
            json!({ "status": "withdrawn" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let err = server::services::notice::generate(
        &app.state,
        server::config::notice_settings(),
        &stale,
        GenerateNoticeRequest {
            template_code: "DEMAND_PDF".to_string(),
            extra: None,
            mask: None,
        },
        &Actor::system(),
    )
    .await
    .unwrap_err();
    assert_eq!(err.kind, AppErrorKind::ValidationError);
    assert!(err.field_errors.contains_key("case"));

    let (_, docs) = app
        .get(&format!("/api/cases/{}/documents", id_of(&case)))
        .await;
    assert_eq!(docs.as_array().unwrap().len(), 0);
    let (_, notices) = app
        .get(&format!("/api/cases/{}/notices", id_of(&case)))
        .await;
    assert_eq!(notices.as_array().unwrap().len(), 0);

    let case_dir = app.storage_path().join("cases").join(id.to_string());
    let leftovers = std::fs::read_dir(&case_dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .filter(|e| std::fs::read_dir(e.path()).is_ok_and(|mut d| d.next().is_some()))
                .count()
        })
        .unwrap_or(0);
    assert_eq!(leftovers, 0);
}
