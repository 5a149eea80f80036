use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::{create_case, id_of, seed_master_data, test_app, TestApp};

async fn reminder_template(app: &TestApp, language: &str, body: &str) -> serde_json::Value {
    let (status, template) = app
        .post(
            "/api/sms-templates",
            json!({
                "code": "dpd_reminder",
                "name": "DPD reminder",
                "language_code": language,
                "body": body,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "create template failed: {template}");
    template
}

#[tokio::test]
async fn template_codes_are_uppercased() {
    let app = test_app().await;
    seed_master_data(&app).await;

    let template = reminder_template(&app, "EN", "Dear {{ case.borrower_name }}").await;
    assert_eq!(template["code"], "DPD_REMINDER");
    assert_eq!(template["language_code"], "en");
}

#[tokio::test]
async fn broken_template_body_400() {
    let app = test_app().await;
    seed_master_data(&app).await;

    let (status, _) = app
        .post(
            "/api/sms-templates",
            json!({
                "code": "BROKEN",
                "name": "Broken",
                "language_code": "en",
                "body": "Dear {{ case.borrower_name",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn template_for_unknown_language_400() {
    let app = test_app().await;
    seed_master_data(&app).await;

    let (status, _) = app
        .post(
            "/api/sms-templates",
            json!({
                "code": "DPD_REMINDER",
                "name": "Reminder",
                "language_code": "ta",
                "body": "Hello",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn preview_reports_length_and_segments() {
    let app = test_app().await;
    seed_master_data(&app).await;

    let template = reminder_template(&app, "en", "Hi {{ name }}, your EMI is due.").await;
    let (status, preview) = app
        .post(
            &format!("/api/sms-templates/{}/preview", id_of(&template)),
            json!({ "variables": { "name": "Ravi" } }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(preview["content"], "Hi Ravi, your EMI is due.");
    assert_eq!(preview["length"], 25);
    assert_eq!(preview["segments"], 1);
}

#[tokio::test]
async fn send_sms_records_a_masked_communication() {
    let app = test_app().await;
    seed_master_data(&app).await;
    reminder_template(
        &app,
        "en",
        "Dear {{ case.borrower_name }}, {{ case.dpd }} days overdue on {{ case.loan_account_number }}.",
    )
    .await;
    let case = create_case(&app, "LN5001").await;

    let (status, sent) = app
        .post_as(
            "collections.bot",
            &format!("/api/cases/{}/communications/sms", id_of(&case)),
            json!({ "template_code": "dpd_reminder" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(sent["status"], "sent");
    assert_eq!(sent["channel"], "sms");
    assert_eq!(sent["recipient"], "XXXXXX3210");
    assert_eq!(sent["created_by"], "collections.bot");
    assert_eq!(sent["content"], "Dear Ravi Kumar, 120 days overdue on LN5001.");
    assert!(sent["provider_reference"].as_str().unwrap().starts_with("stub-"));

    let (_, list) = app
        .get(&format!("/api/cases/{}/communications", id_of(&case)))
        .await;
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn send_sms_unknown_template_404() {
    let app = test_app().await;
    seed_master_data(&app).await;
    let case = create_case(&app, "LN5002").await;

    let (status, _) = app
        .post(
            &format!("/api/cases/{}/communications/sms", id_of(&case)),
            json!({ "template_code": "NOPE" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn case_language_falls_back_to_english() {
    let app = test_app().await;
    seed_master_data(&app).await;
    app.post("/api/languages", json!({ "code": "mr", "name": "Marathi" }))
        .await;
    reminder_template(&app, "en", "English reminder").await;

    let mut body = crate::common::case_body("LN5003");
    body["language_code"] = json!("mr");
    let (status, case) = app.post("/api/cases", body).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, sent) = app
        .post(
            &format!("/api/cases/{}/communications/sms", id_of(&case)),
            json!({ "template_code": "DPD_REMINDER" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(sent["language_code"], "en");
    assert_eq!(sent["content"], "English reminder");
}

#[tokio::test]
async fn send_sms_with_unresolved_variable_422() {
    let app = test_app().await;
    seed_master_data(&app).await;
    reminder_template(&app, "en", "Use code {{ extra.promo }} to pay today.").await;
    let case = create_case(&app, "LN5004").await;

    let (status, body) = app
        .post(
            &format!("/api/cases/{}/communications/sms", id_of(&case)),
            json!({ "template_code": "DPD_REMINDER" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["field_errors"]["template"].is_string());

    let (_, list) = app
        .get(&format!("/api/cases/{}/communications", id_of(&case)))
        .await;
    assert_eq!(list.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn send_sms_over_length_limit_422() {
    let app = test_app().await;
    seed_master_data(&app).await;
    reminder_template(&app, "en", "{{ extra.filler }}").await;
    let case = create_case(&app, "LN5005").await;

    let (status, body) = app
        .post(
            &format!("/api/cases/{}/communications/sms", id_of(&case)),
            json!({
                "template_code": "DPD_REMINDER",
                "extra": { "filler": "x".repeat(500) },
            }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["field_errors"]["content"]
        .as_str()
        .unwrap()
        .contains("limit is 480"));

    let (_, list) = app
        .get(&format!("/api/cases/{}/communications", id_of(&case)))
        .await;
    assert_eq!(list.as_array().unwrap().len(), 0);
}
