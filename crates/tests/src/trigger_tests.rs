use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::common::{case_body, create_case, id_of, seed_master_data, test_app, TestApp};

async fn create_rule(app: &TestApp, body: Value) -> Value {
    let (status, rule) = app.post("/api/trigger-rules", body).await;
    assert_eq!(status, StatusCode::CREATED, "create rule failed: {rule}");
    rule
}

fn dpd_rule(code: &str, threshold: f64, action: &str) -> Value {
    json!({
        "code": code,
        "name": format!("DPD at least {threshold}"),
        "trigger_type": "dpd_threshold",
        "comparison": "gte",
        "threshold": threshold,
        "action": action,
        "priority": 10,
    })
}

#[tokio::test]
async fn rule_codes_are_uppercased() {
    let app = test_app().await;

    let rule = create_rule(&app, dpd_rule("dpd_90", 90.0, "flag_only")).await;
    assert_eq!(rule["code"], "DPD_90");
    assert_eq!(rule["is_active"], true);

    let (status, _) = app
        .post("/api/trigger-rules", dpd_rule("DPD_90", 60.0, "flag_only"))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn rule_shape_is_checked() {
    let app = test_app().await;

    let (status, _) = app
        .post("/api/trigger-rules", dpd_rule("NO_SMS", 90.0, "send_sms"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut unknown = dpd_rule("BAD_TYPE", 90.0, "flag_only");
    unknown["trigger_type"] = json!("moon_phase");
    let (status, _) = app.post("/api/trigger-rules", unknown).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post(
            "/api/trigger-rules",
            json!({
                "code": "STATUS",
                "name": "Status check",
                "trigger_type": "status_equals",
                "action": "flag_only",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_is_checked_against_the_merged_rule() {
    let app = test_app().await;

    let rule = create_rule(&app, dpd_rule("DPD_60", 60.0, "flag_only")).await;
    let uri = format!("/api/trigger-rules/{}", id_of(&rule));

    let (status, _) = app.put(&uri, json!({ "action": "generate_notice" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, updated) = app
        .put(&uri, json!({ "threshold": 75.0, "is_active": false }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["threshold"], 75.0);
    assert_eq!(updated["is_active"], false);

    let (status, _) = app.delete(&uri).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.get(&uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn detect_lists_matching_rules_in_priority_order() {
    let app = test_app().await;
    seed_master_data(&app).await;

    let mut urgent = dpd_rule("DPD_90", 90.0, "flag_only");
    urgent["priority"] = json!(1);
    create_rule(&app, urgent).await;
    create_rule(&app, dpd_rule("DPD_180", 180.0, "flag_only")).await;
    create_rule(
        &app,
        json!({
            "code": "DRAFTS",
            "name": "Still in draft",
            "trigger_type": "status_equals",
            "status_value": "draft",
            "action": "flag_only",
            "priority": 5,
        }),
    )
    .await;

    let case = create_case(&app, "LN7001").await;
    let (status, detected) = app
        .get(&format!("/api/cases/{}/triggers", id_of(&case)))
        .await;
    assert_eq!(status, StatusCode::OK);

    let codes: Vec<&str> = detected
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["rule_code"].as_str().unwrap())
        .collect();
    assert_eq!(codes, vec!["DPD_90", "DRAFTS"]);
    assert_eq!(detected[0]["observed_value"], "120");
}

#[tokio::test]
async fn run_records_flagged_events() {
    let app = test_app().await;
    seed_master_data(&app).await;

    create_rule(&app, dpd_rule("DPD_90", 90.0, "flag_only")).await;
    let overdue = create_case(&app, "LN7002").await;
    let mut current = case_body("LN7003");
    current["dpd"] = json!(10);
    app.post("/api/cases", current).await;

    let (status, summary) = app.post("/api/triggers/run", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["cases_evaluated"], 2);
    assert_eq!(summary["triggers_fired"], 1);
    assert_eq!(summary["actions_succeeded"], 1);
    assert_eq!(summary["actions_failed"], 0);
    assert_eq!(summary["events"][0]["outcome"], "flagged");

    let (_, events) = app
        .get(&format!("/api/cases/{}/trigger-events", id_of(&overdue)))
        .await;
    assert_eq!(events.as_array().unwrap().len(), 1);
    assert_eq!(events[0]["rule_code"], "DPD_90");
}

#[tokio::test]
async fn run_sends_sms_and_reports_failures() {
    let app = test_app().await;
    seed_master_data(&app).await;

    app.post(
        "/api/sms-templates",
        json!({
            "code": "OVERDUE",
            "name": "Overdue",
            "language_code": "en",
            "body": "Dear {{ case.borrower_name }}, your loan is overdue.",
        }),
    )
    .await;

    let mut sms = dpd_rule("SMS_90", 90.0, "send_sms");
    sms["sms_template_code"] = json!("overdue");
    create_rule(&app, sms).await;

    let mut missing = dpd_rule("SMS_MISSING", 90.0, "send_sms");
    missing["sms_template_code"] = json!("NOT_THERE");
    create_rule(&app, missing).await;

    let case = create_case(&app, "LN7004").await;
    let (status, summary) = app
        .post_as(
            "scheduler",
            "/api/triggers/run",
            json!({ "case_ids": [id_of(&case)] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["cases_evaluated"], 1);
    assert_eq!(summary["triggers_fired"], 2);
    assert_eq!(summary["actions_succeeded"], 1);
    assert_eq!(summary["actions_failed"], 1);

    let (_, comms) = app
        .get(&format!("/api/cases/{}/communications", id_of(&case)))
        .await;
    assert_eq!(comms.as_array().unwrap().len(), 1);
    assert_eq!(comms[0]["created_by"], "scheduler");
}

#[tokio::test]
async fn closed_cases_are_not_evaluated() {
    let app = test_app().await;
    seed_master_data(&app).await;

    create_rule(&app, dpd_rule("DPD_90", 90.0, "flag_only")).await;
    let case = create_case(&app, "LN7005").await;
    app.patch(
        &format!("/api/cases/{}/status", id_of(&case)),
        json!({ "status": "withdrawn" }),
    )
    .await;

    let (_, summary) = app
        .post("/api/triggers/run", json!({ "case_ids": [id_of(&case)] }))
        .await;
    assert_eq!(summary["cases_evaluated"], 0);
    assert_eq!(summary["triggers_fired"], 0);
}

async fn text_demand_template(app: &TestApp, code: &str) {
    let (status, template) = app
        .post(
            "/api/notice-templates",
            json!({
                "code": code,
                "name": "Demand notice",
                "notice_type": "demand_notice",
                "language_code": "en",
                "output_format": "text",
                "subject": "Demand notice for {{ case.case_id }}",
                "body": "Dear {{ case.borrower_name }}, pay {{ case.outstanding_amount_display }}.",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "create template failed: {template}");
}

fn notice_rule(code: &str, template_code: &str, priority: i32) -> Value {
    let mut rule = dpd_rule(code, 90.0, "generate_notice");
    rule["notice_template_code"] = json!(template_code);
    rule["priority"] = json!(priority);
    rule
}

#[tokio::test]
async fn run_generates_a_notice_and_advances_the_draft() {
    let app = test_app().await;
    seed_master_data(&app).await;
    text_demand_template(&app, "DEMAND_EN").await;
    create_rule(&app, notice_rule("NOTICE_90", "demand_en", 1)).await;
    let case = create_case(&app, "LN7006").await;

    let (status, summary) = app
        .post_as(
            "scheduler",
            "/api/triggers/run",
            json!({ "case_ids": [id_of(&case)] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["triggers_fired"], 1);
    assert_eq!(summary["actions_succeeded"], 1);
    assert_eq!(summary["events"][0]["outcome"], "succeeded");

    let (_, notices) = app
        .get(&format!("/api/cases/{}/notices", id_of(&case)))
        .await;
    assert_eq!(notices.as_array().unwrap().len(), 1);
    assert_eq!(notices[0]["generated_by"], "scheduler");
    assert!(notices[0]["content"]
        .as_str()
        .unwrap()
        .contains("Dear Ravi Kumar"));

    let (_, fetched) = app.get(&format!("/api/cases/{}", id_of(&case))).await;
    assert_eq!(fetched["status"], "notice_sent");

    let (_, history) = app
        .get(&format!("/api/cases/{}/history", id_of(&case)))
        .await;
    let last = history.as_array().unwrap().last().unwrap();
    assert_eq!(last["to_status"], "notice_sent");
    assert_eq!(last["changed_by"], "scheduler");
}

#[tokio::test]
async fn two_notice_rules_on_one_draft_both_succeed() {
    let app = test_app().await;
    seed_master_data(&app).await;
    text_demand_template(&app, "DEMAND_A").await;
    text_demand_template(&app, "DEMAND_B").await;
    create_rule(&app, notice_rule("NOTICE_A", "DEMAND_A", 1)).await;
    create_rule(&app, notice_rule("NOTICE_B", "DEMAND_B", 2)).await;
    let case = create_case(&app, "LN7007").await;

    let (status, summary) = app
        .post("/api/triggers/run", json!({ "case_ids": [id_of(&case)] }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["triggers_fired"], 2);
    assert_eq!(summary["actions_succeeded"], 2);
    assert_eq!(summary["actions_failed"], 0);

    let (_, notices) = app
        .get(&format!("/api/cases/{}/notices", id_of(&case)))
        .await;
    assert_eq!(notices.as_array().unwrap().len(), 2);

    let (_, fetched) = app.get(&format!("/api/cases/{}", id_of(&case))).await;
    assert_eq!(fetched["status"], "notice_sent");

    let (_, history) = app
        .get(&format!("/api/cases/{}/history", id_of(&case)))
        .await;
    let to: Vec<&str> = history
        .as_array()
        .unwrap()
        .iter()
        .map(|h| h["to_status"].as_str().unwrap())
        .collect();
    assert_eq!(to, vec!["draft", "notice_sent"]);
}
