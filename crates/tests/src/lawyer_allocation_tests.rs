use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::{create_case, create_lawyer, id_of, seed_master_data, test_app};

#[tokio::test]
async fn create_lawyer_normalises_input() {
    let app = test_app().await;
    seed_master_data(&app).await;

    let (status, body) = app
        .post(
            "/api/lawyers",
            json!({
                "name": "Anita Sharma",
                "email": "Anita@Firm.IN",
                "phone": "9123456780",
                "bar_registration_number": "MH/1234/2010",
                "state_codes": ["mh", "MH"],
                "language_codes": ["EN"],
                "max_active_cases": 5,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["email"], "anita@firm.in");
    assert_eq!(body["state_codes"], json!(["MH"]));
    assert_eq!(body["language_codes"], json!(["en"]));
}

#[tokio::test]
async fn lawyer_with_unknown_state_400() {
    let app = test_app().await;
    seed_master_data(&app).await;

    let (status, _) = app
        .post(
            "/api/lawyers",
            json!({
                "name": "Rohit Patil",
                "email": "rohit@firm.in",
                "phone": "9123456780",
                "bar_registration_number": "KA/1/2015",
                "state_codes": ["KA"],
                "max_active_cases": 5,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_lawyer_email_409() {
    let app = test_app().await;
    seed_master_data(&app).await;

    create_lawyer(&app, "dup@firm.in", "MH/1/2010", 5).await;
    let (status, _) = app
        .post(
            "/api/lawyers",
            json!({
                "name": "Someone Else",
                "email": "dup@firm.in",
                "phone": "9123456781",
                "bar_registration_number": "MH/2/2010",
                "state_codes": ["MH"],
                "max_active_cases": 5,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn allocate_then_capacity_409() {
    let app = test_app().await;
    seed_master_data(&app).await;

    let lawyer = create_lawyer(&app, "one@firm.in", "MH/1/2010", 1).await;
    let first = create_case(&app, "LN3001").await;
    let second = create_case(&app, "LN3002").await;

    let (status, allocation) = app
        .post_as(
            "ops.user",
            &format!("/api/cases/{}/allocation", id_of(&first)),
            json!({ "lawyer_id": id_of(&lawyer) }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(allocation["allocated_by"], "ops.user");
    assert_eq!(allocation["is_active"], true);

    let (_, case) = app.get(&format!("/api/cases/{}", id_of(&first))).await;
    assert_eq!(case["assigned_lawyer_id"], lawyer["id"]);

    let (status, _) = app
        .post(
            &format!("/api/cases/{}/allocation", id_of(&second)),
            json!({ "lawyer_id": id_of(&lawyer) }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, workload) = app
        .get(&format!("/api/lawyers/{}/workload", id_of(&lawyer)))
        .await;
    assert_eq!(workload["active_cases"], 1);
    assert_eq!(workload["utilisation_percent"], 100.0);
}

#[tokio::test]
async fn second_allocation_on_same_case_409() {
    let app = test_app().await;
    seed_master_data(&app).await;

    let a = create_lawyer(&app, "a@firm.in", "MH/1/2010", 5).await;
    let b = create_lawyer(&app, "b@firm.in", "MH/2/2010", 5).await;
    let case = create_case(&app, "LN3003").await;
    let uri = format!("/api/cases/{}/allocation", id_of(&case));

    let (status, _) = app.post(&uri, json!({ "lawyer_id": id_of(&a) })).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app.post(&uri, json!({ "lawyer_id": id_of(&b) })).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn reassign_and_deallocate_keep_history() {
    let app = test_app().await;
    seed_master_data(&app).await;

    let a = create_lawyer(&app, "a@firm.in", "MH/1/2010", 5).await;
    let b = create_lawyer(&app, "b@firm.in", "MH/2/2010", 5).await;
    let case = create_case(&app, "LN3004").await;
    let base = format!("/api/cases/{}/allocation", id_of(&case));

    app.post(&base, json!({ "lawyer_id": id_of(&a) })).await;

    let (status, _) = app
        .post(
            &format!("{base}/reassign"),
            json!({ "lawyer_id": id_of(&b), "reason": " " }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, moved) = app
        .post(
            &format!("{base}/reassign"),
            json!({ "lawyer_id": id_of(&b), "reason": "Conflict of interest" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moved["lawyer_id"], b["id"]);

    let (status, ended) = app
        .post(&format!("{base}/deallocate"), json!({ "reason": "Case settled" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ended["is_active"], false);
    assert_eq!(ended["deallocation_reason"], "Case settled");

    let (status, _) = app
        .post(&format!("{base}/deallocate"), json!({ "reason": "Again" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, history) = app
        .get(&format!("/api/cases/{}/allocations", id_of(&case)))
        .await;
    assert_eq!(history.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn withdrawing_a_case_ends_its_allocation() {
    let app = test_app().await;
    seed_master_data(&app).await;

    let lawyer = create_lawyer(&app, "one@firm.in", "MH/1/2010", 3).await;
    let case = create_case(&app, "LN3009").await;
    let (status, _) = app
        .post(
            &format!("/api/cases/{}/allocation", id_of(&case)),
            json!({ "lawyer_id": id_of(&lawyer) }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, withdrawn) = app
        .patch(
            &format!("/api/cases/{}/status", id_of(&case)),
            json!({ "status": "withdrawn", "remarks": "Borrower repaid" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(withdrawn["assigned_lawyer_id"].is_null());

    let (_, history) = app
        .get(&format!("/api/cases/{}/allocations", id_of(&case)))
        .await;
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["is_active"], false);
    assert_eq!(history[0]["deallocation_reason"], "Case withdrawn");

    let (_, workload) = app
        .get(&format!("/api/lawyers/{}/workload", id_of(&lawyer)))
        .await;
    assert_eq!(workload["active_cases"], 0);
}

#[tokio::test]
async fn auto_allocate_prefers_the_lighter_load() {
    let app = test_app().await;
    seed_master_data(&app).await;

    let busy = create_lawyer(&app, "busy@firm.in", "MH/1/2010", 5).await;
    let free = create_lawyer(&app, "free@firm.in", "MH/2/2010", 5).await;

    let warmup = create_case(&app, "LN3005").await;
    app.post(
        &format!("/api/cases/{}/allocation", id_of(&warmup)),
        json!({ "lawyer_id": id_of(&busy) }),
    )
    .await;

    let case = create_case(&app, "LN3006").await;
    let (status, allocation) = app
        .post(
            &format!("/api/cases/{}/allocation/auto", id_of(&case)),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(allocation["lawyer_id"], free["id"]);
}

#[tokio::test]
async fn auto_allocate_without_candidates_409() {
    let app = test_app().await;
    seed_master_data(&app).await;

    let case = create_case(&app, "LN3007").await;
    let (status, _) = app
        .post(
            &format!("/api/cases/{}/allocation/auto", id_of(&case)),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn lawyer_with_allocations_cannot_be_deleted() {
    let app = test_app().await;
    seed_master_data(&app).await;

    let lawyer = create_lawyer(&app, "keep@firm.in", "MH/1/2010", 5).await;
    let case = create_case(&app, "LN3008").await;
    app.post(
        &format!("/api/cases/{}/allocation", id_of(&case)),
        json!({ "lawyer_id": id_of(&lawyer) }),
    )
    .await;

    let (status, _) = app.delete(&format!("/api/lawyers/{}", id_of(&lawyer))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, cases) = app
        .get(&format!("/api/lawyers/{}/cases", id_of(&lawyer)))
        .await;
    assert_eq!(cases.as_array().unwrap().len(), 1);
}
