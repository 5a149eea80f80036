use axum::http::{header, StatusCode};
use base64::Engine;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::{create_case, id_of, seed_master_data, test_app};

fn encode(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

#[tokio::test]
async fn upload_then_download_round_trips() {
    let app = test_app().await;
    seed_master_data(&app).await;
    let case = create_case(&app, "LN4001").await;

    let (status, doc) = app
        .post_as(
            "clerk.1",
            &format!("/api/cases/{}/documents", id_of(&case)),
            json!({
                "document_type": "vakalatnama",
                "file_name": "vakalat.txt",
                "content_type": "text/plain",
                "content": encode(b"signed vakalatnama"),
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(doc["uploaded_by"], "clerk.1");
    assert_eq!(doc["size_bytes"], 18);

    let (status, headers, bytes) = app
        .get_raw(&format!("/api/documents/{}/download", id_of(&doc)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, b"signed vakalatnama");
    assert_eq!(headers[header::CONTENT_TYPE], "text/plain");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"vakalat.txt\""
    );

    let (_, list) = app
        .get(&format!("/api/cases/{}/documents", id_of(&case)))
        .await;
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn download_of_a_lost_file_404() {
    let app = test_app().await;
    seed_master_data(&app).await;
    let case = create_case(&app, "LN4010").await;

    let (status, doc) = app
        .post(
            &format!("/api/cases/{}/documents", id_of(&case)),
            json!({
                "document_type": "vakalatnama",
                "file_name": "vakalat.txt",
                "content_type": "text/plain",
                "content": encode(b"signed vakalatnama"),
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    for entry in std::fs::read_dir(app.storage_path()).unwrap() {
        std::fs::remove_dir_all(entry.unwrap().path()).unwrap();
    }

    let (status, body) = app
        .get(&format!("/api/documents/{}/download", id_of(&doc)))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["message"].as_str().unwrap().contains("missing"));
}

#[tokio::test]
async fn identical_content_409() {
    let app = test_app().await;
    seed_master_data(&app).await;
    let case = create_case(&app, "LN4002").await;
    let uri = format!("/api/cases/{}/documents", id_of(&case));
    let body = json!({
        "document_type": "evidence",
        "file_name": "statement.txt",
        "content_type": "text/plain",
        "content": encode(b"bank statement"),
    });

    let (status, _) = app.post(&uri, body.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app.post(&uri, body).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn rejected_uploads() {
    let app = test_app().await;
    seed_master_data(&app).await;
    let case = create_case(&app, "LN4003").await;
    let uri = format!("/api/cases/{}/documents", id_of(&case));

    let (status, _) = app
        .post(
            &uri,
            json!({
                "document_type": "summons",
                "file_name": "a.txt",
                "content_type": "text/plain",
                "content": encode(b"x"),
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post(
            &uri,
            json!({
                "document_type": "other",
                "file_name": "a.exe",
                "content_type": "application/x-msdownload",
                "content": encode(b"MZ"),
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post(
            &uri,
            json!({
                "document_type": "other",
                "file_name": "a.txt",
                "content_type": "text/plain",
                "content": "%%% not base64 %%%",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post(
            &uri,
            json!({
                "document_type": "other",
                "file_name": "../escape.txt",
                "content_type": "text/plain",
                "content": encode(b"x"),
            }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn upload_to_missing_case_404() {
    let app = test_app().await;

    let (status, _) = app
        .post(
            &format!("/api/cases/{}/documents", uuid::Uuid::new_v4()),
            json!({
                "document_type": "other",
                "file_name": "a.txt",
                "content_type": "text/plain",
                "content": encode(b"x"),
            }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleted_document_404() {
    let app = test_app().await;
    seed_master_data(&app).await;
    let case = create_case(&app, "LN4004").await;

    let (_, doc) = app
        .post(
            &format!("/api/cases/{}/documents", id_of(&case)),
            json!({
                "document_type": "other",
                "file_name": "note.txt",
                "content_type": "text/plain",
                "content": encode(b"note"),
            }),
        )
        .await;

    let uri = format!("/api/documents/{}", id_of(&doc));
    let (status, _) = app.delete(&uri).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.get(&uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
