use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use sqlx::{Pool, Postgres};

use shared_types::{AppError, CaseDocument, CaseDocumentResponse, UploadDocumentRequest};

use super::{load_case, parse_uuid};
use crate::actor::Actor;
use crate::db::AppState;

/// `Content-Disposition` value for a stored file name.
fn content_disposition(file_name: &str) -> String {
    let cleaned: String = file_name
        .chars()
        .filter(|c| !c.is_control())
        .collect::<String>()
        .replace('"', "\\\"");
    format!("attachment; filename=\"{}\"", cleaned)
}

/// Read a document's bytes and wrap them in a download response.
pub(crate) async fn file_response(
    state: &AppState,
    doc: CaseDocument,
) -> Result<impl IntoResponse, AppError> {
    let bytes = crate::services::documents::read_content(state, &doc).await?;
    let disposition = content_disposition(&doc.file_name);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, doc.content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}

async fn find_document(pool: &Pool<Postgres>, id: &str) -> Result<CaseDocument, AppError> {
    let uuid = parse_uuid(id)?;
    crate::repo::document::find_by_id(pool, uuid)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Document {} not found", id)))
}

/// POST /api/cases/{id}/documents
#[utoipa::path(
    post,
    path = "/api/cases/{id}/documents",
    request_body = UploadDocumentRequest,
    params(
        ("id" = String, Path, description = "Case UUID"),
        ("X-User-Id" = Option<String>, Header, description = "Recorded as uploaded_by")
    ),
    responses(
        (status = 201, description = "Document stored", body = CaseDocumentResponse),
        (status = 400, description = "Bad type, content type or base64", body = AppError),
        (status = 404, description = "Case not found", body = AppError),
        (status = 409, description = "Identical content already attached", body = AppError),
        (status = 422, description = "Empty, oversized or badly named file", body = AppError),
        (status = 502, description = "Object store failure", body = AppError)
    ),
    tag = "documents"
)]
pub async fn upload_document(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<String>,
    Json(body): Json<UploadDocumentRequest>,
) -> Result<(StatusCode, Json<CaseDocumentResponse>), AppError> {
    let case = load_case(&state.pool, &id).await?;
    let doc = crate::services::documents::upload(
        &state,
        crate::config::document_settings(),
        case.id,
        body,
        actor.as_str(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(CaseDocumentResponse::from(doc))))
}

/// GET /api/cases/{id}/documents
#[utoipa::path(
    get,
    path = "/api/cases/{id}/documents",
    params(("id" = String, Path, description = "Case UUID")),
    responses(
        (status = 200, description = "Documents attached to the case", body = Vec<CaseDocumentResponse>),
        (status = 404, description = "Case not found", body = AppError)
    ),
    tag = "documents"
)]
pub async fn list_documents(
    State(pool): State<Pool<Postgres>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<CaseDocumentResponse>>, AppError> {
    let case = load_case(&pool, &id).await?;
    let rows = crate::repo::document::list_for_case(&pool, case.id).await?;
    Ok(Json(rows.into_iter().map(CaseDocumentResponse::from).collect()))
}

/// GET /api/documents/{id}
#[utoipa::path(
    get,
    path = "/api/documents/{id}",
    params(("id" = String, Path, description = "Document UUID")),
    responses(
        (status = 200, description = "Document metadata", body = CaseDocumentResponse),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "documents"
)]
pub async fn get_document(
    State(pool): State<Pool<Postgres>>,
    Path(id): Path<String>,
) -> Result<Json<CaseDocumentResponse>, AppError> {
    let doc = find_document(&pool, &id).await?;
    Ok(Json(CaseDocumentResponse::from(doc)))
}

/// GET /api/documents/{id}/download
#[utoipa::path(
    get,
    path = "/api/documents/{id}/download",
    params(("id" = String, Path, description = "Document UUID")),
    responses(
        (status = 200, description = "File bytes"),
        (status = 404, description = "Not found", body = AppError),
        (status = 502, description = "Object store failure", body = AppError)
    ),
    tag = "documents"
)]
pub async fn download_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let doc = find_document(&state.pool, &id).await?;
    file_response(&state, doc).await
}

/// DELETE /api/documents/{id}
///
/// Soft delete; the stored object is kept.
#[utoipa::path(
    delete,
    path = "/api/documents/{id}",
    params(("id" = String, Path, description = "Document UUID")),
    responses(
        (status = 204, description = "Document deleted"),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "documents"
)]
pub async fn delete_document(
    State(pool): State<Pool<Postgres>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let uuid = parse_uuid(&id)?;
    if crate::repo::document::soft_delete(&pool, uuid).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(format!("Document {} not found", id)))
    }
}
