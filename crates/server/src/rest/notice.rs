use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use sqlx::{Pool, Postgres};

use shared_types::{
    is_blank, is_valid_notice_type, is_valid_output_format, ActiveFilter, AppError,
    CreateNoticeTemplateRequest, GenerateNoticeRequest, GeneratedNoticeResponse,
    NoticePreviewRequest, NoticePreviewResponse, NoticeTemplateResponse,
    UpdateNoticeTemplateRequest, NOTICE_TYPES, OUTPUT_FORMATS,
};

use super::{load_case, parse_uuid};
use crate::actor::Actor;
use crate::db::AppState;
use crate::error_convert::ValidateRequest;
use crate::services::template;

/// Subject and body must both compile.
fn check_sources(subject: Option<&str>, body: Option<&str>) -> Result<(), AppError> {
    for (part, source) in [("subject", subject), ("body", body)] {
        if let Some(source) = source {
            template::check_syntax(source).map_err(|e| {
                AppError::bad_request(format!("Template {} does not compile: {}", part, e))
            })?;
        }
    }
    Ok(())
}

fn clean_required_fields(fields: Vec<String>) -> Vec<String> {
    fields
        .into_iter()
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
        .collect()
}

// ── Templates ───────────────────────────────────────────────────────

/// POST /api/notice-templates
#[utoipa::path(
    post,
    path = "/api/notice-templates",
    request_body = CreateNoticeTemplateRequest,
    params(("X-User-Id" = Option<String>, Header, description = "Acting user for audit columns")),
    responses(
        (status = 201, description = "Template created at version 1", body = NoticeTemplateResponse),
        (status = 400, description = "Invalid type, format, language or template syntax", body = AppError),
        (status = 409, description = "Duplicate code", body = AppError),
        (status = 422, description = "Field validation failure", body = AppError)
    ),
    tag = "notices"
)]
pub async fn create_notice_template(
    State(pool): State<Pool<Postgres>>,
    actor: Actor,
    Json(mut body): Json<CreateNoticeTemplateRequest>,
) -> Result<(StatusCode, Json<NoticeTemplateResponse>), AppError> {
    body.code = body.code.trim().to_uppercase();
    body.language_code = body.language_code.trim().to_lowercase();
    if is_blank(&body.code) {
        return Err(AppError::bad_request("code must not be empty"));
    }
    body.validate_request()?;
    if !is_valid_notice_type(&body.notice_type) {
        return Err(AppError::invalid_choice("notice_type", &body.notice_type, NOTICE_TYPES));
    }
    if !is_valid_output_format(&body.output_format) {
        return Err(AppError::invalid_choice(
            "output_format",
            &body.output_format,
            OUTPUT_FORMATS,
        ));
    }
    if crate::repo::language::find_by_code(&pool, &body.language_code)
        .await?
        .is_none()
    {
        return Err(AppError::bad_request(format!(
            "Unknown language code: {}",
            body.language_code
        )));
    }
    check_sources(Some(&body.subject), Some(&body.body))?;
    body.required_fields = clean_required_fields(body.required_fields);

    let template = crate::repo::notice_template::create(&pool, &body, actor.as_str()).await?;
    tracing::info!(code = %template.code, "notice template created");
    Ok((StatusCode::CREATED, Json(NoticeTemplateResponse::from(template))))
}

/// GET /api/notice-templates
#[utoipa::path(
    get,
    path = "/api/notice-templates",
    params(ActiveFilter),
    responses(
        (status = 200, description = "Notice templates", body = Vec<NoticeTemplateResponse>)
    ),
    tag = "notices"
)]
pub async fn list_notice_templates(
    State(pool): State<Pool<Postgres>>,
    Query(filter): Query<ActiveFilter>,
) -> Result<Json<Vec<NoticeTemplateResponse>>, AppError> {
    let rows = crate::repo::notice_template::list(&pool, filter.active).await?;
    Ok(Json(rows.into_iter().map(NoticeTemplateResponse::from).collect()))
}

/// GET /api/notice-templates/{id}
#[utoipa::path(
    get,
    path = "/api/notice-templates/{id}",
    params(("id" = String, Path, description = "Template UUID")),
    responses(
        (status = 200, description = "Template found", body = NoticeTemplateResponse),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "notices"
)]
pub async fn get_notice_template(
    State(pool): State<Pool<Postgres>>,
    Path(id): Path<String>,
) -> Result<Json<NoticeTemplateResponse>, AppError> {
    let uuid = parse_uuid(&id)?;
    let template = crate::repo::notice_template::find_by_id(&pool, uuid)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Notice template {} not found", id)))?;
    Ok(Json(NoticeTemplateResponse::from(template)))
}

/// PUT /api/notice-templates/{id}
#[utoipa::path(
    put,
    path = "/api/notice-templates/{id}",
    request_body = UpdateNoticeTemplateRequest,
    params(
        ("id" = String, Path, description = "Template UUID"),
        ("X-User-Id" = Option<String>, Header, description = "Acting user for audit columns")
    ),
    responses(
        (status = 200, description = "Template updated; version bumped on content change", body = NoticeTemplateResponse),
        (status = 400, description = "Invalid format or template syntax", body = AppError),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "notices"
)]
pub async fn update_notice_template(
    State(pool): State<Pool<Postgres>>,
    actor: Actor,
    Path(id): Path<String>,
    Json(mut body): Json<UpdateNoticeTemplateRequest>,
) -> Result<Json<NoticeTemplateResponse>, AppError> {
    let uuid = parse_uuid(&id)?;

    if body.name.as_deref().is_some_and(is_blank) {
        return Err(AppError::field("name", "name must not be empty"));
    }
    if body.body.as_deref().is_some_and(is_blank) {
        return Err(AppError::field("body", "body must not be empty"));
    }
    if let Some(format) = body.output_format.as_deref() {
        if !is_valid_output_format(format) {
            return Err(AppError::invalid_choice("output_format", format, OUTPUT_FORMATS));
        }
    }
    check_sources(body.subject.as_deref(), body.body.as_deref())?;
    body.required_fields = body.required_fields.map(clean_required_fields);

    let template = crate::repo::notice_template::update(&pool, uuid, &body, actor.as_str())
        .await?
        .ok_or_else(|| AppError::not_found(format!("Notice template {} not found", id)))?;
    Ok(Json(NoticeTemplateResponse::from(template)))
}

/// DELETE /api/notice-templates/{id}
#[utoipa::path(
    delete,
    path = "/api/notice-templates/{id}",
    params(("id" = String, Path, description = "Template UUID")),
    responses(
        (status = 204, description = "Template deleted"),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "notices"
)]
pub async fn delete_notice_template(
    State(pool): State<Pool<Postgres>>,
    actor: Actor,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let uuid = parse_uuid(&id)?;
    if crate::repo::notice_template::soft_delete(&pool, uuid, actor.as_str()).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(format!("Notice template {} not found", id)))
    }
}

/// POST /api/notice-templates/{id}/preview
///
/// Nothing is persisted. PDF templates preview as their text body.
#[utoipa::path(
    post,
    path = "/api/notice-templates/{id}/preview",
    request_body = NoticePreviewRequest,
    params(("id" = String, Path, description = "Template UUID")),
    responses(
        (status = 200, description = "Rendered notice", body = NoticePreviewResponse),
        (status = 400, description = "Neither case_id nor sample supplied", body = AppError),
        (status = 404, description = "Template or case not found", body = AppError),
        (status = 422, description = "Compliance violations", body = AppError)
    ),
    tag = "notices"
)]
pub async fn preview_notice(
    State(pool): State<Pool<Postgres>>,
    Path(id): Path<String>,
    Json(body): Json<NoticePreviewRequest>,
) -> Result<Json<NoticePreviewResponse>, AppError> {
    let uuid = parse_uuid(&id)?;
    let template = crate::repo::notice_template::find_by_id(&pool, uuid)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Notice template {} not found", id)))?;

    let preview =
        crate::services::notice::preview(&pool, crate::config::notice_settings(), &template, body)
            .await?;
    Ok(Json(preview))
}

// ── Generated notices ───────────────────────────────────────────────

/// POST /api/cases/{id}/notices
#[utoipa::path(
    post,
    path = "/api/cases/{id}/notices",
    request_body = GenerateNoticeRequest,
    params(
        ("id" = String, Path, description = "Case UUID"),
        ("X-User-Id" = Option<String>, Header, description = "Recorded as generated_by")
    ),
    responses(
        (status = 201, description = "Notice generated", body = GeneratedNoticeResponse),
        (status = 400, description = "Template syntax error", body = AppError),
        (status = 404, description = "Case or template not found", body = AppError),
        (status = 422, description = "Compliance violations", body = AppError)
    ),
    tag = "notices"
)]
pub async fn generate_notice(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<String>,
    Json(mut body): Json<GenerateNoticeRequest>,
) -> Result<(StatusCode, Json<GeneratedNoticeResponse>), AppError> {
    let case = load_case(&state.pool, &id).await?;
    body.template_code = body.template_code.trim().to_uppercase();

    let notice = crate::services::notice::generate(
        &state,
        crate::config::notice_settings(),
        &case,
        body,
        &actor,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(GeneratedNoticeResponse::from(notice))))
}

/// GET /api/cases/{id}/notices
#[utoipa::path(
    get,
    path = "/api/cases/{id}/notices",
    params(("id" = String, Path, description = "Case UUID")),
    responses(
        (status = 200, description = "Notices issued for the case, newest first", body = Vec<GeneratedNoticeResponse>),
        (status = 404, description = "Case not found", body = AppError)
    ),
    tag = "notices"
)]
pub async fn list_notices(
    State(pool): State<Pool<Postgres>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<GeneratedNoticeResponse>>, AppError> {
    let case = load_case(&pool, &id).await?;
    let rows = crate::repo::generated_notice::list_for_case(&pool, case.id).await?;
    Ok(Json(rows.into_iter().map(GeneratedNoticeResponse::from).collect()))
}

/// GET /api/notices/{id}
#[utoipa::path(
    get,
    path = "/api/notices/{id}",
    params(("id" = String, Path, description = "Notice UUID")),
    responses(
        (status = 200, description = "Generated notice", body = GeneratedNoticeResponse),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "notices"
)]
pub async fn get_notice(
    State(pool): State<Pool<Postgres>>,
    Path(id): Path<String>,
) -> Result<Json<GeneratedNoticeResponse>, AppError> {
    let uuid = parse_uuid(&id)?;
    let notice = crate::repo::generated_notice::find_by_id(&pool, uuid)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Notice {} not found", id)))?;
    Ok(Json(GeneratedNoticeResponse::from(notice)))
}

/// GET /api/notices/{id}/download
#[utoipa::path(
    get,
    path = "/api/notices/{id}/download",
    params(("id" = String, Path, description = "Notice UUID")),
    responses(
        (status = 200, description = "PDF bytes"),
        (status = 404, description = "Notice not found or not a PDF notice", body = AppError)
    ),
    tag = "notices"
)]
pub async fn download_notice(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let uuid = parse_uuid(&id)?;
    let notice = crate::repo::generated_notice::find_by_id(&state.pool, uuid)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Notice {} not found", id)))?;

    let document_id = notice
        .document_id
        .ok_or_else(|| AppError::not_found(format!("Notice {} has no PDF document", id)))?;
    let doc = crate::repo::document::find_by_id(&state.pool, document_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Document {} not found", document_id)))?;

    super::document::file_response(&state, doc).await
}
