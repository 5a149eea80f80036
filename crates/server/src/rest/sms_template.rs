use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{Map, Value};
use sqlx::{Pool, Postgres};

use shared_types::{
    is_blank, sms_segments, ActiveFilter, AppError, CreateSmsTemplateRequest, SmsPreviewRequest,
    SmsPreviewResponse, SmsTemplateResponse, UpdateSmsTemplateRequest,
};

use super::parse_uuid;
use crate::services::communication::render_sms;
use crate::services::template;

/// A stored SMS body must be non-empty, parse, and fit the length limit.
fn check_body(body: &str, max_chars: usize) -> Result<(), AppError> {
    if is_blank(body) {
        return Err(AppError::bad_request("body must not be empty"));
    }
    template::check_syntax(body)
        .map_err(|e| AppError::bad_request(format!("Invalid SMS template body: {}", e)))?;
    let chars = body.chars().count();
    if chars > max_chars {
        return Err(AppError::bad_request(format!(
            "body is {} characters, limit is {}",
            chars, max_chars
        )));
    }
    Ok(())
}

/// POST /api/sms-templates
#[utoipa::path(
    post,
    path = "/api/sms-templates",
    request_body = CreateSmsTemplateRequest,
    responses(
        (status = 201, description = "SMS template created", body = SmsTemplateResponse),
        (status = 400, description = "Unknown language or invalid body", body = AppError),
        (status = 409, description = "Variant already exists for this language", body = AppError)
    ),
    tag = "sms-templates"
)]
pub async fn create_sms_template(
    State(pool): State<Pool<Postgres>>,
    Json(mut body): Json<CreateSmsTemplateRequest>,
) -> Result<(StatusCode, Json<SmsTemplateResponse>), AppError> {
    body.code = body.code.trim().to_uppercase();
    body.language_code = body.language_code.trim().to_lowercase();
    if is_blank(&body.code) {
        return Err(AppError::bad_request("code must not be empty"));
    }
    if is_blank(&body.name) {
        return Err(AppError::field("name", "name must not be empty"));
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
    check_body(&body.body, crate::config::notice_settings().sms_max_chars)?;

    let template = crate::repo::sms_template::create(&pool, &body).await?;
    Ok((StatusCode::CREATED, Json(SmsTemplateResponse::from(template))))
}

/// GET /api/sms-templates
#[utoipa::path(
    get,
    path = "/api/sms-templates",
    params(ActiveFilter),
    responses(
        (status = 200, description = "SMS templates", body = Vec<SmsTemplateResponse>)
    ),
    tag = "sms-templates"
)]
pub async fn list_sms_templates(
    State(pool): State<Pool<Postgres>>,
    Query(filter): Query<ActiveFilter>,
) -> Result<Json<Vec<SmsTemplateResponse>>, AppError> {
    let rows = crate::repo::sms_template::list(&pool, filter.active).await?;
    Ok(Json(rows.into_iter().map(SmsTemplateResponse::from).collect()))
}

/// GET /api/sms-templates/{id}
#[utoipa::path(
    get,
    path = "/api/sms-templates/{id}",
    params(("id" = String, Path, description = "SMS template UUID")),
    responses(
        (status = 200, description = "SMS template found", body = SmsTemplateResponse),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "sms-templates"
)]
pub async fn get_sms_template(
    State(pool): State<Pool<Postgres>>,
    Path(id): Path<String>,
) -> Result<Json<SmsTemplateResponse>, AppError> {
    let uuid = parse_uuid(&id)?;
    let template = crate::repo::sms_template::find_by_id(&pool, uuid)
        .await?
        .ok_or_else(|| AppError::not_found(format!("SMS template {} not found", id)))?;
    Ok(Json(SmsTemplateResponse::from(template)))
}

/// PUT /api/sms-templates/{id}
#[utoipa::path(
    put,
    path = "/api/sms-templates/{id}",
    request_body = UpdateSmsTemplateRequest,
    params(("id" = String, Path, description = "SMS template UUID")),
    responses(
        (status = 200, description = "SMS template updated", body = SmsTemplateResponse),
        (status = 400, description = "Invalid body", body = AppError),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "sms-templates"
)]
pub async fn update_sms_template(
    State(pool): State<Pool<Postgres>>,
    Path(id): Path<String>,
    Json(body): Json<UpdateSmsTemplateRequest>,
) -> Result<Json<SmsTemplateResponse>, AppError> {
    let uuid = parse_uuid(&id)?;
    if body.name.as_deref().is_some_and(is_blank) {
        return Err(AppError::field("name", "name must not be empty"));
    }
    if let Some(text) = body.body.as_deref() {
        check_body(text, crate::config::notice_settings().sms_max_chars)?;
    }

    let template = crate::repo::sms_template::update(&pool, uuid, &body)
        .await?
        .ok_or_else(|| AppError::not_found(format!("SMS template {} not found", id)))?;
    Ok(Json(SmsTemplateResponse::from(template)))
}

/// DELETE /api/sms-templates/{id}
#[utoipa::path(
    delete,
    path = "/api/sms-templates/{id}",
    params(("id" = String, Path, description = "SMS template UUID")),
    responses(
        (status = 204, description = "SMS template deleted"),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "sms-templates"
)]
pub async fn delete_sms_template(
    State(pool): State<Pool<Postgres>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let uuid = parse_uuid(&id)?;
    if crate::repo::sms_template::soft_delete(&pool, uuid).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(format!("SMS template {} not found", id)))
    }
}

/// POST /api/sms-templates/{id}/preview
#[utoipa::path(
    post,
    path = "/api/sms-templates/{id}/preview",
    request_body = SmsPreviewRequest,
    params(("id" = String, Path, description = "SMS template UUID")),
    responses(
        (status = 200, description = "Rendered message", body = SmsPreviewResponse),
        (status = 404, description = "Not found", body = AppError),
        (status = 422, description = "Undefined variable or message too long", body = AppError)
    ),
    tag = "sms-templates"
)]
pub async fn preview_sms_template(
    State(pool): State<Pool<Postgres>>,
    Path(id): Path<String>,
    Json(body): Json<SmsPreviewRequest>,
) -> Result<Json<SmsPreviewResponse>, AppError> {
    let uuid = parse_uuid(&id)?;
    let template = crate::repo::sms_template::find_by_id(&pool, uuid)
        .await?
        .ok_or_else(|| AppError::not_found(format!("SMS template {} not found", id)))?;

    let variables = match body.variables {
        Value::Null => Value::Object(Map::new()),
        v @ Value::Object(_) => v,
        _ => return Err(AppError::bad_request("variables must be a JSON object")),
    };
    let content = render_sms(
        &template.body,
        &variables,
        crate::config::notice_settings().sms_max_chars,
    )?;
    let length = content.chars().count();

    Ok(Json(SmsPreviewResponse {
        content,
        length,
        segments: sms_segments(length),
    }))
}
