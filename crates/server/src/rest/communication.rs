use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sqlx::{Pool, Postgres};

use shared_types::{is_blank, AppError, CommunicationResponse, SendSmsRequest};

use super::load_case;
use crate::actor::Actor;
use crate::db::AppState;

/// POST /api/cases/{id}/communications/sms
///
/// A gateway failure still returns 201 with `status = "failed"`.
#[utoipa::path(
    post,
    path = "/api/cases/{id}/communications/sms",
    request_body = SendSmsRequest,
    params(
        ("id" = String, Path, description = "Case UUID"),
        ("X-User-Id" = Option<String>, Header, description = "Recorded as created_by")
    ),
    responses(
        (status = 201, description = "Message recorded", body = CommunicationResponse),
        (status = 400, description = "Bad variables or rendered text too long", body = AppError),
        (status = 404, description = "Case or template not found", body = AppError)
    ),
    tag = "communications"
)]
pub async fn send_case_sms(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<String>,
    Json(body): Json<SendSmsRequest>,
) -> Result<(StatusCode, Json<CommunicationResponse>), AppError> {
    let code = body.template_code.trim().to_uppercase();
    if is_blank(&code) {
        return Err(AppError::bad_request("template_code must not be empty"));
    }

    let case = load_case(&state.pool, &id).await?;
    let sent =
        crate::services::communication::send_sms(&state, &case, &code, body.extra, &actor).await?;
    Ok((StatusCode::CREATED, Json(CommunicationResponse::from(sent))))
}

/// GET /api/cases/{id}/communications
#[utoipa::path(
    get,
    path = "/api/cases/{id}/communications",
    params(("id" = String, Path, description = "Case UUID")),
    responses(
        (status = 200, description = "Messages sent for the case, newest first", body = Vec<CommunicationResponse>),
        (status = 404, description = "Case not found", body = AppError)
    ),
    tag = "communications"
)]
pub async fn list_communications(
    State(pool): State<Pool<Postgres>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<CommunicationResponse>>, AppError> {
    let case = load_case(&pool, &id).await?;
    let rows = crate::repo::communication::list_for_case(&pool, case.id).await?;
    Ok(Json(rows.into_iter().map(CommunicationResponse::from).collect()))
}
