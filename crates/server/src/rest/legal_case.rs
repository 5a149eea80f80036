use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sqlx::{Pool, Postgres};

use shared_types::{
    is_valid_case_status, is_valid_case_type, normalize_pagination, AddHearingRequest, AppError,
    CaseHearingResponse, CaseSearchParams, CaseStatistics, CaseStatusHistoryResponse,
    CreateLegalCaseRequest, LegalCaseResponse, PaginatedResponse, UpdateCaseStatusRequest,
    UpdateLegalCaseRequest, CASE_STATUSES, CASE_TYPES,
};

use super::{load_case, parse_uuid};
use crate::actor::Actor;

/// POST /api/cases
#[utoipa::path(
    post,
    path = "/api/cases",
    request_body = CreateLegalCaseRequest,
    params(("X-User-Id" = Option<String>, Header, description = "Acting user for audit columns")),
    responses(
        (status = 201, description = "Case created in draft", body = LegalCaseResponse),
        (status = 400, description = "Invalid enum value or unknown master data", body = AppError),
        (status = 409, description = "Open case already exists for the loan account", body = AppError),
        (status = 422, description = "Field or validation rule failure", body = AppError)
    ),
    tag = "cases"
)]
pub async fn create_case(
    State(pool): State<Pool<Postgres>>,
    actor: Actor,
    Json(body): Json<CreateLegalCaseRequest>,
) -> Result<(StatusCode, Json<LegalCaseResponse>), AppError> {
    let case = crate::services::cases::create_case(&pool, body, actor.as_str()).await?;
    Ok((StatusCode::CREATED, Json(LegalCaseResponse::from(case))))
}

/// GET /api/cases
#[utoipa::path(
    get,
    path = "/api/cases",
    params(CaseSearchParams),
    responses(
        (status = 200, description = "Paginated cases, newest first", body = PaginatedResponse<LegalCaseResponse>),
        (status = 400, description = "Invalid filter value", body = AppError)
    ),
    tag = "cases"
)]
pub async fn search_cases(
    State(pool): State<Pool<Postgres>>,
    Query(mut params): Query<CaseSearchParams>,
) -> Result<Json<PaginatedResponse<LegalCaseResponse>>, AppError> {
    if let Some(status) = params.status.as_deref() {
        if !is_valid_case_status(status) {
            return Err(AppError::invalid_choice("status", status, CASE_STATUSES));
        }
    }
    if let Some(case_type) = params.case_type.as_deref() {
        if !is_valid_case_type(case_type) {
            return Err(AppError::invalid_choice("case_type", case_type, CASE_TYPES));
        }
    }
    params.state_code = params.state_code.map(|s| s.trim().to_uppercase());
    params.product_code = params.product_code.map(|s| s.trim().to_uppercase());

    let (page, limit) = normalize_pagination(params.page, params.limit);
    let offset = (page - 1) * limit;

    let (rows, total) = crate::repo::legal_case::search(&pool, &params, offset, limit).await?;
    let items = rows.into_iter().map(LegalCaseResponse::from).collect();
    Ok(Json(PaginatedResponse::new(items, page, limit, total)))
}

/// GET /api/cases/statistics
#[utoipa::path(
    get,
    path = "/api/cases/statistics",
    responses(
        (status = 200, description = "Counts by status and case type", body = CaseStatistics)
    ),
    tag = "cases"
)]
pub async fn case_statistics(
    State(pool): State<Pool<Postgres>>,
) -> Result<Json<CaseStatistics>, AppError> {
    let stats = crate::repo::legal_case::statistics(&pool).await?;
    Ok(Json(stats))
}

/// GET /api/cases/by-case-id/{case_id}
#[utoipa::path(
    get,
    path = "/api/cases/by-case-id/{case_id}",
    params(("case_id" = String, Path, description = "Human-readable case id, e.g. LC-20261018-0001")),
    responses(
        (status = 200, description = "Case found", body = LegalCaseResponse),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "cases"
)]
pub async fn get_case_by_case_id(
    State(pool): State<Pool<Postgres>>,
    Path(case_id): Path<String>,
) -> Result<Json<LegalCaseResponse>, AppError> {
    let case = crate::repo::legal_case::find_by_case_id(&pool, case_id.trim())
        .await?
        .ok_or_else(|| AppError::not_found(format!("Legal case {} not found", case_id)))?;
    Ok(Json(LegalCaseResponse::from(case)))
}

/// GET /api/cases/{id}
#[utoipa::path(
    get,
    path = "/api/cases/{id}",
    params(("id" = String, Path, description = "Case UUID")),
    responses(
        (status = 200, description = "Case found", body = LegalCaseResponse),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "cases"
)]
pub async fn get_case(
    State(pool): State<Pool<Postgres>>,
    Path(id): Path<String>,
) -> Result<Json<LegalCaseResponse>, AppError> {
    let case = load_case(&pool, &id).await?;
    Ok(Json(LegalCaseResponse::from(case)))
}

/// PUT /api/cases/{id}
#[utoipa::path(
    put,
    path = "/api/cases/{id}",
    request_body = UpdateLegalCaseRequest,
    params(
        ("id" = String, Path, description = "Case UUID"),
        ("X-User-Id" = Option<String>, Header, description = "Acting user for audit columns")
    ),
    responses(
        (status = 200, description = "Case updated", body = LegalCaseResponse),
        (status = 404, description = "Not found", body = AppError),
        (status = 409, description = "Case is closed or withdrawn", body = AppError),
        (status = 422, description = "Field or validation rule failure", body = AppError)
    ),
    tag = "cases"
)]
pub async fn update_case(
    State(pool): State<Pool<Postgres>>,
    actor: Actor,
    Path(id): Path<String>,
    Json(body): Json<UpdateLegalCaseRequest>,
) -> Result<Json<LegalCaseResponse>, AppError> {
    let uuid = parse_uuid(&id)?;
    let case = crate::services::cases::update_case(&pool, uuid, body, actor.as_str()).await?;
    Ok(Json(LegalCaseResponse::from(case)))
}

/// DELETE /api/cases/{id}
#[utoipa::path(
    delete,
    path = "/api/cases/{id}",
    params(("id" = String, Path, description = "Case UUID")),
    responses(
        (status = 204, description = "Case deleted"),
        (status = 404, description = "Not found", body = AppError),
        (status = 409, description = "Case has an active allocation", body = AppError)
    ),
    tag = "cases"
)]
pub async fn delete_case(
    State(pool): State<Pool<Postgres>>,
    actor: Actor,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let uuid = parse_uuid(&id)?;
    crate::services::cases::delete_case(&pool, uuid, actor.as_str()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/cases/{id}/status
#[utoipa::path(
    patch,
    path = "/api/cases/{id}/status",
    request_body = UpdateCaseStatusRequest,
    params(("id" = String, Path, description = "Case UUID")),
    responses(
        (status = 200, description = "Status changed", body = LegalCaseResponse),
        (status = 400, description = "Unknown status", body = AppError),
        (status = 404, description = "Not found", body = AppError),
        (status = 409, description = "Transition not allowed", body = AppError),
        (status = 422, description = "Invalid closed_date", body = AppError)
    ),
    tag = "cases"
)]
pub async fn update_case_status(
    State(pool): State<Pool<Postgres>>,
    actor: Actor,
    Path(id): Path<String>,
    Json(body): Json<UpdateCaseStatusRequest>,
) -> Result<Json<LegalCaseResponse>, AppError> {
    let uuid = parse_uuid(&id)?;
    let case = crate::services::cases::change_status(
        &pool,
        uuid,
        body.status.trim(),
        body.remarks,
        body.closed_date,
        actor.as_str(),
    )
    .await?;
    Ok(Json(LegalCaseResponse::from(case)))
}

/// POST /api/cases/{id}/hearings
#[utoipa::path(
    post,
    path = "/api/cases/{id}/hearings",
    request_body = AddHearingRequest,
    params(("id" = String, Path, description = "Case UUID")),
    responses(
        (status = 201, description = "Hearing recorded", body = CaseHearingResponse),
        (status = 404, description = "Not found", body = AppError),
        (status = 409, description = "Case does not accept hearings", body = AppError),
        (status = 422, description = "Invalid hearing dates", body = AppError)
    ),
    tag = "cases"
)]
pub async fn add_hearing(
    State(pool): State<Pool<Postgres>>,
    actor: Actor,
    Path(id): Path<String>,
    Json(body): Json<AddHearingRequest>,
) -> Result<(StatusCode, Json<CaseHearingResponse>), AppError> {
    let uuid = parse_uuid(&id)?;
    let hearing = crate::services::cases::add_hearing(&pool, uuid, body, actor.as_str()).await?;
    Ok((StatusCode::CREATED, Json(CaseHearingResponse::from(hearing))))
}

/// GET /api/cases/{id}/hearings
#[utoipa::path(
    get,
    path = "/api/cases/{id}/hearings",
    params(("id" = String, Path, description = "Case UUID")),
    responses(
        (status = 200, description = "Hearings by date", body = Vec<CaseHearingResponse>),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "cases"
)]
pub async fn list_hearings(
    State(pool): State<Pool<Postgres>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<CaseHearingResponse>>, AppError> {
    let case = load_case(&pool, &id).await?;
    let rows = crate::repo::hearing::list_for_case(&pool, case.id).await?;
    Ok(Json(rows.into_iter().map(CaseHearingResponse::from).collect()))
}

/// GET /api/cases/{id}/history
#[utoipa::path(
    get,
    path = "/api/cases/{id}/history",
    params(("id" = String, Path, description = "Case UUID")),
    responses(
        (status = 200, description = "Status changes, oldest first", body = Vec<CaseStatusHistoryResponse>),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "cases"
)]
pub async fn status_history(
    State(pool): State<Pool<Postgres>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<CaseStatusHistoryResponse>>, AppError> {
    let case = load_case(&pool, &id).await?;
    let rows = crate::repo::legal_case::status_history(&pool, case.id).await?;
    Ok(Json(rows.into_iter().map(CaseStatusHistoryResponse::from).collect()))
}
