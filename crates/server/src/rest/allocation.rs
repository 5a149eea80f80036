use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sqlx::{Pool, Postgres};

use shared_types::{
    AllocateLawyerRequest, AllocationResponse, AppError, DeallocateLawyerRequest,
    ReassignLawyerRequest,
};

use super::{load_case, parse_uuid};
use crate::actor::Actor;

/// POST /api/cases/{id}/allocation
#[utoipa::path(
    post,
    path = "/api/cases/{id}/allocation",
    request_body = AllocateLawyerRequest,
    params(
        ("id" = String, Path, description = "Case UUID"),
        ("X-User-Id" = Option<String>, Header, description = "Recorded as allocated_by")
    ),
    responses(
        (status = 201, description = "Lawyer allocated", body = AllocationResponse),
        (status = 400, description = "Lawyer inactive or does not cover the state", body = AppError),
        (status = 404, description = "Case or lawyer not found", body = AppError),
        (status = 409, description = "Case closed, already allocated, or lawyer at capacity", body = AppError)
    ),
    tag = "allocations"
)]
pub async fn allocate_lawyer(
    State(pool): State<Pool<Postgres>>,
    actor: Actor,
    Path(id): Path<String>,
    Json(body): Json<AllocateLawyerRequest>,
) -> Result<(StatusCode, Json<AllocationResponse>), AppError> {
    let case_id = parse_uuid(&id)?;
    let allocation =
        crate::services::allocation::allocate(&pool, case_id, body.lawyer_id, actor.as_str())
            .await?;
    Ok((StatusCode::CREATED, Json(AllocationResponse::from(allocation))))
}

/// POST /api/cases/{id}/allocation/auto
#[utoipa::path(
    post,
    path = "/api/cases/{id}/allocation/auto",
    params(
        ("id" = String, Path, description = "Case UUID"),
        ("X-User-Id" = Option<String>, Header, description = "Recorded as allocated_by")
    ),
    responses(
        (status = 201, description = "Best available lawyer allocated", body = AllocationResponse),
        (status = 404, description = "Case not found", body = AppError),
        (status = 409, description = "No eligible lawyer, or case already allocated", body = AppError)
    ),
    tag = "allocations"
)]
pub async fn auto_allocate(
    State(pool): State<Pool<Postgres>>,
    actor: Actor,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<AllocationResponse>), AppError> {
    let case_id = parse_uuid(&id)?;
    let allocation =
        crate::services::allocation::auto_allocate(&pool, case_id, actor.as_str()).await?;
    Ok((StatusCode::CREATED, Json(AllocationResponse::from(allocation))))
}

/// POST /api/cases/{id}/allocation/reassign
#[utoipa::path(
    post,
    path = "/api/cases/{id}/allocation/reassign",
    request_body = ReassignLawyerRequest,
    params(
        ("id" = String, Path, description = "Case UUID"),
        ("X-User-Id" = Option<String>, Header, description = "Recorded as allocated_by")
    ),
    responses(
        (status = 200, description = "New allocation", body = AllocationResponse),
        (status = 404, description = "Case or lawyer not found", body = AppError),
        (status = 409, description = "No current allocation, same lawyer, or lawyer at capacity", body = AppError),
        (status = 422, description = "Missing reason", body = AppError)
    ),
    tag = "allocations"
)]
pub async fn reassign_lawyer(
    State(pool): State<Pool<Postgres>>,
    actor: Actor,
    Path(id): Path<String>,
    Json(body): Json<ReassignLawyerRequest>,
) -> Result<Json<AllocationResponse>, AppError> {
    let case_id = parse_uuid(&id)?;
    let allocation = crate::services::allocation::reassign(
        &pool,
        case_id,
        body.lawyer_id,
        &body.reason,
        actor.as_str(),
    )
    .await?;
    Ok(Json(AllocationResponse::from(allocation)))
}

/// POST /api/cases/{id}/allocation/deallocate
#[utoipa::path(
    post,
    path = "/api/cases/{id}/allocation/deallocate",
    request_body = DeallocateLawyerRequest,
    params(("id" = String, Path, description = "Case UUID")),
    responses(
        (status = 200, description = "Ended allocation", body = AllocationResponse),
        (status = 404, description = "No active allocation", body = AppError),
        (status = 422, description = "Missing reason", body = AppError)
    ),
    tag = "allocations"
)]
pub async fn deallocate_lawyer(
    State(pool): State<Pool<Postgres>>,
    Path(id): Path<String>,
    Json(body): Json<DeallocateLawyerRequest>,
) -> Result<Json<AllocationResponse>, AppError> {
    let case_id = parse_uuid(&id)?;
    let ended = crate::services::allocation::deallocate(&pool, case_id, &body.reason).await?;
    Ok(Json(AllocationResponse::from(ended)))
}

/// GET /api/cases/{id}/allocations
#[utoipa::path(
    get,
    path = "/api/cases/{id}/allocations",
    params(("id" = String, Path, description = "Case UUID")),
    responses(
        (status = 200, description = "Allocation history, newest first", body = Vec<AllocationResponse>),
        (status = 404, description = "Case not found", body = AppError)
    ),
    tag = "allocations"
)]
pub async fn allocation_history(
    State(pool): State<Pool<Postgres>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<AllocationResponse>>, AppError> {
    let case = load_case(&pool, &id).await?;
    let rows = crate::repo::allocation::history_for_case(&pool, case.id).await?;
    Ok(Json(rows.into_iter().map(AllocationResponse::from).collect()))
}
