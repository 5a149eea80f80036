use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use shared_types::{
    first_overlap, is_blank, validate_range, ActiveFilter, AppError, CreateDpdBucketRequest,
    DpdBucketResponse, UpdateDpdBucketRequest,
};

use super::parse_uuid;

/// 409 when `[min_days, max_days]` shares a day with another bucket.
async fn ensure_no_overlap(
    pool: &Pool<Postgres>,
    min_days: i32,
    max_days: Option<i32>,
    exclude: Option<Uuid>,
) -> Result<(), AppError> {
    let buckets = crate::repo::dpd_bucket::list(pool, None).await?;
    if let Some(other) = first_overlap(&buckets, min_days, max_days, exclude) {
        return Err(AppError::conflict(format!(
            "DPD range overlaps bucket {} ({}-{})",
            other.code,
            other.min_days,
            other
                .max_days
                .map_or_else(|| "open".to_string(), |m| m.to_string())
        )));
    }
    Ok(())
}

/// POST /api/dpd-buckets
#[utoipa::path(
    post,
    path = "/api/dpd-buckets",
    request_body = CreateDpdBucketRequest,
    responses(
        (status = 201, description = "Bucket created", body = DpdBucketResponse),
        (status = 400, description = "Invalid range", body = AppError),
        (status = 409, description = "Overlapping range or duplicate code", body = AppError)
    ),
    tag = "master-data"
)]
pub async fn create_bucket(
    State(pool): State<Pool<Postgres>>,
    Json(mut body): Json<CreateDpdBucketRequest>,
) -> Result<(StatusCode, Json<DpdBucketResponse>), AppError> {
    body.code = body.code.trim().to_uppercase();
    if is_blank(&body.code) {
        return Err(AppError::bad_request("code must not be empty"));
    }
    if is_blank(&body.name) {
        return Err(AppError::field("name", "name must not be empty"));
    }
    validate_range(body.min_days, body.max_days).map_err(AppError::bad_request)?;
    ensure_no_overlap(&pool, body.min_days, body.max_days, None).await?;

    let bucket = crate::repo::dpd_bucket::create(&pool, &body).await?;
    Ok((StatusCode::CREATED, Json(DpdBucketResponse::from(bucket))))
}

/// GET /api/dpd-buckets
#[utoipa::path(
    get,
    path = "/api/dpd-buckets",
    params(ActiveFilter),
    responses(
        (status = 200, description = "Buckets ordered by min_days", body = Vec<DpdBucketResponse>)
    ),
    tag = "master-data"
)]
pub async fn list_buckets(
    State(pool): State<Pool<Postgres>>,
    Query(filter): Query<ActiveFilter>,
) -> Result<Json<Vec<DpdBucketResponse>>, AppError> {
    let rows = crate::repo::dpd_bucket::list(&pool, filter.active).await?;
    Ok(Json(rows.into_iter().map(DpdBucketResponse::from).collect()))
}

/// GET /api/dpd-buckets/{id}
#[utoipa::path(
    get,
    path = "/api/dpd-buckets/{id}",
    params(("id" = String, Path, description = "Bucket UUID")),
    responses(
        (status = 200, description = "Bucket found", body = DpdBucketResponse),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "master-data"
)]
pub async fn get_bucket(
    State(pool): State<Pool<Postgres>>,
    Path(id): Path<String>,
) -> Result<Json<DpdBucketResponse>, AppError> {
    let uuid = parse_uuid(&id)?;
    let bucket = crate::repo::dpd_bucket::find_by_id(&pool, uuid)
        .await?
        .ok_or_else(|| AppError::not_found(format!("DPD bucket {} not found", id)))?;
    Ok(Json(DpdBucketResponse::from(bucket)))
}

/// PUT /api/dpd-buckets/{id}
///
/// The range checks run against the merged bucket, so moving only one
/// bound is still checked for overlap.
#[utoipa::path(
    put,
    path = "/api/dpd-buckets/{id}",
    request_body = UpdateDpdBucketRequest,
    params(("id" = String, Path, description = "Bucket UUID")),
    responses(
        (status = 200, description = "Bucket updated", body = DpdBucketResponse),
        (status = 400, description = "Invalid range", body = AppError),
        (status = 404, description = "Not found", body = AppError),
        (status = 409, description = "Overlapping range", body = AppError)
    ),
    tag = "master-data"
)]
pub async fn update_bucket(
    State(pool): State<Pool<Postgres>>,
    Path(id): Path<String>,
    Json(body): Json<UpdateDpdBucketRequest>,
) -> Result<Json<DpdBucketResponse>, AppError> {
    let uuid = parse_uuid(&id)?;
    let current = crate::repo::dpd_bucket::find_by_id(&pool, uuid)
        .await?
        .ok_or_else(|| AppError::not_found(format!("DPD bucket {} not found", id)))?;

    let name = body.name.map(|n| n.trim().to_string()).unwrap_or(current.name);
    if name.is_empty() {
        return Err(AppError::field("name", "name must not be empty"));
    }
    let min_days = body.min_days.unwrap_or(current.min_days);
    let max_days = body.max_days.unwrap_or(current.max_days);
    let is_active = body.is_active.unwrap_or(current.is_active);

    validate_range(min_days, max_days).map_err(AppError::bad_request)?;
    ensure_no_overlap(&pool, min_days, max_days, Some(uuid)).await?;

    let bucket = crate::repo::dpd_bucket::update(&pool, uuid, &name, min_days, max_days, is_active)
        .await?
        .ok_or_else(|| AppError::not_found(format!("DPD bucket {} not found", id)))?;
    Ok(Json(DpdBucketResponse::from(bucket)))
}

/// DELETE /api/dpd-buckets/{id}
#[utoipa::path(
    delete,
    path = "/api/dpd-buckets/{id}",
    params(("id" = String, Path, description = "Bucket UUID")),
    responses(
        (status = 204, description = "Bucket deleted"),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "master-data"
)]
pub async fn delete_bucket(
    State(pool): State<Pool<Postgres>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let uuid = parse_uuid(&id)?;
    if crate::repo::dpd_bucket::soft_delete(&pool, uuid).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(format!("DPD bucket {} not found", id)))
    }
}

/// GET /api/dpd-buckets/resolve/{days}
#[utoipa::path(
    get,
    path = "/api/dpd-buckets/resolve/{days}",
    params(("days" = i32, Path, description = "Days past due")),
    responses(
        (status = 200, description = "Bucket containing the value", body = DpdBucketResponse),
        (status = 400, description = "Negative days", body = AppError),
        (status = 404, description = "No bucket covers the value", body = AppError)
    ),
    tag = "master-data"
)]
pub async fn resolve_bucket(
    State(pool): State<Pool<Postgres>>,
    Path(days): Path<i32>,
) -> Result<Json<DpdBucketResponse>, AppError> {
    if days < 0 {
        return Err(AppError::bad_request("days must be >= 0"));
    }
    let bucket = crate::repo::dpd_bucket::resolve(&pool, days)
        .await?
        .ok_or_else(|| AppError::not_found(format!("No active DPD bucket covers {} days", days)))?;
    Ok(Json(DpdBucketResponse::from(bucket)))
}
