use shared_types::{AppError, CreateDpdBucketRequest, DpdBucket};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error_convert::SqlxErrorExt;

const COLUMNS: &str =
    "id, code, name, min_days, max_days, is_active, is_deleted, created_at, updated_at";

pub async fn create(pool: &Pool<Postgres>, req: &CreateDpdBucketRequest) -> Result<DpdBucket, AppError> {
    let sql = format!(
        r#"
        INSERT INTO dpd_buckets (code, name, min_days, max_days, is_active)
        VALUES ($1, $2, $3, $4, COALESCE($5, TRUE))
        RETURNING {}
        "#,
        COLUMNS
    );
    sqlx::query_as::<_, DpdBucket>(&sql)
        .bind(&req.code)
        .bind(req.name.trim())
        .bind(req.min_days)
        .bind(req.max_days)
        .bind(req.is_active)
        .fetch_one(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

/// Buckets ordered by their lower bound.
pub async fn list(pool: &Pool<Postgres>, active: Option<bool>) -> Result<Vec<DpdBucket>, AppError> {
    let sql = format!(
        r#"
        SELECT {} FROM dpd_buckets
        WHERE NOT is_deleted AND ($1::BOOLEAN IS NULL OR is_active = $1)
        ORDER BY min_days, code
        "#,
        COLUMNS
    );
    sqlx::query_as::<_, DpdBucket>(&sql)
        .bind(active)
        .fetch_all(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn find_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DpdBucket>, AppError> {
    let sql = format!("SELECT {} FROM dpd_buckets WHERE id = $1 AND NOT is_deleted", COLUMNS);
    sqlx::query_as::<_, DpdBucket>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

/// The active bucket containing `days`.
pub async fn resolve(pool: &Pool<Postgres>, days: i32) -> Result<Option<DpdBucket>, AppError> {
    let sql = format!(
        r#"
        SELECT {} FROM dpd_buckets
        WHERE NOT is_deleted AND is_active
          AND min_days <= $1
          AND (max_days IS NULL OR max_days >= $1)
        ORDER BY min_days
        LIMIT 1
        "#,
        COLUMNS
    );
    sqlx::query_as::<_, DpdBucket>(&sql)
        .bind(days)
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

/// Write the already-merged bucket fields back.
pub async fn update(
    pool: &Pool<Postgres>,
    id: Uuid,
    name: &str,
    min_days: i32,
    max_days: Option<i32>,
    is_active: bool,
) -> Result<Option<DpdBucket>, AppError> {
    let sql = format!(
        r#"
        UPDATE dpd_buckets SET
            name       = $2,
            min_days   = $3,
            max_days   = $4,
            is_active  = $5,
            updated_at = NOW()
        WHERE id = $1 AND NOT is_deleted
        RETURNING {}
        "#,
        COLUMNS
    );
    sqlx::query_as::<_, DpdBucket>(&sql)
        .bind(id)
        .bind(name)
        .bind(min_days)
        .bind(max_days)
        .bind(is_active)
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn soft_delete(pool: &Pool<Postgres>, id: Uuid) -> Result<bool, AppError> {
    let result = sqlx::query(
        "UPDATE dpd_buckets SET is_deleted = TRUE, updated_at = NOW() WHERE id = $1 AND NOT is_deleted",
    )
    .bind(id)
    .execute(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(result.rows_affected() > 0)
}
