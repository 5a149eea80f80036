use shared_types::{AppError, CreateLanguageRequest, Language, UpdateLanguageRequest};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error_convert::SqlxErrorExt;

const COLUMNS: &str = "id, code, name, is_active, is_deleted, created_at, updated_at";

/// Insert a language. `code` is already lowercased.
pub async fn create(pool: &Pool<Postgres>, req: &CreateLanguageRequest) -> Result<Language, AppError> {
    let sql = format!(
        "INSERT INTO languages (code, name, is_active) VALUES ($1, $2, COALESCE($3, TRUE)) RETURNING {}",
        COLUMNS
    );
    sqlx::query_as::<_, Language>(&sql)
        .bind(&req.code)
        .bind(req.name.trim())
        .bind(req.is_active)
        .fetch_one(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

/// List non-deleted languages ordered by code, optionally filtered by `is_active`.
pub async fn list(pool: &Pool<Postgres>, active: Option<bool>) -> Result<Vec<Language>, AppError> {
    let sql = format!(
        "SELECT {} FROM languages WHERE NOT is_deleted AND ($1::BOOLEAN IS NULL OR is_active = $1) ORDER BY code",
        COLUMNS
    );
    sqlx::query_as::<_, Language>(&sql)
        .bind(active)
        .fetch_all(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn find_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<Language>, AppError> {
    let sql = format!("SELECT {} FROM languages WHERE id = $1 AND NOT is_deleted", COLUMNS);
    sqlx::query_as::<_, Language>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn find_by_code(pool: &Pool<Postgres>, code: &str) -> Result<Option<Language>, AppError> {
    let sql = format!("SELECT {} FROM languages WHERE code = $1 AND NOT is_deleted", COLUMNS);
    sqlx::query_as::<_, Language>(&sql)
        .bind(code)
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn update(
    pool: &Pool<Postgres>,
    id: Uuid,
    req: &UpdateLanguageRequest,
) -> Result<Option<Language>, AppError> {
    let sql = format!(
        r#"
        UPDATE languages SET
            name       = COALESCE($2, name),
            is_active  = COALESCE($3, is_active),
            updated_at = NOW()
        WHERE id = $1 AND NOT is_deleted
        RETURNING {}
        "#,
        COLUMNS
    );
    sqlx::query_as::<_, Language>(&sql)
        .bind(id)
        .bind(req.name.as_deref().map(str::trim))
        .bind(req.is_active)
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn soft_delete(pool: &Pool<Postgres>, id: Uuid) -> Result<bool, AppError> {
    let result = sqlx::query(
        "UPDATE languages SET is_deleted = TRUE, updated_at = NOW() WHERE id = $1 AND NOT is_deleted",
    )
    .bind(id)
    .execute(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(result.rows_affected() > 0)
}
