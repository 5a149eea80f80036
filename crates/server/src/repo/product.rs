use shared_types::{AppError, CreateProductRequest, Product, UpdateProductRequest};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error_convert::SqlxErrorExt;

const COLUMNS: &str = "id, code, name, description, is_active, is_deleted, created_at, updated_at";

pub async fn create(pool: &Pool<Postgres>, req: &CreateProductRequest) -> Result<Product, AppError> {
    let sql = format!(
        r#"
        INSERT INTO products (code, name, description, is_active)
        VALUES ($1, $2, $3, COALESCE($4, TRUE))
        RETURNING {}
        "#,
        COLUMNS
    );
    sqlx::query_as::<_, Product>(&sql)
        .bind(&req.code)
        .bind(req.name.trim())
        .bind(req.description.trim())
        .bind(req.is_active)
        .fetch_one(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn list(pool: &Pool<Postgres>, active: Option<bool>) -> Result<Vec<Product>, AppError> {
    let sql = format!(
        "SELECT {} FROM products WHERE NOT is_deleted AND ($1::BOOLEAN IS NULL OR is_active = $1) ORDER BY code",
        COLUMNS
    );
    sqlx::query_as::<_, Product>(&sql)
        .bind(active)
        .fetch_all(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn find_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<Product>, AppError> {
    let sql = format!("SELECT {} FROM products WHERE id = $1 AND NOT is_deleted", COLUMNS);
    sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn find_by_code(pool: &Pool<Postgres>, code: &str) -> Result<Option<Product>, AppError> {
    let sql = format!("SELECT {} FROM products WHERE code = $1 AND NOT is_deleted", COLUMNS);
    sqlx::query_as::<_, Product>(&sql)
        .bind(code)
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn update(
    pool: &Pool<Postgres>,
    id: Uuid,
    req: &UpdateProductRequest,
) -> Result<Option<Product>, AppError> {
    let sql = format!(
        r#"
        UPDATE products SET
            name        = COALESCE($2, name),
            description = COALESCE($3, description),
            is_active   = COALESCE($4, is_active),
            updated_at  = NOW()
        WHERE id = $1 AND NOT is_deleted
        RETURNING {}
        "#,
        COLUMNS
    );
    sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .bind(req.name.as_deref().map(str::trim))
        .bind(req.description.as_deref())
        .bind(req.is_active)
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn soft_delete(pool: &Pool<Postgres>, id: Uuid) -> Result<bool, AppError> {
    let result = sqlx::query(
        "UPDATE products SET is_deleted = TRUE, updated_at = NOW() WHERE id = $1 AND NOT is_deleted",
    )
    .bind(id)
    .execute(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(result.rows_affected() > 0)
}
