use shared_types::{
    AppError, CreateValidationRuleRequest, UpdateValidationRuleRequest, ValidationRule,
};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error_convert::SqlxErrorExt;

const COLUMNS: &str = "id, name, field, operator, value, case_type, message, \
                       is_active, is_deleted, created_at, updated_at";

pub async fn create(
    pool: &Pool<Postgres>,
    req: &CreateValidationRuleRequest,
) -> Result<ValidationRule, AppError> {
    let sql = format!(
        r#"
        INSERT INTO validation_rules (name, field, operator, value, case_type, message, is_active)
        VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, TRUE))
        RETURNING {}
        "#,
        COLUMNS
    );
    sqlx::query_as::<_, ValidationRule>(&sql)
        .bind(req.name.trim())
        .bind(&req.field)
        .bind(&req.operator)
        .bind(req.value)
        .bind(req.case_type.as_deref())
        .bind(req.message.trim())
        .bind(req.is_active)
        .fetch_one(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn list(
    pool: &Pool<Postgres>,
    active: Option<bool>,
) -> Result<Vec<ValidationRule>, AppError> {
    let sql = format!(
        r#"
        SELECT {} FROM validation_rules
        WHERE NOT is_deleted AND ($1::BOOLEAN IS NULL OR is_active = $1)
        ORDER BY field, name
        "#,
        COLUMNS
    );
    sqlx::query_as::<_, ValidationRule>(&sql)
        .bind(active)
        .fetch_all(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn list_active(pool: &Pool<Postgres>) -> Result<Vec<ValidationRule>, AppError> {
    list(pool, Some(true)).await
}

pub async fn find_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<ValidationRule>, AppError> {
    let sql = format!("SELECT {} FROM validation_rules WHERE id = $1 AND NOT is_deleted", COLUMNS);
    sqlx::query_as::<_, ValidationRule>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn update(
    pool: &Pool<Postgres>,
    id: Uuid,
    req: &UpdateValidationRuleRequest,
) -> Result<Option<ValidationRule>, AppError> {
    let sql = format!(
        r#"
        UPDATE validation_rules SET
            name       = COALESCE($2, name),
            operator   = COALESCE($3, operator),
            value      = COALESCE($4, value),
            message    = COALESCE($5, message),
            is_active  = COALESCE($6, is_active),
            updated_at = NOW()
        WHERE id = $1 AND NOT is_deleted
        RETURNING {}
        "#,
        COLUMNS
    );
    sqlx::query_as::<_, ValidationRule>(&sql)
        .bind(id)
        .bind(req.name.as_deref().map(str::trim))
        .bind(req.operator.as_deref())
        .bind(req.value)
        .bind(req.message.as_deref().map(str::trim))
        .bind(req.is_active)
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn soft_delete(pool: &Pool<Postgres>, id: Uuid) -> Result<bool, AppError> {
    let result = sqlx::query(
        "UPDATE validation_rules SET is_deleted = TRUE, updated_at = NOW() WHERE id = $1 AND NOT is_deleted",
    )
    .bind(id)
    .execute(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(result.rows_affected() > 0)
}
