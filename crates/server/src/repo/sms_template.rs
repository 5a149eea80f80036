use shared_types::{AppError, CreateSmsTemplateRequest, SmsTemplate, UpdateSmsTemplateRequest};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error_convert::SqlxErrorExt;

const COLUMNS: &str = "id, code, name, language_code, body, dlt_template_id, \
                       is_active, is_deleted, created_at, updated_at";

pub async fn create(
    pool: &Pool<Postgres>,
    req: &CreateSmsTemplateRequest,
) -> Result<SmsTemplate, AppError> {
    let sql = format!(
        r#"
        INSERT INTO sms_templates (code, name, language_code, body, dlt_template_id, is_active)
        VALUES ($1, $2, $3, $4, $5, COALESCE($6, TRUE))
        RETURNING {}
        "#,
        COLUMNS
    );
    sqlx::query_as::<_, SmsTemplate>(&sql)
        .bind(&req.code)
        .bind(req.name.trim())
        .bind(&req.language_code)
        .bind(&req.body)
        .bind(&req.dlt_template_id)
        .bind(req.is_active)
        .fetch_one(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn list(pool: &Pool<Postgres>, active: Option<bool>) -> Result<Vec<SmsTemplate>, AppError> {
    let sql = format!(
        r#"
        SELECT {} FROM sms_templates
        WHERE NOT is_deleted AND ($1::BOOLEAN IS NULL OR is_active = $1)
        ORDER BY code, language_code
        "#,
        COLUMNS
    );
    sqlx::query_as::<_, SmsTemplate>(&sql)
        .bind(active)
        .fetch_all(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn find_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<SmsTemplate>, AppError> {
    let sql = format!("SELECT {} FROM sms_templates WHERE id = $1 AND NOT is_deleted", COLUMNS);
    sqlx::query_as::<_, SmsTemplate>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

/// The active variant of `code` in one language.
pub async fn find_active_variant(
    pool: &Pool<Postgres>,
    code: &str,
    language_code: &str,
) -> Result<Option<SmsTemplate>, AppError> {
    let sql = format!(
        r#"
        SELECT {} FROM sms_templates
        WHERE code = $1 AND language_code = $2 AND is_active AND NOT is_deleted
        "#,
        COLUMNS
    );
    sqlx::query_as::<_, SmsTemplate>(&sql)
        .bind(code)
        .bind(language_code)
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

/// Any active variant of `code`, picked deterministically by language.
pub async fn find_any_active(
    pool: &Pool<Postgres>,
    code: &str,
) -> Result<Option<SmsTemplate>, AppError> {
    let sql = format!(
        r#"
        SELECT {} FROM sms_templates
        WHERE code = $1 AND is_active AND NOT is_deleted
        ORDER BY language_code
        LIMIT 1
        "#,
        COLUMNS
    );
    sqlx::query_as::<_, SmsTemplate>(&sql)
        .bind(code)
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn update(
    pool: &Pool<Postgres>,
    id: Uuid,
    req: &UpdateSmsTemplateRequest,
) -> Result<Option<SmsTemplate>, AppError> {
    let sql = format!(
        r#"
        UPDATE sms_templates SET
            name            = COALESCE($2, name),
            body            = COALESCE($3, body),
            dlt_template_id = COALESCE($4, dlt_template_id),
            is_active       = COALESCE($5, is_active),
            updated_at      = NOW()
        WHERE id = $1 AND NOT is_deleted
        RETURNING {}
        "#,
        COLUMNS
    );
    sqlx::query_as::<_, SmsTemplate>(&sql)
        .bind(id)
        .bind(req.name.as_deref().map(str::trim))
        .bind(req.body.as_deref())
        .bind(req.dlt_template_id.as_deref())
        .bind(req.is_active)
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn soft_delete(pool: &Pool<Postgres>, id: Uuid) -> Result<bool, AppError> {
    let result = sqlx::query(
        "UPDATE sms_templates SET is_deleted = TRUE, updated_at = NOW() WHERE id = $1 AND NOT is_deleted",
    )
    .bind(id)
    .execute(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(result.rows_affected() > 0)
}
