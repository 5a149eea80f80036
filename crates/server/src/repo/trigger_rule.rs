use shared_types::{AppError, CreateTriggerRuleRequest, TriggerRule, UpdateTriggerRuleRequest};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error_convert::SqlxErrorExt;

const COLUMNS: &str = "id, code, name, trigger_type, comparison, threshold, status_value, action, \
                       sms_template_code, notice_template_code, priority, \
                       is_active, is_deleted, created_at, updated_at";

pub async fn create(
    pool: &Pool<Postgres>,
    req: &CreateTriggerRuleRequest,
) -> Result<TriggerRule, AppError> {
    let sql = format!(
        r#"
        INSERT INTO trigger_rules (
            code, name, trigger_type, comparison, threshold, status_value, action,
            sms_template_code, notice_template_code, priority, is_active
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, COALESCE($11, TRUE))
        RETURNING {}
        "#,
        COLUMNS
    );
    sqlx::query_as::<_, TriggerRule>(&sql)
        .bind(&req.code)
        .bind(req.name.trim())
        .bind(&req.trigger_type)
        .bind(&req.comparison)
        .bind(req.threshold)
        .bind(req.status_value.as_deref())
        .bind(&req.action)
        .bind(req.sms_template_code.as_deref())
        .bind(req.notice_template_code.as_deref())
        .bind(req.priority)
        .bind(req.is_active)
        .fetch_one(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn list(pool: &Pool<Postgres>, active: Option<bool>) -> Result<Vec<TriggerRule>, AppError> {
    let sql = format!(
        r#"
        SELECT {} FROM trigger_rules
        WHERE NOT is_deleted AND ($1::BOOLEAN IS NULL OR is_active = $1)
        ORDER BY priority, code
        "#,
        COLUMNS
    );
    sqlx::query_as::<_, TriggerRule>(&sql)
        .bind(active)
        .fetch_all(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

/// Active rules in evaluation order.
pub async fn list_active(pool: &Pool<Postgres>) -> Result<Vec<TriggerRule>, AppError> {
    list(pool, Some(true)).await
}

pub async fn find_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<TriggerRule>, AppError> {
    let sql = format!("SELECT {} FROM trigger_rules WHERE id = $1 AND NOT is_deleted", COLUMNS);
    sqlx::query_as::<_, TriggerRule>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn update(
    pool: &Pool<Postgres>,
    id: Uuid,
    req: &UpdateTriggerRuleRequest,
) -> Result<Option<TriggerRule>, AppError> {
    let sql = format!(
        r#"
        UPDATE trigger_rules SET
            name                 = COALESCE($2, name),
            comparison           = COALESCE($3, comparison),
            threshold            = COALESCE($4, threshold),
            status_value         = COALESCE($5, status_value),
            action               = COALESCE($6, action),
            sms_template_code    = COALESCE($7, sms_template_code),
            notice_template_code = COALESCE($8, notice_template_code),
            priority             = COALESCE($9, priority),
            is_active            = COALESCE($10, is_active),
            updated_at           = NOW()
        WHERE id = $1 AND NOT is_deleted
        RETURNING {}
        "#,
        COLUMNS
    );
    sqlx::query_as::<_, TriggerRule>(&sql)
        .bind(id)
        .bind(req.name.as_deref().map(str::trim))
        .bind(req.comparison.as_deref())
        .bind(req.threshold)
        .bind(req.status_value.as_deref())
        .bind(req.action.as_deref())
        .bind(req.sms_template_code.as_deref())
        .bind(req.notice_template_code.as_deref())
        .bind(req.priority)
        .bind(req.is_active)
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn soft_delete(pool: &Pool<Postgres>, id: Uuid) -> Result<bool, AppError> {
    let result = sqlx::query(
        "UPDATE trigger_rules SET is_deleted = TRUE, updated_at = NOW() WHERE id = $1 AND NOT is_deleted",
    )
    .bind(id)
    .execute(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(result.rows_affected() > 0)
}
