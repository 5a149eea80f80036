use shared_types::{AppError, CreateNoticeTemplateRequest, NoticeTemplate, UpdateNoticeTemplateRequest};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error_convert::SqlxErrorExt;

const COLUMNS: &str = "id, code, name, notice_type, language_code, output_format, subject, body, \
                       required_fields, version, is_active, is_deleted, \
                       created_by, updated_by, created_at, updated_at";

pub async fn create(
    pool: &Pool<Postgres>,
    req: &CreateNoticeTemplateRequest,
    actor: &str,
) -> Result<NoticeTemplate, AppError> {
    let sql = format!(
        r#"
        INSERT INTO notice_templates (
            code, name, notice_type, language_code, output_format,
            subject, body, required_fields, is_active, created_by, updated_by
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, COALESCE($9, TRUE), $10, $10)
        RETURNING {}
        "#,
        COLUMNS
    );
    sqlx::query_as::<_, NoticeTemplate>(&sql)
        .bind(&req.code)
        .bind(req.name.trim())
        .bind(&req.notice_type)
        .bind(&req.language_code)
        .bind(&req.output_format)
        .bind(&req.subject)
        .bind(&req.body)
        .bind(&req.required_fields)
        .bind(req.is_active)
        .bind(actor)
        .fetch_one(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn list(
    pool: &Pool<Postgres>,
    active: Option<bool>,
) -> Result<Vec<NoticeTemplate>, AppError> {
    let sql = format!(
        r#"
        SELECT {} FROM notice_templates
        WHERE NOT is_deleted AND ($1::BOOLEAN IS NULL OR is_active = $1)
        ORDER BY code
        "#,
        COLUMNS
    );
    sqlx::query_as::<_, NoticeTemplate>(&sql)
        .bind(active)
        .fetch_all(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn find_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<NoticeTemplate>, AppError> {
    let sql = format!("SELECT {} FROM notice_templates WHERE id = $1 AND NOT is_deleted", COLUMNS);
    sqlx::query_as::<_, NoticeTemplate>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn find_by_code(
    pool: &Pool<Postgres>,
    code: &str,
) -> Result<Option<NoticeTemplate>, AppError> {
    let sql = format!("SELECT {} FROM notice_templates WHERE code = $1 AND NOT is_deleted", COLUMNS);
    sqlx::query_as::<_, NoticeTemplate>(&sql)
        .bind(code)
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

/// Partial update. `version` goes up by one whenever the subject or body
/// actually changes.
pub async fn update(
    pool: &Pool<Postgres>,
    id: Uuid,
    req: &UpdateNoticeTemplateRequest,
    actor: &str,
) -> Result<Option<NoticeTemplate>, AppError> {
    let sql = format!(
        r#"
        UPDATE notice_templates SET
            name            = COALESCE($2, name),
            output_format   = COALESCE($3, output_format),
            subject         = COALESCE($4, subject),
            body            = COALESCE($5, body),
            required_fields = COALESCE($6, required_fields),
            is_active       = COALESCE($7, is_active),
            version         = CASE
                                WHEN COALESCE($4, subject) IS DISTINCT FROM subject
                                  OR COALESCE($5, body) IS DISTINCT FROM body
                                THEN version + 1
                                ELSE version
                              END,
            updated_by      = $8,
            updated_at      = NOW()
        WHERE id = $1 AND NOT is_deleted
        RETURNING {}
        "#,
        COLUMNS
    );
    sqlx::query_as::<_, NoticeTemplate>(&sql)
        .bind(id)
        .bind(req.name.as_deref().map(str::trim))
        .bind(req.output_format.as_deref())
        .bind(req.subject.as_deref())
        .bind(req.body.as_deref())
        .bind(req.required_fields.as_ref())
        .bind(req.is_active)
        .bind(actor)
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn soft_delete(pool: &Pool<Postgres>, id: Uuid, actor: &str) -> Result<bool, AppError> {
    let result = sqlx::query(
        r#"
        UPDATE notice_templates
        SET is_deleted = TRUE, updated_by = $2, updated_at = NOW()
        WHERE id = $1 AND NOT is_deleted
        "#,
    )
    .bind(id)
    .bind(actor)
    .execute(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(result.rows_affected() > 0)
}
