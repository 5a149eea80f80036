use shared_types::{AppError, Communication};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error_convert::SqlxErrorExt;

const COLUMNS: &str = "id, case_id, channel, recipient, template_code, language_code, content, \
                       status, provider_reference, error_message, created_by, created_at";

#[derive(Debug, Clone)]
pub struct NewCommunication {
    pub case_id: Uuid,
    pub channel: String,
    /// Already masked.
    pub recipient: String,
    pub template_code: String,
    pub language_code: String,
    pub content: String,
    pub status: String,
    pub provider_reference: Option<String>,
    pub error_message: Option<String>,
    pub created_by: String,
}

pub async fn create(
    pool: &Pool<Postgres>,
    new: NewCommunication,
) -> Result<Communication, AppError> {
    let sql = format!(
        r#"
        INSERT INTO communications (
            case_id, channel, recipient, template_code, language_code, content,
            status, provider_reference, error_message, created_by
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING {}
        "#,
        COLUMNS
    );
    sqlx::query_as::<_, Communication>(&sql)
        .bind(new.case_id)
        .bind(new.channel)
        .bind(new.recipient)
        .bind(new.template_code)
        .bind(new.language_code)
        .bind(new.content)
        .bind(new.status)
        .bind(new.provider_reference)
        .bind(new.error_message)
        .bind(new.created_by)
        .fetch_one(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn list_for_case(
    pool: &Pool<Postgres>,
    case_id: Uuid,
) -> Result<Vec<Communication>, AppError> {
    let sql = format!(
        "SELECT {} FROM communications WHERE case_id = $1 ORDER BY created_at DESC",
        COLUMNS
    );
    sqlx::query_as::<_, Communication>(&sql)
        .bind(case_id)
        .fetch_all(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}
