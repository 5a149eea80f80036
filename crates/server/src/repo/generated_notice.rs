use shared_types::{AppError, GeneratedNotice};
use sqlx::{PgExecutor, Pool, Postgres};
use uuid::Uuid;

use crate::error_convert::SqlxErrorExt;

const COLUMNS: &str = "id, case_id, template_id, template_version, output_format, subject, \
                       content, document_id, masked, generated_by, generated_at";

#[derive(Debug, Clone)]
pub struct NewGeneratedNotice {
    pub case_id: Uuid,
    pub template_id: Uuid,
    pub template_version: i32,
    pub output_format: String,
    pub subject: String,
    pub content: String,
    pub document_id: Option<Uuid>,
    pub masked: bool,
    pub generated_by: String,
}

pub async fn create<'e, E>(ex: E, new: NewGeneratedNotice) -> Result<GeneratedNotice, AppError>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        r#"
        INSERT INTO generated_notices (
            case_id, template_id, template_version, output_format,
            subject, content, document_id, masked, generated_by
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING {}
        "#,
        COLUMNS
    );
    sqlx::query_as::<_, GeneratedNotice>(&sql)
        .bind(new.case_id)
        .bind(new.template_id)
        .bind(new.template_version)
        .bind(new.output_format)
        .bind(new.subject)
        .bind(new.content)
        .bind(new.document_id)
        .bind(new.masked)
        .bind(new.generated_by)
        .fetch_one(ex)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn find_by_id(
    pool: &Pool<Postgres>,
    id: Uuid,
) -> Result<Option<GeneratedNotice>, AppError> {
    let sql = format!("SELECT {} FROM generated_notices WHERE id = $1", COLUMNS);
    sqlx::query_as::<_, GeneratedNotice>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

/// Notices issued for a case, newest first.
pub async fn list_for_case(
    pool: &Pool<Postgres>,
    case_id: Uuid,
) -> Result<Vec<GeneratedNotice>, AppError> {
    let sql = format!(
        "SELECT {} FROM generated_notices WHERE case_id = $1 ORDER BY generated_at DESC",
        COLUMNS
    );
    sqlx::query_as::<_, GeneratedNotice>(&sql)
        .bind(case_id)
        .fetch_all(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}
