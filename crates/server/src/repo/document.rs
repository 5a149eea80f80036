use shared_types::{AppError, CaseDocument};
use sqlx::{PgExecutor, Pool, Postgres};
use uuid::Uuid;

use crate::error_convert::SqlxErrorExt;

const COLUMNS: &str = "id, case_id, document_type, file_name, content_type, size_bytes, sha256, \
                       storage_key, description, uploaded_by, is_deleted, created_at, updated_at";

/// Metadata for a document about to be stored.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub case_id: Uuid,
    pub document_type: String,
    pub file_name: String,
    pub content_type: String,
    pub description: Option<String>,
    pub uploaded_by: String,
}

/// Insert document metadata. The id is chosen by the caller because it is
/// part of the storage key.
pub async fn create<'e, E>(
    ex: E,
    id: Uuid,
    new: &NewDocument,
    size_bytes: i64,
    sha256: &str,
    storage_key: &str,
) -> Result<CaseDocument, AppError>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        r#"
        INSERT INTO case_documents (
            id, case_id, document_type, file_name, content_type,
            size_bytes, sha256, storage_key, description, uploaded_by
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING {}
        "#,
        COLUMNS
    );
    sqlx::query_as::<_, CaseDocument>(&sql)
        .bind(id)
        .bind(new.case_id)
        .bind(&new.document_type)
        .bind(&new.file_name)
        .bind(&new.content_type)
        .bind(size_bytes)
        .bind(sha256)
        .bind(storage_key)
        .bind(new.description.as_deref())
        .bind(&new.uploaded_by)
        .fetch_one(ex)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn find_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<CaseDocument>, AppError> {
    let sql = format!("SELECT {} FROM case_documents WHERE id = $1 AND NOT is_deleted", COLUMNS);
    sqlx::query_as::<_, CaseDocument>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn find_by_checksum<'e, E>(
    ex: E,
    case_id: Uuid,
    sha256: &str,
) -> Result<Option<CaseDocument>, AppError>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        "SELECT {} FROM case_documents WHERE case_id = $1 AND sha256 = $2 AND NOT is_deleted",
        COLUMNS
    );
    sqlx::query_as::<_, CaseDocument>(&sql)
        .bind(case_id)
        .bind(sha256)
        .fetch_optional(ex)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn list_for_case(
    pool: &Pool<Postgres>,
    case_id: Uuid,
) -> Result<Vec<CaseDocument>, AppError> {
    let sql = format!(
        "SELECT {} FROM case_documents WHERE case_id = $1 AND NOT is_deleted ORDER BY created_at DESC",
        COLUMNS
    );
    sqlx::query_as::<_, CaseDocument>(&sql)
        .bind(case_id)
        .fetch_all(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

/// Soft delete. The stored object is kept.
pub async fn soft_delete(pool: &Pool<Postgres>, id: Uuid) -> Result<bool, AppError> {
    let result = sqlx::query(
        "UPDATE case_documents SET is_deleted = TRUE, updated_at = NOW() WHERE id = $1 AND NOT is_deleted",
    )
    .bind(id)
    .execute(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(result.rows_affected() > 0)
}
