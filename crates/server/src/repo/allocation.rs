use shared_types::{AppError, LawyerAllocation};
use sqlx::{PgExecutor, Pool, Postgres};
use uuid::Uuid;

use crate::error_convert::SqlxErrorExt;

const COLUMNS: &str = "id, case_id, lawyer_id, allocated_at, allocated_by, \
                       deallocated_at, deallocation_reason, is_active";

/// Insert an active allocation. The partial unique index rejects a second
/// active allocation for the same case.
pub async fn create<'e, E>(
    ex: E,
    case_id: Uuid,
    lawyer_id: Uuid,
    actor: &str,
) -> Result<LawyerAllocation, AppError>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        "INSERT INTO lawyer_allocations (case_id, lawyer_id, allocated_by) VALUES ($1, $2, $3) RETURNING {}",
        COLUMNS
    );
    sqlx::query_as::<_, LawyerAllocation>(&sql)
        .bind(case_id)
        .bind(lawyer_id)
        .bind(actor)
        .fetch_one(ex)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn active_for_case<'e, E>(
    ex: E,
    case_id: Uuid,
) -> Result<Option<LawyerAllocation>, AppError>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        "SELECT {} FROM lawyer_allocations WHERE case_id = $1 AND is_active",
        COLUMNS
    );
    sqlx::query_as::<_, LawyerAllocation>(&sql)
        .bind(case_id)
        .fetch_optional(ex)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

/// End one allocation.
pub async fn deactivate<'e, E>(
    ex: E,
    allocation_id: Uuid,
    reason: &str,
) -> Result<LawyerAllocation, AppError>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        r#"
        UPDATE lawyer_allocations
        SET is_active = FALSE, deallocated_at = NOW(), deallocation_reason = $2
        WHERE id = $1 AND is_active
        RETURNING {}
        "#,
        COLUMNS
    );
    sqlx::query_as::<_, LawyerAllocation>(&sql)
        .bind(allocation_id)
        .bind(reason)
        .fetch_one(ex)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

/// End whatever allocation a case holds. Returns the number ended (0 or 1).
pub async fn deactivate_for_case<'e, E>(ex: E, case_id: Uuid, reason: &str) -> Result<u64, AppError>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        UPDATE lawyer_allocations
        SET is_active = FALSE, deallocated_at = NOW(), deallocation_reason = $2
        WHERE case_id = $1 AND is_active
        "#,
    )
    .bind(case_id)
    .bind(reason)
    .execute(ex)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(result.rows_affected())
}

/// Every allocation a case has had, newest first.
pub async fn history_for_case(
    pool: &Pool<Postgres>,
    case_id: Uuid,
) -> Result<Vec<LawyerAllocation>, AppError> {
    let sql = format!(
        "SELECT {} FROM lawyer_allocations WHERE case_id = $1 ORDER BY allocated_at DESC",
        COLUMNS
    );
    sqlx::query_as::<_, LawyerAllocation>(&sql)
        .bind(case_id)
        .fetch_all(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn count_active_for_lawyer(pool: &Pool<Postgres>, lawyer_id: Uuid) -> Result<i64, AppError> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM lawyer_allocations WHERE lawyer_id = $1 AND is_active",
    )
    .bind(lawyer_id)
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}
