use shared_types::{AddHearingRequest, AppError, CaseHearing};
use sqlx::{PgExecutor, Pool, Postgres};
use uuid::Uuid;

use crate::error_convert::SqlxErrorExt;

pub async fn create<'e, E>(
    ex: E,
    case_id: Uuid,
    req: &AddHearingRequest,
    actor: &str,
) -> Result<CaseHearing, AppError>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, CaseHearing>(
        r#"
        INSERT INTO case_hearings (case_id, hearing_date, outcome, next_hearing_date, notes, created_by)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, case_id, hearing_date, outcome, next_hearing_date, notes, created_by, created_at
        "#,
    )
    .bind(case_id)
    .bind(req.hearing_date)
    .bind(req.outcome.trim())
    .bind(req.next_hearing_date)
    .bind(req.notes.as_deref())
    .bind(actor)
    .fetch_one(ex)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

/// Hearings for a case in date order.
pub async fn list_for_case(
    pool: &Pool<Postgres>,
    case_id: Uuid,
) -> Result<Vec<CaseHearing>, AppError> {
    sqlx::query_as::<_, CaseHearing>(
        r#"
        SELECT id, case_id, hearing_date, outcome, next_hearing_date, notes, created_by, created_at
        FROM case_hearings
        WHERE case_id = $1
        ORDER BY hearing_date, created_at
        "#,
    )
    .bind(case_id)
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}
