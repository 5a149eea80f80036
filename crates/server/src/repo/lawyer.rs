use shared_types::{
    AppError, CreateLawyerRequest, Lawyer, LawyerListParams, LawyerWithLoad, UpdateLawyerRequest,
};
use sqlx::{PgExecutor, Pool, Postgres};
use uuid::Uuid;

use crate::error_convert::SqlxErrorExt;

const COLUMNS: &str = r#"
    l.id, l.name, l.email, l.phone, l.bar_registration_number,
    l.state_codes, l.language_codes, l.max_active_cases,
    l.is_active, l.is_deleted, l.created_by, l.updated_by, l.created_at, l.updated_at
"#;

const ACTIVE_CASES: &str = r#"
    (SELECT COUNT(*) FROM lawyer_allocations a
      WHERE a.lawyer_id = l.id AND a.is_active) AS active_cases
"#;

pub async fn create(
    pool: &Pool<Postgres>,
    req: &CreateLawyerRequest,
    actor: &str,
) -> Result<Lawyer, AppError> {
    let sql = format!(
        r#"
        INSERT INTO lawyers AS l (
            name, email, phone, bar_registration_number,
            state_codes, language_codes, max_active_cases, is_active,
            created_by, updated_by
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, COALESCE($8, TRUE), $9, $9)
        RETURNING {}
        "#,
        COLUMNS
    );
    sqlx::query_as::<_, Lawyer>(&sql)
        .bind(req.name.trim())
        .bind(req.email.trim())
        .bind(req.phone.trim())
        .bind(req.bar_registration_number.trim())
        .bind(&req.state_codes)
        .bind(&req.language_codes)
        .bind(req.max_active_cases)
        .bind(req.is_active)
        .bind(actor)
        .fetch_one(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn find_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<Lawyer>, AppError> {
    let sql = format!("SELECT {} FROM lawyers l WHERE l.id = $1 AND NOT l.is_deleted", COLUMNS);
    sqlx::query_as::<_, Lawyer>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

/// List lawyers by name, filtered by active flag, state and language.
pub async fn list(
    pool: &Pool<Postgres>,
    params: &LawyerListParams,
) -> Result<Vec<Lawyer>, AppError> {
    let sql = format!(
        r#"
        SELECT {} FROM lawyers l
        WHERE NOT l.is_deleted
          AND ($1::BOOLEAN IS NULL OR l.is_active = $1)
          AND ($2::TEXT IS NULL OR $2 = ANY(l.state_codes))
          AND ($3::TEXT IS NULL OR $3 = ANY(l.language_codes))
        ORDER BY l.name
        "#,
        COLUMNS
    );
    sqlx::query_as::<_, Lawyer>(&sql)
        .bind(params.active)
        .bind(params.state_code.as_deref())
        .bind(params.language_code.as_deref())
        .fetch_all(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn update(
    pool: &Pool<Postgres>,
    id: Uuid,
    req: &UpdateLawyerRequest,
    actor: &str,
) -> Result<Option<Lawyer>, AppError> {
    let sql = format!(
        r#"
        UPDATE lawyers AS l SET
            name             = COALESCE($2, l.name),
            email            = COALESCE($3, l.email),
            phone            = COALESCE($4, l.phone),
            state_codes      = COALESCE($5, l.state_codes),
            language_codes   = COALESCE($6, l.language_codes),
            max_active_cases = COALESCE($7, l.max_active_cases),
            is_active        = COALESCE($8, l.is_active),
            updated_by       = $9,
            updated_at       = NOW()
        WHERE l.id = $1 AND NOT l.is_deleted
        RETURNING {}
        "#,
        COLUMNS
    );
    sqlx::query_as::<_, Lawyer>(&sql)
        .bind(id)
        .bind(req.name.as_deref().map(str::trim))
        .bind(req.email.as_deref().map(str::trim))
        .bind(req.phone.as_deref().map(str::trim))
        .bind(req.state_codes.as_ref())
        .bind(req.language_codes.as_ref())
        .bind(req.max_active_cases)
        .bind(req.is_active)
        .bind(actor)
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn soft_delete(pool: &Pool<Postgres>, id: Uuid, actor: &str) -> Result<bool, AppError> {
    let result = sqlx::query(
        r#"
        UPDATE lawyers
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

/// Load a lawyer with their current load and lock the lawyer row, so
/// concurrent allocations against the same lawyer serialise.
pub async fn lock_with_load<'e, E>(ex: E, id: Uuid) -> Result<Option<LawyerWithLoad>, AppError>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        "SELECT {}, {} FROM lawyers l WHERE l.id = $1 AND NOT l.is_deleted FOR UPDATE OF l",
        COLUMNS, ACTIVE_CASES
    );
    sqlx::query_as::<_, LawyerWithLoad>(&sql)
        .bind(id)
        .fetch_optional(ex)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn find_with_load(
    pool: &Pool<Postgres>,
    id: Uuid,
) -> Result<Option<LawyerWithLoad>, AppError> {
    let sql = format!(
        "SELECT {}, {} FROM lawyers l WHERE l.id = $1 AND NOT l.is_deleted",
        COLUMNS, ACTIVE_CASES
    );
    sqlx::query_as::<_, LawyerWithLoad>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

/// Active lawyers covering `state_code`, with their load.
pub async fn candidates_for_state<'e, E>(
    ex: E,
    state_code: &str,
) -> Result<Vec<LawyerWithLoad>, AppError>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        r#"
        SELECT {}, {} FROM lawyers l
        WHERE NOT l.is_deleted AND l.is_active AND $1 = ANY(l.state_codes)
        ORDER BY l.name
        "#,
        COLUMNS, ACTIVE_CASES
    );
    sqlx::query_as::<_, LawyerWithLoad>(&sql)
        .bind(state_code)
        .fetch_all(ex)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

/// Load for every lawyer, busiest first.
pub async fn workloads(pool: &Pool<Postgres>) -> Result<Vec<LawyerWithLoad>, AppError> {
    let sql = format!(
        "SELECT {}, {} FROM lawyers l WHERE NOT l.is_deleted ORDER BY active_cases DESC, l.name",
        COLUMNS, ACTIVE_CASES
    );
    sqlx::query_as::<_, LawyerWithLoad>(&sql)
        .fetch_all(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}
