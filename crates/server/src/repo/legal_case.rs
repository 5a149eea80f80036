use chrono::NaiveDate;
use shared_types::{
    AppError, CaseSearchParams, CaseStatistics, CaseStatusHistory, CreateLegalCaseRequest,
    GroupCount, LegalCase, UpdateLegalCaseRequest,
};
use sqlx::{PgExecutor, Pool, Postgres};
use uuid::Uuid;

use crate::error_convert::SqlxErrorExt;

/// Case columns for a `legal_cases c` row, plus the lawyer holding the
/// active allocation.
const CASE_COLUMNS: &str = r#"
    c.id, c.case_id, c.loan_account_number,
    c.borrower_name, c.borrower_mobile, c.borrower_email, c.borrower_address,
    c.state_code, c.product_code, c.language_code,
    c.dpd, c.outstanding_amount, c.case_type, c.status,
    c.court_name, c.court_case_number,
    c.filing_date, c.next_hearing_date, c.closed_date, c.remarks,
    (SELECT a.lawyer_id FROM lawyer_allocations a
      WHERE a.case_id = c.id AND a.is_active) AS assigned_lawyer_id,
    c.is_deleted, c.created_by, c.updated_by, c.created_at, c.updated_at
"#;

const OPEN: &str = "c.status NOT IN ('settled', 'closed', 'withdrawn')";

const HISTORY_COLUMNS: &str =
    "id, case_id, from_status, to_status, remarks, changed_by, changed_at";

/// Next value of the per-day case counter. The upsert is atomic, so
/// concurrent creates on the same day never share a number.
pub async fn next_sequence<'e, E>(ex: E, date: NaiveDate) -> Result<i32, AppError>
where
    E: PgExecutor<'e>,
{
    sqlx::query_scalar::<_, i32>(
        r#"
        INSERT INTO case_id_sequences (seq_date, last_value)
        VALUES ($1, 1)
        ON CONFLICT (seq_date)
        DO UPDATE SET last_value = case_id_sequences.last_value + 1
        RETURNING last_value
        "#,
    )
    .bind(date)
    .fetch_one(ex)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn create<'e, E>(
    ex: E,
    case_id: &str,
    req: &CreateLegalCaseRequest,
    actor: &str,
) -> Result<LegalCase, AppError>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        r#"
        INSERT INTO legal_cases AS c (
            case_id, loan_account_number,
            borrower_name, borrower_mobile, borrower_email, borrower_address,
            state_code, product_code, language_code,
            dpd, outstanding_amount, case_type,
            court_name, court_case_number, filing_date, next_hearing_date, remarks,
            created_by, updated_by
        )
        VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16,$17,$18,$18)
        RETURNING {}
        "#,
        CASE_COLUMNS
    );
    sqlx::query_as::<_, LegalCase>(&sql)
        .bind(case_id)
        .bind(&req.loan_account_number)
        .bind(&req.borrower_name)
        .bind(&req.borrower_mobile)
        .bind(&req.borrower_email)
        .bind(&req.borrower_address)
        .bind(&req.state_code)
        .bind(&req.product_code)
        .bind(&req.language_code)
        .bind(req.dpd)
        .bind(req.outstanding_amount)
        .bind(&req.case_type)
        .bind(&req.court_name)
        .bind(&req.court_case_number)
        .bind(req.filing_date)
        .bind(req.next_hearing_date)
        .bind(&req.remarks)
        .bind(actor)
        .fetch_one(ex)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn find_by_id<'e, E>(ex: E, id: Uuid) -> Result<Option<LegalCase>, AppError>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        "SELECT {} FROM legal_cases c WHERE c.id = $1 AND NOT c.is_deleted",
        CASE_COLUMNS
    );
    sqlx::query_as::<_, LegalCase>(&sql)
        .bind(id)
        .fetch_optional(ex)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

/// Look a case up by its human-facing `LC-...` identifier.
pub async fn find_by_case_id(
    pool: &Pool<Postgres>,
    case_id: &str,
) -> Result<Option<LegalCase>, AppError> {
    let sql = format!(
        "SELECT {} FROM legal_cases c WHERE c.case_id = $1 AND NOT c.is_deleted",
        CASE_COLUMNS
    );
    sqlx::query_as::<_, LegalCase>(&sql)
        .bind(case_id)
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

/// Load a case and hold a row lock until the transaction ends.
pub async fn lock<'e, E>(ex: E, id: Uuid) -> Result<Option<LegalCase>, AppError>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        "SELECT {} FROM legal_cases c WHERE c.id = $1 AND NOT c.is_deleted FOR UPDATE OF c",
        CASE_COLUMNS
    );
    sqlx::query_as::<_, LegalCase>(&sql)
        .bind(id)
        .fetch_optional(ex)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

/// Whether a non-terminal case already exists for the loan account and type.
pub async fn has_open_case(
    pool: &Pool<Postgres>,
    loan_account_number: &str,
    case_type: &str,
) -> Result<bool, AppError> {
    let sql = format!(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM legal_cases c
            WHERE c.loan_account_number = $1 AND c.case_type = $2
              AND NOT c.is_deleted AND {}
        )
        "#,
        OPEN
    );
    sqlx::query_scalar::<_, bool>(&sql)
        .bind(loan_account_number)
        .bind(case_type)
        .fetch_one(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

const SEARCH_FILTER: &str = r#"
    NOT c.is_deleted
      AND ($1::TEXT IS NULL OR c.status = $1)
      AND ($2::TEXT IS NULL OR c.case_type = $2)
      AND ($3::TEXT IS NULL OR c.state_code = $3)
      AND ($4::TEXT IS NULL OR c.product_code = $4)
      AND ($5::INTEGER IS NULL OR c.dpd >= $5)
      AND ($6::INTEGER IS NULL OR c.dpd <= $6)
      AND ($7::UUID IS NULL OR EXISTS (
            SELECT 1 FROM lawyer_allocations a
            WHERE a.case_id = c.id AND a.is_active AND a.lawyer_id = $7))
      AND ($8::TEXT IS NULL
           OR c.borrower_name ILIKE $8
           OR c.loan_account_number ILIKE $8
           OR c.case_id ILIKE $8)
"#;

/// Filtered, paginated case search. Returns the page and the total match count.
pub async fn search(
    pool: &Pool<Postgres>,
    params: &CaseSearchParams,
    offset: i64,
    limit: i64,
) -> Result<(Vec<LegalCase>, i64), AppError> {
    let search_pattern = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", s));

    let count_sql = format!("SELECT COUNT(*) FROM legal_cases c WHERE {}", SEARCH_FILTER);
    let total = sqlx::query_scalar::<_, i64>(&count_sql)
        .bind(params.status.as_deref())
        .bind(params.case_type.as_deref())
        .bind(params.state_code.as_deref())
        .bind(params.product_code.as_deref())
        .bind(params.min_dpd)
        .bind(params.max_dpd)
        .bind(params.lawyer_id)
        .bind(search_pattern.as_deref())
        .fetch_one(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

    let sql = format!(
        r#"
        SELECT {} FROM legal_cases c
        WHERE {}
        ORDER BY c.created_at DESC, c.case_id DESC
        LIMIT $9 OFFSET $10
        "#,
        CASE_COLUMNS, SEARCH_FILTER
    );
    let rows = sqlx::query_as::<_, LegalCase>(&sql)
        .bind(params.status.as_deref())
        .bind(params.case_type.as_deref())
        .bind(params.state_code.as_deref())
        .bind(params.product_code.as_deref())
        .bind(params.min_dpd)
        .bind(params.max_dpd)
        .bind(params.lawyer_id)
        .bind(search_pattern.as_deref())
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

    Ok((rows, total))
}

/// Partial update of the editable case fields.
pub async fn update(
    pool: &Pool<Postgres>,
    id: Uuid,
    req: &UpdateLegalCaseRequest,
    actor: &str,
) -> Result<Option<LegalCase>, AppError> {
    let sql = format!(
        r#"
        UPDATE legal_cases AS c SET
            borrower_name      = COALESCE($2, c.borrower_name),
            borrower_mobile    = COALESCE($3, c.borrower_mobile),
            borrower_email     = COALESCE($4, c.borrower_email),
            borrower_address   = COALESCE($5, c.borrower_address),
            language_code      = COALESCE($6, c.language_code),
            dpd                = COALESCE($7, c.dpd),
            outstanding_amount = COALESCE($8, c.outstanding_amount),
            court_name         = COALESCE($9, c.court_name),
            court_case_number  = COALESCE($10, c.court_case_number),
            filing_date        = COALESCE($11, c.filing_date),
            next_hearing_date  = COALESCE($12, c.next_hearing_date),
            remarks            = COALESCE($13, c.remarks),
            updated_by         = $14,
            updated_at         = NOW()
        WHERE c.id = $1 AND NOT c.is_deleted
        RETURNING {}
        "#,
        CASE_COLUMNS
    );
    sqlx::query_as::<_, LegalCase>(&sql)
        .bind(id)
        .bind(req.borrower_name.as_deref())
        .bind(req.borrower_mobile.as_deref())
        .bind(req.borrower_email.as_deref())
        .bind(req.borrower_address.as_deref())
        .bind(req.language_code.as_deref())
        .bind(req.dpd)
        .bind(req.outstanding_amount)
        .bind(req.court_name.as_deref())
        .bind(req.court_case_number.as_deref())
        .bind(req.filing_date)
        .bind(req.next_hearing_date)
        .bind(req.remarks.as_deref())
        .bind(actor)
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

/// Set the status. `closed_date` is only written when given.
pub async fn set_status<'e, E>(
    ex: E,
    id: Uuid,
    status: &str,
    closed_date: Option<NaiveDate>,
    actor: &str,
) -> Result<LegalCase, AppError>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        r#"
        UPDATE legal_cases AS c SET
            status      = $2,
            closed_date = COALESCE($3, c.closed_date),
            updated_by  = $4,
            updated_at  = NOW()
        WHERE c.id = $1 AND NOT c.is_deleted
        RETURNING {}
        "#,
        CASE_COLUMNS
    );
    sqlx::query_as::<_, LegalCase>(&sql)
        .bind(id)
        .bind(status)
        .bind(closed_date)
        .bind(actor)
        .fetch_one(ex)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn set_next_hearing<'e, E>(
    ex: E,
    id: Uuid,
    next_hearing_date: Option<NaiveDate>,
    actor: &str,
) -> Result<(), AppError>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r#"
        UPDATE legal_cases
        SET next_hearing_date = $2, updated_by = $3, updated_at = NOW()
        WHERE id = $1 AND NOT is_deleted
        "#,
    )
    .bind(id)
    .bind(next_hearing_date)
    .bind(actor)
    .execute(ex)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(())
}

/// Append a status history entry.
pub async fn insert_history<'e, E>(
    ex: E,
    case_id: Uuid,
    from_status: Option<&str>,
    to_status: &str,
    remarks: Option<&str>,
    actor: &str,
) -> Result<CaseStatusHistory, AppError>
where
    E: PgExecutor<'e>,
{
    // clock_timestamp keeps entries written in one transaction ordered.
    let sql = format!(
        r#"
        INSERT INTO case_status_history
            (case_id, from_status, to_status, remarks, changed_by, changed_at)
        VALUES ($1, $2, $3, $4, $5, clock_timestamp())
        RETURNING {}
        "#,
        HISTORY_COLUMNS
    );
    sqlx::query_as::<_, CaseStatusHistory>(&sql)
        .bind(case_id)
        .bind(from_status)
        .bind(to_status)
        .bind(remarks)
        .bind(actor)
        .fetch_one(ex)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn status_history(
    pool: &Pool<Postgres>,
    case_id: Uuid,
) -> Result<Vec<CaseStatusHistory>, AppError> {
    let sql = format!(
        "SELECT {} FROM case_status_history WHERE case_id = $1 ORDER BY changed_at",
        HISTORY_COLUMNS
    );
    sqlx::query_as::<_, CaseStatusHistory>(&sql)
        .bind(case_id)
        .fetch_all(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn soft_delete(pool: &Pool<Postgres>, id: Uuid, actor: &str) -> Result<bool, AppError> {
    let result = sqlx::query(
        r#"
        UPDATE legal_cases
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

/// Every open case, oldest first.
pub async fn list_open(pool: &Pool<Postgres>) -> Result<Vec<LegalCase>, AppError> {
    let sql = format!(
        "SELECT {} FROM legal_cases c WHERE NOT c.is_deleted AND {} ORDER BY c.created_at",
        CASE_COLUMNS, OPEN
    );
    sqlx::query_as::<_, LegalCase>(&sql)
        .fetch_all(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

/// The open cases among `ids`. Unknown and closed ids are skipped.
pub async fn find_open_by_ids(
    pool: &Pool<Postgres>,
    ids: &[Uuid],
) -> Result<Vec<LegalCase>, AppError> {
    let sql = format!(
        r#"
        SELECT {} FROM legal_cases c
        WHERE c.id = ANY($1) AND NOT c.is_deleted AND {}
        ORDER BY c.created_at
        "#,
        CASE_COLUMNS, OPEN
    );
    sqlx::query_as::<_, LegalCase>(&sql)
        .bind(ids)
        .fetch_all(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

/// Cases currently allocated to a lawyer.
pub async fn list_for_lawyer(
    pool: &Pool<Postgres>,
    lawyer_id: Uuid,
) -> Result<Vec<LegalCase>, AppError> {
    let sql = format!(
        r#"
        SELECT {} FROM legal_cases c
        JOIN lawyer_allocations la ON la.case_id = c.id AND la.is_active
        WHERE la.lawyer_id = $1 AND NOT c.is_deleted
        ORDER BY la.allocated_at
        "#,
        CASE_COLUMNS
    );
    sqlx::query_as::<_, LegalCase>(&sql)
        .bind(lawyer_id)
        .fetch_all(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn statistics(pool: &Pool<Postgres>) -> Result<CaseStatistics, AppError> {
    let (total, total_outstanding) = sqlx::query_as::<_, (i64, f64)>(
        r#"
        SELECT COUNT(*), COALESCE(SUM(outstanding_amount), 0)::DOUBLE PRECISION
        FROM legal_cases
        WHERE NOT is_deleted
        "#,
    )
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    let by_status = group_counts(pool, "status").await?;
    let by_case_type = group_counts(pool, "case_type").await?;

    Ok(CaseStatistics {
        total,
        by_status,
        by_case_type,
        total_outstanding,
    })
}

/// `column` is one of a fixed set of names, never caller input.
async fn group_counts(pool: &Pool<Postgres>, column: &str) -> Result<Vec<GroupCount>, AppError> {
    let sql = format!(
        r#"
        SELECT {col} AS key, COUNT(*) AS count
        FROM legal_cases
        WHERE NOT is_deleted
        GROUP BY {col}
        ORDER BY {col}
        "#,
        col = column
    );
    sqlx::query_as::<_, GroupCount>(&sql)
        .fetch_all(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}
