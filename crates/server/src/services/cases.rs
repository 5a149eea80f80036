//! Legal case lifecycle: create, update, status changes and hearings.

use chrono::{NaiveDate, Utc};
use shared_types::{
    accepts_hearings, can_transition, check_case_dates, format_case_id, is_blank,
    is_terminal_status, is_valid_case_status, is_valid_case_type, is_valid_email, is_valid_mobile,
    AddHearingRequest, AppError, CaseHearing, CreateLegalCaseRequest, LegalCase,
    UpdateLegalCaseRequest, CASE_STATUSES, CASE_TYPES,
};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error_convert::SqlxErrorExt;

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Field checks shared by create and update.
fn check_borrower_fields(
    borrower_name: Option<&str>,
    borrower_mobile: Option<&str>,
    borrower_email: Option<&str>,
    dpd: Option<i32>,
    outstanding_amount: Option<f64>,
) -> Result<(), AppError> {
    if borrower_name.is_some_and(is_blank) {
        return Err(AppError::field("borrower_name", "borrower_name must not be empty"));
    }
    if let Some(mobile) = borrower_mobile {
        if !is_valid_mobile(mobile) {
            return Err(AppError::field(
                "borrower_mobile",
                "borrower_mobile must be a 10-digit mobile number",
            ));
        }
    }
    if let Some(email) = borrower_email {
        if !is_valid_email(email) {
            return Err(AppError::field("borrower_email", "borrower_email is not a valid address"));
        }
    }
    if dpd.is_some_and(|d| d < 0) {
        return Err(AppError::field("dpd", "dpd must be >= 0"));
    }
    if let Some(amount) = outstanding_amount {
        if !amount.is_finite() || amount < 0.0 {
            return Err(AppError::field(
                "outstanding_amount",
                "outstanding_amount must be >= 0",
            ));
        }
    }
    Ok(())
}

fn check_dates(
    filing_date: Option<NaiveDate>,
    next_hearing_date: Option<NaiveDate>,
    closed_date: Option<NaiveDate>,
) -> Result<(), AppError> {
    check_case_dates(today(), filing_date, next_hearing_date, closed_date)
        .map_err(|(field, message)| AppError::field(field, message))
}

async fn require_master_data(
    pool: &Pool<Postgres>,
    state_code: Option<&str>,
    product_code: Option<&str>,
    language_code: Option<&str>,
) -> Result<(), AppError> {
    if let Some(code) = state_code {
        let found = crate::repo::state::find_by_code(pool, code).await?;
        if !found.is_some_and(|s| s.is_active) {
            return Err(AppError::bad_request(format!("Unknown or inactive state_code: {}", code)));
        }
    }
    if let Some(code) = product_code {
        let found = crate::repo::product::find_by_code(pool, code).await?;
        if !found.is_some_and(|p| p.is_active) {
            return Err(AppError::bad_request(format!(
                "Unknown or inactive product_code: {}",
                code
            )));
        }
    }
    if let Some(code) = language_code {
        let found = crate::repo::language::find_by_code(pool, code).await?;
        if !found.is_some_and(|l| l.is_active) {
            return Err(AppError::bad_request(format!(
                "Unknown or inactive language_code: {}",
                code
            )));
        }
    }
    Ok(())
}

/// Normalise a create request in place: trimmed text, uppercase state and
/// product codes, lowercase language.
pub fn normalize_create(req: &mut CreateLegalCaseRequest) {
    req.loan_account_number = req.loan_account_number.trim().to_string();
    req.borrower_name = req.borrower_name.trim().to_string();
    req.borrower_mobile = req.borrower_mobile.trim().to_string();
    req.borrower_email = trimmed(req.borrower_email.take());
    req.borrower_address = req.borrower_address.trim().to_string();
    req.state_code = req.state_code.trim().to_uppercase();
    req.product_code = req.product_code.trim().to_uppercase();
    req.language_code = req.language_code.trim().to_lowercase();
    req.case_type = req.case_type.trim().to_string();
    req.court_name = trimmed(req.court_name.take());
    req.court_case_number = trimmed(req.court_case_number.take());
    req.remarks = trimmed(req.remarks.take());
}

/// Checks that need no database access.
pub fn validate_create(req: &CreateLegalCaseRequest) -> Result<(), AppError> {
    if is_blank(&req.loan_account_number) {
        return Err(AppError::field(
            "loan_account_number",
            "loan_account_number must not be empty",
        ));
    }
    if !is_valid_case_type(&req.case_type) {
        return Err(AppError::invalid_choice("case_type", &req.case_type, CASE_TYPES));
    }
    check_borrower_fields(
        Some(&req.borrower_name),
        Some(&req.borrower_mobile),
        req.borrower_email.as_deref(),
        Some(req.dpd),
        Some(req.outstanding_amount),
    )?;
    check_dates(req.filing_date, req.next_hearing_date, None)
}

pub async fn create_case(
    pool: &Pool<Postgres>,
    mut req: CreateLegalCaseRequest,
    actor: &str,
) -> Result<LegalCase, AppError> {
    normalize_create(&mut req);
    validate_create(&req)?;
    require_master_data(
        pool,
        Some(&req.state_code),
        Some(&req.product_code),
        Some(&req.language_code),
    )
    .await?;
    crate::services::validation::enforce(pool, &req.case_type, req.dpd, req.outstanding_amount)
        .await?;

    if crate::repo::legal_case::has_open_case(pool, &req.loan_account_number, &req.case_type).await? {
        return Err(AppError::conflict(format!(
            "An open {} case already exists for loan account {}",
            req.case_type, req.loan_account_number
        )));
    }

    let date = today();
    let mut tx = pool.begin().await.map_err(SqlxErrorExt::into_app_error)?;
    let seq = crate::repo::legal_case::next_sequence(&mut *tx, date).await?;
    let case_id = format_case_id(date, seq);
    let case = crate::repo::legal_case::create(&mut *tx, &case_id, &req, actor).await?;
    crate::repo::legal_case::insert_history(&mut *tx, case.id, None, "draft", Some("Case created"), actor)
        .await?;
    tx.commit().await.map_err(SqlxErrorExt::into_app_error)?;

    tracing::info!(case_id = %case.case_id, case_type = %case.case_type, "legal case created");
    Ok(case)
}

pub async fn update_case(
    pool: &Pool<Postgres>,
    id: Uuid,
    mut req: UpdateLegalCaseRequest,
    actor: &str,
) -> Result<LegalCase, AppError> {
    let case = crate::repo::legal_case::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Legal case {} not found", id)))?;

    if case.is_read_only() {
        return Err(AppError::conflict(format!(
            "Case {} is {} and cannot be modified",
            case.case_id, case.status
        )));
    }

    req.borrower_name = req.borrower_name.map(|s| s.trim().to_string());
    req.borrower_mobile = req.borrower_mobile.map(|s| s.trim().to_string());
    req.borrower_email = trimmed(req.borrower_email);
    req.language_code = req.language_code.map(|s| s.trim().to_lowercase());

    check_borrower_fields(
        req.borrower_name.as_deref(),
        req.borrower_mobile.as_deref(),
        req.borrower_email.as_deref(),
        req.dpd,
        req.outstanding_amount,
    )?;
    check_dates(
        req.filing_date.or(case.filing_date),
        req.next_hearing_date.or(case.next_hearing_date),
        case.closed_date,
    )?;
    require_master_data(pool, None, None, req.language_code.as_deref()).await?;
    crate::services::validation::enforce(
        pool,
        &case.case_type,
        req.dpd.unwrap_or(case.dpd),
        req.outstanding_amount.unwrap_or(case.outstanding_amount),
    )
    .await?;

    crate::repo::legal_case::update(pool, id, &req, actor)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Legal case {} not found", id)))
}

/// Closure date for a terminal transition.
pub fn resolve_closed_date(
    case: &LegalCase,
    requested: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<NaiveDate, AppError> {
    let closed = requested.unwrap_or(today);
    if closed > today {
        return Err(AppError::field("closed_date", "closed_date cannot be in the future"));
    }
    if let Some(filed) = case.filing_date {
        if closed < filed {
            return Err(AppError::field(
                "closed_date",
                format!("closed_date ({}) cannot be before filing_date ({})", closed, filed),
            ));
        }
    }
    Ok(closed)
}

/// Move a case to a new status, recording history. Entering a terminal
/// status stamps `closed_date` and ends any active allocation.
pub async fn change_status(
    pool: &Pool<Postgres>,
    id: Uuid,
    to: &str,
    remarks: Option<String>,
    closed_date: Option<NaiveDate>,
    actor: &str,
) -> Result<LegalCase, AppError> {
    if !is_valid_case_status(to) {
        return Err(AppError::invalid_choice("status", to, CASE_STATUSES));
    }

    let mut tx = pool.begin().await.map_err(SqlxErrorExt::into_app_error)?;
    let case = crate::repo::legal_case::lock(&mut *tx, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Legal case {} not found", id)))?;

    if !can_transition(&case.status, to) {
        return Err(AppError::conflict(format!(
            "Cannot move case {} from {} to {}",
            case.case_id, case.status, to
        )));
    }

    let closed = if is_terminal_status(to) {
        let closed = resolve_closed_date(&case, closed_date, today())?;
        crate::repo::allocation::deactivate_for_case(&mut *tx, id, &format!("Case {}", to)).await?;
        Some(closed)
    } else {
        None
    };

    let remarks = trimmed(remarks);
    let updated = crate::repo::legal_case::set_status(&mut *tx, id, to, closed, actor).await?;
    crate::repo::legal_case::insert_history(
        &mut *tx,
        id,
        Some(&case.status),
        to,
        remarks.as_deref(),
        actor,
    )
    .await?;
    tx.commit().await.map_err(SqlxErrorExt::into_app_error)?;

    tracing::info!(case_id = %case.case_id, from = %case.status, to, "case status changed");
    Ok(updated)
}

/// Record a hearing. The first hearing on a `filed` case moves it to
/// `hearing`.
pub async fn add_hearing(
    pool: &Pool<Postgres>,
    id: Uuid,
    req: AddHearingRequest,
    actor: &str,
) -> Result<CaseHearing, AppError> {
    if is_blank(&req.outcome) {
        return Err(AppError::field("outcome", "outcome must not be empty"));
    }
    if let Some(next) = req.next_hearing_date {
        if next < req.hearing_date {
            return Err(AppError::field(
                "next_hearing_date",
                "next_hearing_date cannot be before hearing_date",
            ));
        }
    }

    let mut tx = pool.begin().await.map_err(SqlxErrorExt::into_app_error)?;
    let case = crate::repo::legal_case::lock(&mut *tx, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Legal case {} not found", id)))?;

    if !accepts_hearings(&case.status) {
        return Err(AppError::conflict(format!(
            "Hearings cannot be recorded for a {} case",
            case.status
        )));
    }
    if let Some(filed) = case.filing_date {
        if req.hearing_date < filed {
            return Err(AppError::field(
                "hearing_date",
                format!("hearing_date ({}) cannot be before filing_date ({})", req.hearing_date, filed),
            ));
        }
    }

    let hearing = crate::repo::hearing::create(&mut *tx, id, &req, actor).await?;
    if req.next_hearing_date.is_some() {
        crate::repo::legal_case::set_next_hearing(&mut *tx, id, req.next_hearing_date, actor)
            .await?;
    }

    if case.status == "filed" {
        crate::repo::legal_case::set_status(&mut *tx, id, "hearing", None, actor).await?;
        crate::repo::legal_case::insert_history(
            &mut *tx,
            id,
            Some("filed"),
            "hearing",
            Some("First hearing recorded"),
            actor,
        )
        .await?;
    }
    tx.commit().await.map_err(SqlxErrorExt::into_app_error)?;

    Ok(hearing)
}

/// Soft delete. Refused while a lawyer is allocated.
pub async fn delete_case(pool: &Pool<Postgres>, id: Uuid, actor: &str) -> Result<(), AppError> {
    let case = crate::repo::legal_case::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Legal case {} not found", id)))?;

    if case.assigned_lawyer_id.is_some() {
        return Err(AppError::conflict(format!(
            "Case {} has an active lawyer allocation",
            case.case_id
        )));
    }

    if !crate::repo::legal_case::soft_delete(pool, id, actor).await? {
        return Err(AppError::not_found(format!("Legal case {} not found", id)));
    }
    tracing::info!(case_id = %case.case_id, "legal case deleted");
    Ok(())
}
