//! Lawyer allocation: allocate, reassign, deallocate and auto-allocate.
//!
//! Each operation runs in one transaction and locks the lawyer row while
//! checking capacity.

use shared_types::{AppError, LawyerAllocation, LawyerWithLoad, LegalCase};
use sqlx::{PgConnection, Pool, Postgres};
use uuid::Uuid;

use crate::error_convert::SqlxErrorExt;

/// Whether `lawyer` may take `case`. Does not look at existing allocations.
pub fn check_can_allocate(case: &LegalCase, lawyer: &LawyerWithLoad) -> Result<(), AppError> {
    if case.is_terminal() {
        return Err(AppError::conflict(format!(
            "Case {} is {} and cannot be allocated",
            case.case_id, case.status
        )));
    }
    if !lawyer.lawyer.is_active {
        return Err(AppError::bad_request(format!(
            "Lawyer {} is inactive",
            lawyer.lawyer.name
        )));
    }
    if !lawyer.lawyer.covers_state(&case.state_code) {
        return Err(AppError::bad_request(format!(
            "Lawyer {} does not cover state {}",
            lawyer.lawyer.name, case.state_code
        )));
    }
    if !lawyer.has_capacity() {
        return Err(AppError::conflict(format!(
            "Lawyer {} is at capacity ({} of {} active cases)",
            lawyer.lawyer.name, lawyer.active_cases, lawyer.lawyer.max_active_cases
        )));
    }
    Ok(())
}

/// Pick the best lawyer for a case from a candidate pool.
///
/// Only active lawyers covering the case state with spare capacity qualify.
/// Lawyers who speak the case language come first, then fewest active
/// cases, then name.
pub fn select_candidate(
    candidates: Vec<LawyerWithLoad>,
    state_code: &str,
    language_code: &str,
) -> Option<LawyerWithLoad> {
    candidates
        .into_iter()
        .filter(|c| c.lawyer.is_active && c.lawyer.covers_state(state_code) && c.has_capacity())
        .min_by(|a, b| {
            let a_key = (!a.lawyer.speaks(language_code), a.active_cases);
            let b_key = (!b.lawyer.speaks(language_code), b.active_cases);
            a_key
                .cmp(&b_key)
                .then_with(|| a.lawyer.name.cmp(&b.lawyer.name))
        })
}

async fn load_case(conn: &mut PgConnection, case_id: Uuid) -> Result<LegalCase, AppError> {
    crate::repo::legal_case::find_by_id(&mut *conn, case_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Legal case {} not found", case_id)))
}

/// Lock the lawyer, re-check everything and insert the allocation.
async fn allocate_locked(
    conn: &mut PgConnection,
    case: &LegalCase,
    lawyer_id: Uuid,
    actor: &str,
) -> Result<LawyerAllocation, AppError> {
    let lawyer = crate::repo::lawyer::lock_with_load(&mut *conn, lawyer_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Lawyer {} not found", lawyer_id)))?;

    check_can_allocate(case, &lawyer)?;

    crate::repo::allocation::create(&mut *conn, case.id, lawyer_id, actor).await
}

async fn ensure_unallocated(conn: &mut PgConnection, case: &LegalCase) -> Result<(), AppError> {
    if crate::repo::allocation::active_for_case(&mut *conn, case.id)
        .await?
        .is_some()
    {
        return Err(AppError::conflict(format!(
            "Case {} already has an active allocation",
            case.case_id
        )));
    }
    Ok(())
}

pub async fn allocate(
    pool: &Pool<Postgres>,
    case_id: Uuid,
    lawyer_id: Uuid,
    actor: &str,
) -> Result<LawyerAllocation, AppError> {
    let mut tx = pool.begin().await.map_err(SqlxErrorExt::into_app_error)?;

    let case = load_case(&mut tx, case_id).await?;
    ensure_unallocated(&mut tx, &case).await?;
    let allocation = allocate_locked(&mut tx, &case, lawyer_id, actor).await?;

    tx.commit().await.map_err(SqlxErrorExt::into_app_error)?;
    tracing::info!(case_id = %case.case_id, %lawyer_id, "lawyer allocated");
    Ok(allocation)
}

/// End the current allocation and allocate another lawyer in one step.
pub async fn reassign(
    pool: &Pool<Postgres>,
    case_id: Uuid,
    lawyer_id: Uuid,
    reason: &str,
    actor: &str,
) -> Result<LawyerAllocation, AppError> {
    if reason.trim().is_empty() {
        return Err(AppError::field("reason", "reason is required"));
    }

    let mut tx = pool.begin().await.map_err(SqlxErrorExt::into_app_error)?;

    let case = load_case(&mut tx, case_id).await?;
    let current = crate::repo::allocation::active_for_case(&mut *tx, case_id)
        .await?
        .ok_or_else(|| {
            AppError::conflict(format!("Case {} has no active allocation", case.case_id))
        })?;

    if current.lawyer_id == lawyer_id {
        return Err(AppError::conflict(format!(
            "Case {} is already allocated to lawyer {}",
            case.case_id, lawyer_id
        )));
    }

    crate::repo::allocation::deactivate(&mut *tx, current.id, reason.trim()).await?;
    let allocation = allocate_locked(&mut tx, &case, lawyer_id, actor).await?;

    tx.commit().await.map_err(SqlxErrorExt::into_app_error)?;
    tracing::info!(
        case_id = %case.case_id,
        from = %current.lawyer_id,
        to = %lawyer_id,
        "lawyer reassigned"
    );
    Ok(allocation)
}

pub async fn deallocate(
    pool: &Pool<Postgres>,
    case_id: Uuid,
    reason: &str,
) -> Result<LawyerAllocation, AppError> {
    if reason.trim().is_empty() {
        return Err(AppError::field("reason", "reason is required"));
    }

    let current = crate::repo::allocation::active_for_case(pool, case_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("No active allocation for case {}", case_id)))?;

    let ended = crate::repo::allocation::deactivate(pool, current.id, reason.trim()).await?;
    tracing::info!(%case_id, lawyer_id = %ended.lawyer_id, "lawyer deallocated");
    Ok(ended)
}

/// Allocate the best available lawyer. 409 when nobody qualifies.
pub async fn auto_allocate(
    pool: &Pool<Postgres>,
    case_id: Uuid,
    actor: &str,
) -> Result<LawyerAllocation, AppError> {
    let mut tx = pool.begin().await.map_err(SqlxErrorExt::into_app_error)?;

    let case = load_case(&mut tx, case_id).await?;
    if case.is_terminal() {
        return Err(AppError::conflict(format!(
            "Case {} is {} and cannot be allocated",
            case.case_id, case.status
        )));
    }
    ensure_unallocated(&mut tx, &case).await?;

    let candidates = crate::repo::lawyer::candidates_for_state(&mut *tx, &case.state_code).await?;
    let chosen = select_candidate(candidates, &case.state_code, &case.language_code)
        .ok_or_else(|| {
            AppError::conflict(format!(
                "No active lawyer with spare capacity covers state {}",
                case.state_code
            ))
        })?;

    let allocation = allocate_locked(&mut tx, &case, chosen.lawyer.id, actor).await?;

    tx.commit().await.map_err(SqlxErrorExt::into_app_error)?;
    tracing::info!(
        case_id = %case.case_id,
        lawyer = %chosen.lawyer.name,
        "lawyer auto-allocated"
    );
    Ok(allocation)
}
