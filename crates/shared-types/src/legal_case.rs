use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Validation constants ────────────────────────────────────────────

/// Valid legal case status values matching the DB CHECK constraint.
pub const CASE_STATUSES: &[&str] = &[
    "draft", "notice_sent", "filed", "hearing", "judgment", "settled", "closed", "withdrawn",
];

/// Valid legal proceeding types matching the DB CHECK constraint.
pub const CASE_TYPES: &[&str] = &[
    "section_138", "arbitration", "sarfaesi", "civil_suit", "criminal_complaint", "conciliation",
];

/// Statuses after which a case is no longer worked.
pub const TERMINAL_STATUSES: &[&str] = &["settled", "closed", "withdrawn"];

/// Statuses in which the case record itself is frozen.
pub const READ_ONLY_STATUSES: &[&str] = &["closed", "withdrawn"];

/// Check whether a status string is a valid case status.
pub fn is_valid_case_status(s: &str) -> bool {
    CASE_STATUSES.contains(&s)
}

/// Check whether a case type string is valid.
pub fn is_valid_case_type(s: &str) -> bool {
    CASE_TYPES.contains(&s)
}

pub fn is_terminal_status(s: &str) -> bool {
    TERMINAL_STATUSES.contains(&s)
}

/// Statuses reachable from `from` in one step.
pub fn allowed_transitions(from: &str) -> &'static [&'static str] {
    match from {
        "draft" => &["notice_sent", "filed", "withdrawn"],
        "notice_sent" => &["filed", "settled", "withdrawn"],
        "filed" => &["hearing", "settled", "withdrawn"],
        "hearing" => &["hearing", "judgment", "settled", "withdrawn"],
        "judgment" => &["closed", "settled"],
        "settled" => &["closed"],
        _ => &[],
    }
}

/// Whether a case may move from `from` to `to`.
pub fn can_transition(from: &str, to: &str) -> bool {
    allowed_transitions(from).contains(&to)
}

/// Whether hearings may be recorded for a case in this status.
pub fn accepts_hearings(status: &str) -> bool {
    matches!(status, "filed" | "hearing" | "judgment")
}

/// Format a human-facing case identifier: `LC-YYYYMMDD-NNNN`.
///
/// Sequence numbers are zero-padded to four digits and keep growing past
/// 9999 without truncation.
pub fn format_case_id(date: NaiveDate, seq: i32) -> String {
    format!("LC-{}-{:04}", date.format("%Y%m%d"), seq)
}

/// Check date ordering rules shared by create and update.
///
/// `closed_date` is only set on settled cases, which stay editable.
/// Returns `(field, message)` for the first violation.
pub fn check_case_dates(
    today: NaiveDate,
    filing_date: Option<NaiveDate>,
    next_hearing_date: Option<NaiveDate>,
    closed_date: Option<NaiveDate>,
) -> Result<(), (&'static str, String)> {
    if let Some(filed) = filing_date {
        if filed > today {
            return Err(("filing_date", "filing_date cannot be in the future".to_string()));
        }
        if let Some(closed) = closed_date {
            if filed > closed {
                return Err((
                    "filing_date",
                    format!("filing_date ({}) cannot be after closed_date ({})", filed, closed),
                ));
            }
        }
        if let Some(next) = next_hearing_date {
            if next < filed {
                return Err((
                    "next_hearing_date",
                    format!(
                        "next_hearing_date ({}) cannot be before filing_date ({})",
                        next, filed
                    ),
                ));
            }
        }
    }
    Ok(())
}

// ── DB row structs ──────────────────────────────────────────────────

/// A loan-recovery legal case.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct LegalCase {
    pub id: Uuid,
    pub case_id: String,
    pub loan_account_number: String,
    pub borrower_name: String,
    pub borrower_mobile: String,
    pub borrower_email: Option<String>,
    pub borrower_address: String,
    pub state_code: String,
    pub product_code: String,
    pub language_code: String,
    pub dpd: i32,
    pub outstanding_amount: f64,
    pub case_type: String,
    pub status: String,
    pub court_name: Option<String>,
    pub court_case_number: Option<String>,
    pub filing_date: Option<NaiveDate>,
    pub next_hearing_date: Option<NaiveDate>,
    pub closed_date: Option<NaiveDate>,
    pub remarks: Option<String>,
    /// Lawyer holding the active allocation, if any (joined, not stored).
    pub assigned_lawyer_id: Option<Uuid>,
    pub is_deleted: bool,
    pub created_by: String,
    pub updated_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LegalCase {
    pub fn is_terminal(&self) -> bool {
        is_terminal_status(&self.status)
    }

    pub fn is_read_only(&self) -> bool {
        READ_ONLY_STATUSES.contains(&self.status.as_str())
    }
}

/// A recorded court hearing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct CaseHearing {
    pub id: Uuid,
    pub case_id: Uuid,
    pub hearing_date: NaiveDate,
    pub outcome: String,
    pub next_hearing_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// One entry in a case's status history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct CaseStatusHistory {
    pub id: Uuid,
    pub case_id: Uuid,
    pub from_status: Option<String>,
    pub to_status: String,
    pub remarks: Option<String>,
    pub changed_by: String,
    pub changed_at: DateTime<Utc>,
}

// ── API response types ──────────────────────────────────────────────

/// API response shape for a legal case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct LegalCaseResponse {
    pub id: String,
    pub case_id: String,
    pub loan_account_number: String,
    pub borrower_name: String,
    pub borrower_mobile: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub borrower_email: Option<String>,
    pub borrower_address: String,
    pub state_code: String,
    pub product_code: String,
    pub language_code: String,
    pub dpd: i32,
    pub outstanding_amount: f64,
    pub case_type: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub court_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub court_case_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filing_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_hearing_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_lawyer_id: Option<String>,
    pub created_by: String,
    pub updated_by: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<LegalCase> for LegalCaseResponse {
    fn from(c: LegalCase) -> Self {
        Self {
            id: c.id.to_string(),
            case_id: c.case_id,
            loan_account_number: c.loan_account_number,
            borrower_name: c.borrower_name,
            borrower_mobile: c.borrower_mobile,
            borrower_email: c.borrower_email,
            borrower_address: c.borrower_address,
            state_code: c.state_code,
            product_code: c.product_code,
            language_code: c.language_code,
            dpd: c.dpd,
            outstanding_amount: c.outstanding_amount,
            case_type: c.case_type,
            status: c.status,
            court_name: c.court_name,
            court_case_number: c.court_case_number,
            filing_date: c.filing_date.map(|d| d.to_string()),
            next_hearing_date: c.next_hearing_date.map(|d| d.to_string()),
            closed_date: c.closed_date.map(|d| d.to_string()),
            remarks: c.remarks,
            assigned_lawyer_id: c.assigned_lawyer_id.map(|u| u.to_string()),
            created_by: c.created_by,
            updated_by: c.updated_by,
            created_at: c.created_at.to_rfc3339(),
            updated_at: c.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CaseHearingResponse {
    pub id: String,
    pub case_id: String,
    pub hearing_date: String,
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_hearing_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_by: String,
    pub created_at: String,
}

impl From<CaseHearing> for CaseHearingResponse {
    fn from(h: CaseHearing) -> Self {
        Self {
            id: h.id.to_string(),
            case_id: h.case_id.to_string(),
            hearing_date: h.hearing_date.to_string(),
            outcome: h.outcome,
            next_hearing_date: h.next_hearing_date.map(|d| d.to_string()),
            notes: h.notes,
            created_by: h.created_by,
            created_at: h.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CaseStatusHistoryResponse {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_status: Option<String>,
    pub to_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    pub changed_by: String,
    pub changed_at: String,
}

impl From<CaseStatusHistory> for CaseStatusHistoryResponse {
    fn from(h: CaseStatusHistory) -> Self {
        Self {
            id: h.id.to_string(),
            from_status: h.from_status,
            to_status: h.to_status,
            remarks: h.remarks,
            changed_by: h.changed_by,
            changed_at: h.changed_at.to_rfc3339(),
        }
    }
}

/// Count of cases grouped by one attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct GroupCount {
    pub key: String,
    pub count: i64,
}

/// Portfolio-level case statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CaseStatistics {
    pub total: i64,
    pub by_status: Vec<GroupCount>,
    pub by_case_type: Vec<GroupCount>,
    pub total_outstanding: f64,
}

// ── Request types ───────────────────────────────────────────────────

/// Request to open a new legal case.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateLegalCaseRequest {
    pub loan_account_number: String,
    pub borrower_name: String,
    pub borrower_mobile: String,
    #[serde(default)]
    pub borrower_email: Option<String>,
    #[serde(default)]
    pub borrower_address: String,
    pub state_code: String,
    pub product_code: String,
    pub language_code: String,
    pub dpd: i32,
    pub outstanding_amount: f64,
    pub case_type: String,
    #[serde(default)]
    pub court_name: Option<String>,
    #[serde(default)]
    pub court_case_number: Option<String>,
    #[serde(default)]
    pub filing_date: Option<NaiveDate>,
    #[serde(default)]
    pub next_hearing_date: Option<NaiveDate>,
    #[serde(default)]
    pub remarks: Option<String>,
}

/// Partial update of a legal case. Status changes go through the
/// dedicated status endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateLegalCaseRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub borrower_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub borrower_mobile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub borrower_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub borrower_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dpd: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outstanding_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub court_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub court_case_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filing_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_hearing_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateCaseStatusRequest {
    pub status: String,
    #[serde(default)]
    pub remarks: Option<String>,
    /// Closure date for settled/closed/withdrawn; defaults to today.
    #[serde(default)]
    pub closed_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AddHearingRequest {
    pub hearing_date: NaiveDate,
    pub outcome: String,
    #[serde(default)]
    pub next_hearing_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Query parameters for case search.
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct CaseSearchParams {
    pub status: Option<String>,
    pub case_type: Option<String>,
    pub state_code: Option<String>,
    pub product_code: Option<String>,
    pub min_dpd: Option<i32>,
    pub max_dpd: Option<i32>,
    pub lawyer_id: Option<Uuid>,
    /// Matches borrower name, loan account number or case id.
    pub q: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
