use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "validation")]
use validator::Validate;

// ── DB row structs ──────────────────────────────────────────────────

/// Panel lawyer row from the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct Lawyer {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub bar_registration_number: String,
    /// States in which the lawyer takes cases.
    pub state_codes: Vec<String>,
    pub language_codes: Vec<String>,
    pub max_active_cases: i32,
    pub is_active: bool,
    pub is_deleted: bool,
    pub created_by: String,
    pub updated_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lawyer {
    pub fn covers_state(&self, state_code: &str) -> bool {
        self.state_codes.iter().any(|s| s == state_code)
    }

    pub fn speaks(&self, language_code: &str) -> bool {
        self.language_codes.iter().any(|l| l == language_code)
    }
}

/// Assignment of a lawyer to a case. At most one active row per case.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct LawyerAllocation {
    pub id: Uuid,
    pub case_id: Uuid,
    pub lawyer_id: Uuid,
    pub allocated_at: DateTime<Utc>,
    pub allocated_by: String,
    pub deallocated_at: Option<DateTime<Utc>>,
    pub deallocation_reason: Option<String>,
    pub is_active: bool,
}

/// A lawyer together with the number of active allocations they hold.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct LawyerWithLoad {
    #[cfg_attr(feature = "server", sqlx(flatten))]
    pub lawyer: Lawyer,
    pub active_cases: i64,
}

impl LawyerWithLoad {
    pub fn has_capacity(&self) -> bool {
        self.active_cases < i64::from(self.lawyer.max_active_cases)
    }
}

// ── API response types ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct LawyerResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub bar_registration_number: String,
    pub state_codes: Vec<String>,
    pub language_codes: Vec<String>,
    pub max_active_cases: i32,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Lawyer> for LawyerResponse {
    fn from(l: Lawyer) -> Self {
        Self {
            id: l.id.to_string(),
            name: l.name,
            email: l.email,
            phone: l.phone,
            bar_registration_number: l.bar_registration_number,
            state_codes: l.state_codes,
            language_codes: l.language_codes,
            max_active_cases: l.max_active_cases,
            is_active: l.is_active,
            created_at: l.created_at.to_rfc3339(),
            updated_at: l.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AllocationResponse {
    pub id: String,
    pub case_id: String,
    pub lawyer_id: String,
    pub allocated_at: String,
    pub allocated_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deallocated_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deallocation_reason: Option<String>,
    pub is_active: bool,
}

impl From<LawyerAllocation> for AllocationResponse {
    fn from(a: LawyerAllocation) -> Self {
        Self {
            id: a.id.to_string(),
            case_id: a.case_id.to_string(),
            lawyer_id: a.lawyer_id.to_string(),
            allocated_at: a.allocated_at.to_rfc3339(),
            allocated_by: a.allocated_by,
            deallocated_at: a.deallocated_at.map(|d| d.to_rfc3339()),
            deallocation_reason: a.deallocation_reason,
            is_active: a.is_active,
        }
    }
}

/// Current load of one lawyer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct LawyerWorkload {
    pub lawyer_id: String,
    pub name: String,
    pub active_cases: i64,
    pub max_active_cases: i32,
    /// Active cases as a percentage of capacity, rounded to one decimal.
    pub utilisation_percent: f64,
}

impl From<LawyerWithLoad> for LawyerWorkload {
    fn from(w: LawyerWithLoad) -> Self {
        let utilisation_percent = utilisation(w.active_cases, w.lawyer.max_active_cases);
        Self {
            lawyer_id: w.lawyer.id.to_string(),
            name: w.lawyer.name,
            active_cases: w.active_cases,
            max_active_cases: w.lawyer.max_active_cases,
            utilisation_percent,
        }
    }
}

/// Percentage of capacity in use, rounded to one decimal place.
pub fn utilisation(active: i64, capacity: i32) -> f64 {
    if capacity <= 0 {
        return 0.0;
    }
    let pct = active as f64 * 100.0 / f64::from(capacity);
    (pct * 10.0).round() / 10.0
}

// ── Request types ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "validation", derive(Validate))]
pub struct CreateLawyerRequest {
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, max = 200, message = "name must be 1-200 characters"))
    )]
    pub name: String,
    #[cfg_attr(
        feature = "validation",
        validate(email(message = "email must be a valid address"))
    )]
    pub email: String,
    pub phone: String,
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, max = 50, message = "bar_registration_number must be 1-50 characters"))
    )]
    pub bar_registration_number: String,
    #[serde(default)]
    pub state_codes: Vec<String>,
    #[serde(default)]
    pub language_codes: Vec<String>,
    #[cfg_attr(
        feature = "validation",
        validate(range(min = 1, message = "max_active_cases must be greater than 0"))
    )]
    pub max_active_cases: i32,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateLawyerRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_codes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_codes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_active_cases: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AllocateLawyerRequest {
    pub lawyer_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ReassignLawyerRequest {
    pub lawyer_id: Uuid,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DeallocateLawyerRequest {
    pub reason: String,
}

/// Query parameters for listing lawyers.
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct LawyerListParams {
    pub active: Option<bool>,
    pub state_code: Option<String>,
    pub language_code: Option<String>,
}
