use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Case fields a validation rule may constrain.
pub const VALIDATION_FIELDS: &[&str] = &["dpd", "outstanding_amount"];

pub const VALIDATION_OPERATORS: &[&str] = &["gte", "lte", "gt", "lt", "eq"];

pub fn is_valid_validation_field(s: &str) -> bool {
    VALIDATION_FIELDS.contains(&s)
}

pub fn is_valid_validation_operator(s: &str) -> bool {
    VALIDATION_OPERATORS.contains(&s)
}

/// A configurable numeric check applied when cases are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct ValidationRule {
    pub id: Uuid,
    pub name: String,
    pub field: String,
    pub operator: String,
    pub value: f64,
    /// Restricts the rule to one case type when set.
    pub case_type: Option<String>,
    pub message: String,
    pub is_active: bool,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ValidationRuleResponse {
    pub id: String,
    pub name: String,
    pub field: String,
    pub operator: String,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_type: Option<String>,
    pub message: String,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ValidationRule> for ValidationRuleResponse {
    fn from(r: ValidationRule) -> Self {
        Self {
            id: r.id.to_string(),
            name: r.name,
            field: r.field,
            operator: r.operator,
            value: r.value,
            case_type: r.case_type,
            message: r.message,
            is_active: r.is_active,
            created_at: r.created_at.to_rfc3339(),
            updated_at: r.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateValidationRuleRequest {
    pub name: String,
    pub field: String,
    pub operator: String,
    pub value: f64,
    #[serde(default)]
    pub case_type: Option<String>,
    pub message: String,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateValidationRuleRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// Candidate values to dry-run the active rules against.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct EvaluateValidationRequest {
    pub case_type: String,
    pub dpd: i32,
    pub outstanding_amount: f64,
}

/// A rule the candidate failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RuleViolation {
    pub rule_id: String,
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct EvaluateValidationResponse {
    pub valid: bool,
    pub rules_checked: usize,
    pub violations: Vec<RuleViolation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_and_operators() {
        assert!(is_valid_validation_field("dpd"));
        assert!(!is_valid_validation_field("status"));
        assert!(is_valid_validation_operator("gt"));
        assert!(!is_valid_validation_operator("ne"));
    }
}
