use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Validation constants ────────────────────────────────────────────

/// What a trigger rule observes on a case.
pub const TRIGGER_TYPES: &[&str] = &[
    "dpd_threshold",
    "outstanding_threshold",
    "hearing_within_days",
    "status_equals",
];

pub const TRIGGER_COMPARISONS: &[&str] = &["gte", "lte", "eq"];

pub const TRIGGER_ACTIONS: &[&str] = &["send_sms", "generate_notice", "flag_only"];

/// Recorded outcome of one firing.
pub const TRIGGER_OUTCOMES: &[&str] = &["succeeded", "failed", "flagged"];

pub fn is_valid_trigger_type(s: &str) -> bool {
    TRIGGER_TYPES.contains(&s)
}

pub fn is_valid_trigger_comparison(s: &str) -> bool {
    TRIGGER_COMPARISONS.contains(&s)
}

pub fn is_valid_trigger_action(s: &str) -> bool {
    TRIGGER_ACTIONS.contains(&s)
}

// ── DB row structs ──────────────────────────────────────────────────

/// A rule that fires an action when a case crosses a threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct TriggerRule {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub trigger_type: String,
    pub comparison: String,
    /// Ignored for `status_equals`.
    pub threshold: f64,
    pub status_value: Option<String>,
    pub action: String,
    pub sms_template_code: Option<String>,
    pub notice_template_code: Option<String>,
    /// Lower numbers run first.
    pub priority: i32,
    pub is_active: bool,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One recorded firing of a trigger rule against a case.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct TriggerEvent {
    pub id: Uuid,
    pub case_id: Uuid,
    pub rule_id: Uuid,
    pub rule_code: String,
    pub action: String,
    pub observed_value: String,
    pub outcome: String,
    pub detail: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ── API response types ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TriggerRuleResponse {
    pub id: String,
    pub code: String,
    pub name: String,
    pub trigger_type: String,
    pub comparison: String,
    pub threshold: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_value: Option<String>,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sms_template_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice_template_code: Option<String>,
    pub priority: i32,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<TriggerRule> for TriggerRuleResponse {
    fn from(r: TriggerRule) -> Self {
        Self {
            id: r.id.to_string(),
            code: r.code,
            name: r.name,
            trigger_type: r.trigger_type,
            comparison: r.comparison,
            threshold: r.threshold,
            status_value: r.status_value,
            action: r.action,
            sms_template_code: r.sms_template_code,
            notice_template_code: r.notice_template_code,
            priority: r.priority,
            is_active: r.is_active,
            created_at: r.created_at.to_rfc3339(),
            updated_at: r.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TriggerEventResponse {
    pub id: String,
    pub case_id: String,
    pub rule_id: String,
    pub rule_code: String,
    pub action: String,
    pub observed_value: String,
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub created_at: String,
}

impl From<TriggerEvent> for TriggerEventResponse {
    fn from(e: TriggerEvent) -> Self {
        Self {
            id: e.id.to_string(),
            case_id: e.case_id.to_string(),
            rule_id: e.rule_id.to_string(),
            rule_code: e.rule_code,
            action: e.action,
            observed_value: e.observed_value,
            outcome: e.outcome,
            detail: e.detail,
            created_at: e.created_at.to_rfc3339(),
        }
    }
}

/// A rule that matched a case during detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DetectedTrigger {
    pub rule_id: String,
    pub rule_code: String,
    pub rule_name: String,
    pub trigger_type: String,
    pub action: String,
    pub priority: i32,
    /// The case value the rule compared, rendered as text.
    pub observed_value: String,
}

/// Result of `POST /api/triggers/run`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TriggerRunSummary {
    pub cases_evaluated: usize,
    pub triggers_fired: usize,
    pub actions_succeeded: usize,
    pub actions_failed: usize,
    pub events: Vec<TriggerEventResponse>,
}

// ── Request types ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateTriggerRuleRequest {
    pub code: String,
    pub name: String,
    pub trigger_type: String,
    #[serde(default = "default_comparison")]
    pub comparison: String,
    #[serde(default)]
    pub threshold: f64,
    #[serde(default)]
    pub status_value: Option<String>,
    pub action: String,
    #[serde(default)]
    pub sms_template_code: Option<String>,
    #[serde(default)]
    pub notice_template_code: Option<String>,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub is_active: Option<bool>,
}

fn default_comparison() -> String {
    "gte".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateTriggerRuleRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sms_template_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notice_template_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// Optional scope for a trigger run. All open cases when absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TriggerRunRequest {
    #[serde(default)]
    pub case_ids: Option<Vec<Uuid>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_lists() {
        assert!(is_valid_trigger_type("hearing_within_days"));
        assert!(!is_valid_trigger_type("dpd"));
        assert!(is_valid_trigger_comparison("lte"));
        assert!(!is_valid_trigger_comparison("gt"));
        assert!(is_valid_trigger_action("flag_only"));
        assert!(!is_valid_trigger_action("email"));
    }

    #[test]
    fn create_defaults_comparison_to_gte() {
        let req: CreateTriggerRuleRequest = serde_json::from_str(
            r#"{"code":"DPD90","name":"DPD over 90","trigger_type":"dpd_threshold","threshold":90,"action":"flag_only"}"#,
        )
        .unwrap();
        assert_eq!(req.comparison, "gte");
        assert_eq!(req.priority, 0);
        assert_eq!(req.threshold, 90.0);
    }

    #[test]
    fn run_request_scope_is_optional() {
        let req: TriggerRunRequest = serde_json::from_str("{}").unwrap();
        assert!(req.case_ids.is_none());
    }
}
