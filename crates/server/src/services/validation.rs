//! Configurable numeric rules applied when cases are written.

use std::collections::HashMap;

use shared_types::{AppError, EvaluateValidationResponse, RuleViolation, ValidationRule};
use sqlx::{Pool, Postgres};

/// Compare `actual` against `expected` with a rule operator.
/// Unknown operators never pass.
pub fn passes(operator: &str, actual: f64, expected: f64) -> bool {
    match operator {
        "gte" => actual >= expected,
        "lte" => actual <= expected,
        "gt" => actual > expected,
        "lt" => actual < expected,
        "eq" => (actual - expected).abs() < f64::EPSILON,
        _ => false,
    }
}

fn applies_to(rule: &ValidationRule, case_type: &str) -> bool {
    rule.is_active && rule.case_type.as_deref().map_or(true, |scope| scope == case_type)
}

/// Evaluate every applicable rule, in order.
pub fn evaluate(
    rules: &[ValidationRule],
    case_type: &str,
    dpd: i32,
    outstanding_amount: f64,
) -> EvaluateValidationResponse {
    let mut rules_checked = 0;
    let mut violations = Vec::new();

    for rule in rules.iter().filter(|r| applies_to(r, case_type)) {
        let actual = match rule.field.as_str() {
            "dpd" => f64::from(dpd),
            "outstanding_amount" => outstanding_amount,
            _ => continue,
        };
        rules_checked += 1;
        if !passes(&rule.operator, actual, rule.value) {
            violations.push(RuleViolation {
                rule_id: rule.id.to_string(),
                field: rule.field.clone(),
                message: rule.message.clone(),
            });
        }
    }

    EvaluateValidationResponse {
        valid: violations.is_empty(),
        rules_checked,
        violations,
    }
}

/// Turn violations into a 422 keyed by field.
pub fn violations_to_error(violations: Vec<RuleViolation>) -> Result<(), AppError> {
    if violations.is_empty() {
        return Ok(());
    }
    let mut field_errors: HashMap<String, String> = HashMap::new();
    for v in violations {
        field_errors
            .entry(v.field)
            .and_modify(|m| {
                m.push_str("; ");
                m.push_str(&v.message);
            })
            .or_insert(v.message);
    }
    Err(AppError::validation("Case failed validation rules", field_errors))
}

/// Load active rules and reject the values if any rule fails.
pub async fn enforce(
    pool: &Pool<Postgres>,
    case_type: &str,
    dpd: i32,
    outstanding_amount: f64,
) -> Result<(), AppError> {
    let rules = crate::repo::validation_rule::list_active(pool).await?;
    let result = evaluate(&rules, case_type, dpd, outstanding_amount);
    if !result.valid {
        tracing::debug!(case_type, violations = result.violations.len(), "validation rules failed");
    }
    violations_to_error(result.violations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn rule(field: &str, operator: &str, value: f64, case_type: Option<&str>) -> ValidationRule {
        ValidationRule {
            id: Uuid::new_v4(),
            name: format!("{} {} {}", field, operator, value),
            field: field.to_string(),
            operator: operator.to_string(),
            value,
            case_type: case_type.map(str::to_string),
            message: format!("{} must be {} {}", field, operator, value),
            is_active: true,
            is_deleted: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn operators() {
        assert!(passes("gte", 90.0, 90.0));
        assert!(!passes("gt", 90.0, 90.0));
        assert!(passes("lte", 5.0, 10.0));
        assert!(passes("lt", 5.0, 10.0));
        assert!(passes("eq", 10.0, 10.0));
        assert!(!passes("between", 10.0, 10.0));
    }

    #[test]
    fn scoped_rules_only_apply_to_their_case_type() {
        let rules = vec![
            rule("dpd", "gte", 90.0, Some("section_138")),
            rule("outstanding_amount", "gt", 0.0, None),
        ];
        let r = evaluate(&rules, "arbitration", 30, 1000.0);
        assert_eq!(r.rules_checked, 1);
        assert!(r.valid);

        let r = evaluate(&rules, "section_138", 30, 1000.0);
        assert_eq!(r.rules_checked, 2);
        assert!(!r.valid);
        assert_eq!(r.violations[0].field, "dpd");
    }

    #[test]
    fn inactive_rules_are_skipped() {
        let mut r = rule("dpd", "gte", 90.0, None);
        r.is_active = false;
        assert_eq!(evaluate(&[r], "sarfaesi", 0, 0.0).rules_checked, 0);
    }

    #[test]
    fn violations_become_field_errors() {
        let rules = vec![
            rule("dpd", "gte", 90.0, None),
            rule("dpd", "lte", 10.0, None),
            rule("outstanding_amount", "gte", 50000.0, None),
        ];
        let result = evaluate(&rules, "civil_suit", 60, 1000.0);
        assert_eq!(result.violations.len(), 3);
        let err = violations_to_error(result.violations).unwrap_err();
        assert_eq!(err.field_errors.len(), 2);
        assert!(err.field_errors["dpd"].contains("; "));
    }
}
