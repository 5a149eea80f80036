//! Trigger detection and execution.

use chrono::{NaiveDate, Utc};
use shared_types::{
    AppError, DetectedTrigger, GenerateNoticeRequest, LegalCase, TriggerEventResponse, TriggerRule,
    TriggerRunRequest, TriggerRunSummary,
};

use crate::actor::Actor;
use crate::db::AppState;
use crate::repo::trigger_event::NewTriggerEvent;

fn compare(comparison: &str, observed: f64, threshold: f64) -> bool {
    match comparison {
        "gte" => observed >= threshold,
        "lte" => observed <= threshold,
        "eq" => (observed - threshold).abs() < f64::EPSILON,
        _ => false,
    }
}

/// The value `rule` observes on `case`, if the rule matches.
///
/// `hearing_within_days` counts days from `today` to the next hearing; a
/// missing or past hearing never matches.
pub fn observe(rule: &TriggerRule, case: &LegalCase, today: NaiveDate) -> Option<String> {
    match rule.trigger_type.as_str() {
        "dpd_threshold" => {
            compare(&rule.comparison, f64::from(case.dpd), rule.threshold).then(|| case.dpd.to_string())
        }
        "outstanding_threshold" => compare(&rule.comparison, case.outstanding_amount, rule.threshold)
            .then(|| format!("{:.2}", case.outstanding_amount)),
        "hearing_within_days" => {
            let days = (case.next_hearing_date? - today).num_days();
            (days >= 0 && compare(&rule.comparison, days as f64, rule.threshold))
                .then(|| days.to_string())
        }
        "status_equals" => {
            let wanted = rule.status_value.as_deref()?;
            (case.status == wanted).then(|| case.status.clone())
        }
        _ => None,
    }
}

/// Match `rules` against a case in priority order. Inactive rules are
/// ignored.
pub fn detect(rules: &[TriggerRule], case: &LegalCase, today: NaiveDate) -> Vec<DetectedTrigger> {
    let mut ordered: Vec<&TriggerRule> = rules.iter().filter(|r| r.is_active).collect();
    ordered.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.code.cmp(&b.code)));

    ordered
        .into_iter()
        .filter_map(|rule| {
            observe(rule, case, today).map(|observed_value| DetectedTrigger {
                rule_id: rule.id.to_string(),
                rule_code: rule.code.clone(),
                rule_name: rule.name.clone(),
                trigger_type: rule.trigger_type.clone(),
                action: rule.action.clone(),
                priority: rule.priority,
                observed_value,
            })
        })
        .collect()
}

/// Detect the triggers currently matching one case.
pub async fn detect_for_case(
    state: &AppState,
    case: &LegalCase,
) -> Result<Vec<DetectedTrigger>, AppError> {
    let rules = crate::repo::trigger_rule::list_active(&state.pool).await?;
    Ok(detect(&rules, case, Utc::now().date_naive()))
}

/// Outcome of running one action: `(outcome, detail)`.
async fn execute(
    state: &AppState,
    rule: &TriggerRule,
    case: &LegalCase,
    actor: &Actor,
) -> (&'static str, Option<String>) {
    match rule.action.as_str() {
        "send_sms" => {
            let Some(code) = rule.sms_template_code.as_deref() else {
                return ("failed", Some("rule has no sms_template_code".to_string()));
            };
            match crate::services::communication::send_sms(state, case, code, None, actor).await {
                Ok(comm) if comm.status == "sent" => {
                    ("succeeded", Some(format!("communication {}", comm.id)))
                }
                Ok(comm) => (
                    "failed",
                    Some(comm.error_message.unwrap_or_else(|| format!("sms {}", comm.status))),
                ),
                Err(e) => ("failed", Some(e.message)),
            }
        }
        "generate_notice" => {
            let Some(code) = rule.notice_template_code.clone() else {
                return ("failed", Some("rule has no notice_template_code".to_string()));
            };
            let req = GenerateNoticeRequest {
                template_code: code,
                extra: None,
                mask: None,
            };
            let settings = crate::config::notice_settings();
            match crate::services::notice::generate(state, settings, case, req, actor).await {
                Ok(notice) => ("succeeded", Some(format!("notice {}", notice.id))),
                Err(e) => ("failed", Some(e.message)),
            }
        }
        _ => ("flagged", None),
    }
}

/// Evaluate open cases (or the given ones) and run the matching actions.
/// A failing action is recorded and the run continues.
pub async fn run(
    state: &AppState,
    req: TriggerRunRequest,
    actor: &Actor,
) -> Result<TriggerRunSummary, AppError> {
    let pool = &state.pool;
    let rules = crate::repo::trigger_rule::list_active(pool).await?;
    let cases = match req.case_ids {
        Some(ids) if !ids.is_empty() => crate::repo::legal_case::find_open_by_ids(pool, &ids).await?,
        _ => crate::repo::legal_case::list_open(pool).await?,
    };
    let today = Utc::now().date_naive();

    let mut summary = TriggerRunSummary {
        cases_evaluated: cases.len(),
        ..TriggerRunSummary::default()
    };

    for case in &cases {
        for detected in detect(&rules, case, today) {
            let Some(rule) = rules.iter().find(|r| r.code == detected.rule_code) else {
                continue;
            };
            summary.triggers_fired += 1;

            // Earlier actions may have moved the case on.
            let (outcome, detail) = match crate::repo::legal_case::find_by_id(pool, case.id).await? {
                Some(current) => execute(state, rule, &current, actor).await,
                None => ("failed", Some(format!("case {} no longer exists", case.case_id))),
            };
            if outcome == "failed" {
                summary.actions_failed += 1;
                tracing::warn!(
                    case_id = %case.case_id,
                    rule = %rule.code,
                    detail = detail.as_deref().unwrap_or(""),
                    "trigger action failed"
                );
            } else {
                summary.actions_succeeded += 1;
            }

            let event = crate::repo::trigger_event::create(
                pool,
                NewTriggerEvent {
                    case_id: case.id,
                    rule_id: rule.id,
                    rule_code: rule.code.clone(),
                    action: rule.action.clone(),
                    observed_value: detected.observed_value,
                    outcome: outcome.to_string(),
                    detail,
                },
            )
            .await?;
            summary.events.push(TriggerEventResponse::from(event));
        }
    }

    tracing::info!(
        cases = summary.cases_evaluated,
        fired = summary.triggers_fired,
        failed = summary.actions_failed,
        "trigger run finished"
    );
    Ok(summary)
}
