use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sqlx::{Pool, Postgres};

use shared_types::{
    is_blank, is_valid_case_status, is_valid_trigger_action, is_valid_trigger_comparison,
    is_valid_trigger_type, ActiveFilter, AppError, CreateTriggerRuleRequest, DetectedTrigger,
    TriggerEventResponse, TriggerRuleResponse, TriggerRunRequest, TriggerRunSummary,
    UpdateTriggerRuleRequest, CASE_STATUSES, TRIGGER_ACTIONS, TRIGGER_COMPARISONS, TRIGGER_TYPES,
};

use super::{load_case, parse_uuid};
use crate::actor::Actor;
use crate::db::AppState;

/// The parts of a rule that must agree with each other.
struct RuleShape<'a> {
    trigger_type: &'a str,
    comparison: &'a str,
    threshold: f64,
    status_value: Option<&'a str>,
    action: &'a str,
    sms_template_code: Option<&'a str>,
    notice_template_code: Option<&'a str>,
}

fn check_rule_shape(rule: &RuleShape<'_>) -> Result<(), AppError> {
    if !is_valid_trigger_type(rule.trigger_type) {
        return Err(AppError::invalid_choice("trigger_type", rule.trigger_type, TRIGGER_TYPES));
    }
    if !is_valid_trigger_comparison(rule.comparison) {
        return Err(AppError::invalid_choice(
            "comparison",
            rule.comparison,
            TRIGGER_COMPARISONS,
        ));
    }
    if !is_valid_trigger_action(rule.action) {
        return Err(AppError::invalid_choice("action", rule.action, TRIGGER_ACTIONS));
    }
    if !rule.threshold.is_finite() {
        return Err(AppError::bad_request("threshold must be a finite number"));
    }

    if rule.trigger_type == "status_equals" {
        match rule.status_value {
            Some(status) if is_valid_case_status(status) => {}
            Some(status) => return Err(AppError::invalid_choice("status_value", status, CASE_STATUSES)),
            None => {
                return Err(AppError::bad_request(
                    "status_equals rules require status_value",
                ))
            }
        }
    }

    match rule.action {
        "send_sms" if rule.sms_template_code.map_or(true, is_blank) => Err(AppError::bad_request(
            "send_sms rules require sms_template_code",
        )),
        "generate_notice" if rule.notice_template_code.map_or(true, is_blank) => Err(
            AppError::bad_request("generate_notice rules require notice_template_code"),
        ),
        _ => Ok(()),
    }
}

fn upper(code: Option<String>) -> Option<String> {
    code.map(|c| c.trim().to_uppercase()).filter(|c| !c.is_empty())
}

// ── Rules ───────────────────────────────────────────────────────────

/// POST /api/trigger-rules
#[utoipa::path(
    post,
    path = "/api/trigger-rules",
    request_body = CreateTriggerRuleRequest,
    responses(
        (status = 201, description = "Rule created", body = TriggerRuleResponse),
        (status = 400, description = "Invalid value or missing template code", body = AppError),
        (status = 409, description = "Duplicate code", body = AppError)
    ),
    tag = "triggers"
)]
pub async fn create_trigger_rule(
    State(pool): State<Pool<Postgres>>,
    Json(mut body): Json<CreateTriggerRuleRequest>,
) -> Result<(StatusCode, Json<TriggerRuleResponse>), AppError> {
    body.code = body.code.trim().to_uppercase();
    if is_blank(&body.code) {
        return Err(AppError::bad_request("code must not be empty"));
    }
    if is_blank(&body.name) {
        return Err(AppError::field("name", "name must not be empty"));
    }
    body.status_value = body.status_value.map(|s| s.trim().to_string());
    body.sms_template_code = upper(body.sms_template_code);
    body.notice_template_code = upper(body.notice_template_code);

    check_rule_shape(&RuleShape {
        trigger_type: &body.trigger_type,
        comparison: &body.comparison,
        threshold: body.threshold,
        status_value: body.status_value.as_deref(),
        action: &body.action,
        sms_template_code: body.sms_template_code.as_deref(),
        notice_template_code: body.notice_template_code.as_deref(),
    })?;

    let rule = crate::repo::trigger_rule::create(&pool, &body).await?;
    Ok((StatusCode::CREATED, Json(TriggerRuleResponse::from(rule))))
}

/// GET /api/trigger-rules
#[utoipa::path(
    get,
    path = "/api/trigger-rules",
    params(ActiveFilter),
    responses(
        (status = 200, description = "Rules in priority order", body = Vec<TriggerRuleResponse>)
    ),
    tag = "triggers"
)]
pub async fn list_trigger_rules(
    State(pool): State<Pool<Postgres>>,
    Query(filter): Query<ActiveFilter>,
) -> Result<Json<Vec<TriggerRuleResponse>>, AppError> {
    let rows = crate::repo::trigger_rule::list(&pool, filter.active).await?;
    Ok(Json(rows.into_iter().map(TriggerRuleResponse::from).collect()))
}

/// GET /api/trigger-rules/{id}
#[utoipa::path(
    get,
    path = "/api/trigger-rules/{id}",
    params(("id" = String, Path, description = "Rule UUID")),
    responses(
        (status = 200, description = "Rule found", body = TriggerRuleResponse),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "triggers"
)]
pub async fn get_trigger_rule(
    State(pool): State<Pool<Postgres>>,
    Path(id): Path<String>,
) -> Result<Json<TriggerRuleResponse>, AppError> {
    let uuid = parse_uuid(&id)?;
    let rule = crate::repo::trigger_rule::find_by_id(&pool, uuid)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Trigger rule {} not found", id)))?;
    Ok(Json(TriggerRuleResponse::from(rule)))
}

/// PUT /api/trigger-rules/{id}
#[utoipa::path(
    put,
    path = "/api/trigger-rules/{id}",
    request_body = UpdateTriggerRuleRequest,
    params(("id" = String, Path, description = "Rule UUID")),
    responses(
        (status = 200, description = "Rule updated", body = TriggerRuleResponse),
        (status = 400, description = "Invalid value or missing template code", body = AppError),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "triggers"
)]
pub async fn update_trigger_rule(
    State(pool): State<Pool<Postgres>>,
    Path(id): Path<String>,
    Json(mut body): Json<UpdateTriggerRuleRequest>,
) -> Result<Json<TriggerRuleResponse>, AppError> {
    let uuid = parse_uuid(&id)?;
    let current = crate::repo::trigger_rule::find_by_id(&pool, uuid)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Trigger rule {} not found", id)))?;

    if body.name.as_deref().is_some_and(is_blank) {
        return Err(AppError::field("name", "name must not be empty"));
    }
    body.status_value = body.status_value.map(|s| s.trim().to_string());
    body.sms_template_code = upper(body.sms_template_code);
    body.notice_template_code = upper(body.notice_template_code);

    check_rule_shape(&RuleShape {
        trigger_type: &current.trigger_type,
        comparison: body.comparison.as_deref().unwrap_or(&current.comparison),
        threshold: body.threshold.unwrap_or(current.threshold),
        status_value: body
            .status_value
            .as_deref()
            .or(current.status_value.as_deref()),
        action: body.action.as_deref().unwrap_or(&current.action),
        sms_template_code: body
            .sms_template_code
            .as_deref()
            .or(current.sms_template_code.as_deref()),
        notice_template_code: body
            .notice_template_code
            .as_deref()
            .or(current.notice_template_code.as_deref()),
    })?;

    let rule = crate::repo::trigger_rule::update(&pool, uuid, &body)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Trigger rule {} not found", id)))?;
    Ok(Json(TriggerRuleResponse::from(rule)))
}

/// DELETE /api/trigger-rules/{id}
#[utoipa::path(
    delete,
    path = "/api/trigger-rules/{id}",
    params(("id" = String, Path, description = "Rule UUID")),
    responses(
        (status = 204, description = "Rule deleted"),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "triggers"
)]
pub async fn delete_trigger_rule(
    State(pool): State<Pool<Postgres>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let uuid = parse_uuid(&id)?;
    if crate::repo::trigger_rule::soft_delete(&pool, uuid).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(format!("Trigger rule {} not found", id)))
    }
}

// ── Detection and runs ──────────────────────────────────────────────

/// GET /api/cases/{id}/triggers
#[utoipa::path(
    get,
    path = "/api/cases/{id}/triggers",
    params(("id" = String, Path, description = "Case UUID")),
    responses(
        (status = 200, description = "Rules currently matching the case, in priority order", body = Vec<DetectedTrigger>),
        (status = 404, description = "Case not found", body = AppError)
    ),
    tag = "triggers"
)]
pub async fn detect_case_triggers(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<DetectedTrigger>>, AppError> {
    let case = load_case(&state.pool, &id).await?;
    let detected = crate::services::triggers::detect_for_case(&state, &case).await?;
    Ok(Json(detected))
}

/// POST /api/triggers/run
#[utoipa::path(
    post,
    path = "/api/triggers/run",
    request_body = TriggerRunRequest,
    params(("X-User-Id" = Option<String>, Header, description = "Recorded on generated notices and messages")),
    responses(
        (status = 200, description = "Run summary", body = TriggerRunSummary)
    ),
    tag = "triggers"
)]
pub async fn run_triggers(
    State(state): State<AppState>,
    actor: Actor,
    Json(body): Json<TriggerRunRequest>,
) -> Result<Json<TriggerRunSummary>, AppError> {
    let summary = crate::services::triggers::run(&state, body, &actor).await?;
    Ok(Json(summary))
}

/// GET /api/cases/{id}/trigger-events
#[utoipa::path(
    get,
    path = "/api/cases/{id}/trigger-events",
    params(("id" = String, Path, description = "Case UUID")),
    responses(
        (status = 200, description = "Recorded firings, newest first", body = Vec<TriggerEventResponse>),
        (status = 404, description = "Case not found", body = AppError)
    ),
    tag = "triggers"
)]
pub async fn list_trigger_events(
    State(pool): State<Pool<Postgres>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<TriggerEventResponse>>, AppError> {
    let case = load_case(&pool, &id).await?;
    let rows = crate::repo::trigger_event::list_for_case(&pool, case.id).await?;
    Ok(Json(rows.into_iter().map(TriggerEventResponse::from).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::AppErrorKind;

    fn shape<'a>(trigger_type: &'a str, action: &'a str) -> RuleShape<'a> {
        RuleShape {
            trigger_type,
            comparison: "gte",
            threshold: 90.0,
            status_value: None,
            action,
            sms_template_code: None,
            notice_template_code: None,
        }
    }

    #[test]
    fn flag_only_needs_no_template() {
        assert!(check_rule_shape(&shape("dpd_threshold", "flag_only")).is_ok());
    }

    #[test]
    fn actions_need_their_template_code() {
        let err = check_rule_shape(&shape("dpd_threshold", "send_sms")).unwrap_err();
        assert_eq!(err.kind, AppErrorKind::BadRequest);
        assert!(err.message.contains("sms_template_code"));

        let mut ok = shape("dpd_threshold", "send_sms");
        ok.sms_template_code = Some("DPD_REMINDER");
        assert!(check_rule_shape(&ok).is_ok());

        let err = check_rule_shape(&shape("dpd_threshold", "generate_notice")).unwrap_err();
        assert!(err.message.contains("notice_template_code"));
    }

    #[test]
    fn status_rules_need_a_real_status() {
        let mut rule = shape("status_equals", "flag_only");
        assert!(check_rule_shape(&rule).is_err());
        rule.status_value = Some("archived");
        assert!(check_rule_shape(&rule).unwrap_err().message.contains("status_value"));
        rule.status_value = Some("filed");
        assert!(check_rule_shape(&rule).is_ok());
    }

    #[test]
    fn unknown_values_are_rejected() {
        assert!(check_rule_shape(&shape("dpd", "flag_only")).is_err());
        assert!(check_rule_shape(&shape("dpd_threshold", "email")).is_err());
        let mut rule = shape("dpd_threshold", "flag_only");
        rule.comparison = "gt";
        assert!(check_rule_shape(&rule).unwrap_err().message.contains("comparison"));
    }
}
