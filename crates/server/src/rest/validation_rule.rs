use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sqlx::{Pool, Postgres};

use shared_types::{
    is_blank, is_valid_case_type, is_valid_validation_field, is_valid_validation_operator,
    ActiveFilter, AppError, CreateValidationRuleRequest, EvaluateValidationRequest,
    EvaluateValidationResponse, UpdateValidationRuleRequest, ValidationRuleResponse, CASE_TYPES,
    VALIDATION_FIELDS, VALIDATION_OPERATORS,
};

use super::parse_uuid;

fn check_operator(operator: &str) -> Result<(), AppError> {
    if is_valid_validation_operator(operator) {
        Ok(())
    } else {
        Err(AppError::invalid_choice("operator", operator, VALIDATION_OPERATORS))
    }
}

fn check_value(value: f64) -> Result<(), AppError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(AppError::bad_request("value must be a finite number"))
    }
}

/// POST /api/validation-rules
#[utoipa::path(
    post,
    path = "/api/validation-rules",
    request_body = CreateValidationRuleRequest,
    responses(
        (status = 201, description = "Rule created", body = ValidationRuleResponse),
        (status = 400, description = "Unknown field, operator or case type", body = AppError),
        (status = 422, description = "Blank name or message", body = AppError)
    ),
    tag = "validation-rules"
)]
pub async fn create_validation_rule(
    State(pool): State<Pool<Postgres>>,
    Json(mut body): Json<CreateValidationRuleRequest>,
) -> Result<(StatusCode, Json<ValidationRuleResponse>), AppError> {
    if is_blank(&body.name) {
        return Err(AppError::field("name", "name must not be empty"));
    }
    if is_blank(&body.message) {
        return Err(AppError::field("message", "message must not be empty"));
    }
    if !is_valid_validation_field(&body.field) {
        return Err(AppError::invalid_choice("field", &body.field, VALIDATION_FIELDS));
    }
    check_operator(&body.operator)?;
    check_value(body.value)?;

    body.case_type = body
        .case_type
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty());
    if let Some(case_type) = body.case_type.as_deref() {
        if !is_valid_case_type(case_type) {
            return Err(AppError::invalid_choice("case_type", case_type, CASE_TYPES));
        }
    }

    let rule = crate::repo::validation_rule::create(&pool, &body).await?;
    Ok((StatusCode::CREATED, Json(ValidationRuleResponse::from(rule))))
}

/// GET /api/validation-rules
#[utoipa::path(
    get,
    path = "/api/validation-rules",
    params(ActiveFilter),
    responses(
        (status = 200, description = "Validation rules", body = Vec<ValidationRuleResponse>)
    ),
    tag = "validation-rules"
)]
pub async fn list_validation_rules(
    State(pool): State<Pool<Postgres>>,
    Query(filter): Query<ActiveFilter>,
) -> Result<Json<Vec<ValidationRuleResponse>>, AppError> {
    let rows = crate::repo::validation_rule::list(&pool, filter.active).await?;
    Ok(Json(rows.into_iter().map(ValidationRuleResponse::from).collect()))
}

/// GET /api/validation-rules/{id}
#[utoipa::path(
    get,
    path = "/api/validation-rules/{id}",
    params(("id" = String, Path, description = "Rule UUID")),
    responses(
        (status = 200, description = "Rule found", body = ValidationRuleResponse),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "validation-rules"
)]
pub async fn get_validation_rule(
    State(pool): State<Pool<Postgres>>,
    Path(id): Path<String>,
) -> Result<Json<ValidationRuleResponse>, AppError> {
    let uuid = parse_uuid(&id)?;
    let rule = crate::repo::validation_rule::find_by_id(&pool, uuid)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Validation rule {} not found", id)))?;
    Ok(Json(ValidationRuleResponse::from(rule)))
}

/// PUT /api/validation-rules/{id}
#[utoipa::path(
    put,
    path = "/api/validation-rules/{id}",
    request_body = UpdateValidationRuleRequest,
    params(("id" = String, Path, description = "Rule UUID")),
    responses(
        (status = 200, description = "Rule updated", body = ValidationRuleResponse),
        (status = 400, description = "Unknown operator", body = AppError),
        (status = 404, description = "Not found", body = AppError),
        (status = 422, description = "Blank name or message", body = AppError)
    ),
    tag = "validation-rules"
)]
pub async fn update_validation_rule(
    State(pool): State<Pool<Postgres>>,
    Path(id): Path<String>,
    Json(body): Json<UpdateValidationRuleRequest>,
) -> Result<Json<ValidationRuleResponse>, AppError> {
    let uuid = parse_uuid(&id)?;

    if body.name.as_deref().is_some_and(is_blank) {
        return Err(AppError::field("name", "name must not be empty"));
    }
    if body.message.as_deref().is_some_and(is_blank) {
        return Err(AppError::field("message", "message must not be empty"));
    }
    if let Some(operator) = body.operator.as_deref() {
        check_operator(operator)?;
    }
    if let Some(value) = body.value {
        check_value(value)?;
    }

    let rule = crate::repo::validation_rule::update(&pool, uuid, &body)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Validation rule {} not found", id)))?;
    Ok(Json(ValidationRuleResponse::from(rule)))
}

/// DELETE /api/validation-rules/{id}
#[utoipa::path(
    delete,
    path = "/api/validation-rules/{id}",
    params(("id" = String, Path, description = "Rule UUID")),
    responses(
        (status = 204, description = "Rule deleted"),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "validation-rules"
)]
pub async fn delete_validation_rule(
    State(pool): State<Pool<Postgres>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let uuid = parse_uuid(&id)?;
    if crate::repo::validation_rule::soft_delete(&pool, uuid).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(format!("Validation rule {} not found", id)))
    }
}

/// POST /api/validation-rules/evaluate
///
/// Dry run of the active rules; nothing is stored.
#[utoipa::path(
    post,
    path = "/api/validation-rules/evaluate",
    request_body = EvaluateValidationRequest,
    responses(
        (status = 200, description = "Evaluation result", body = EvaluateValidationResponse),
        (status = 400, description = "Unknown case type", body = AppError)
    ),
    tag = "validation-rules"
)]
pub async fn evaluate_validation_rules(
    State(pool): State<Pool<Postgres>>,
    Json(body): Json<EvaluateValidationRequest>,
) -> Result<Json<EvaluateValidationResponse>, AppError> {
    let case_type = body.case_type.trim().to_lowercase();
    if !is_valid_case_type(&case_type) {
        return Err(AppError::invalid_choice("case_type", &case_type, CASE_TYPES));
    }

    let rules = crate::repo::validation_rule::list_active(&pool).await?;
    Ok(Json(crate::services::validation::evaluate(
        &rules,
        &case_type,
        body.dpd,
        body.outstanding_amount,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_and_value_checks() {
        assert!(check_operator("gte").is_ok());
        assert!(check_operator("between").unwrap_err().message.contains("operator"));
        assert!(check_value(10.0).is_ok());
        assert!(check_value(f64::NAN).is_err());
    }
}
