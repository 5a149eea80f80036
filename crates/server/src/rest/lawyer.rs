use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sqlx::{Pool, Postgres};

use shared_types::{
    is_blank, is_valid_email, is_valid_language_code, is_valid_mobile, is_valid_state_code,
    AppError, CreateLawyerRequest, LawyerListParams, LawyerResponse, LawyerWorkload,
    LegalCaseResponse, UpdateLawyerRequest,
};

use super::parse_uuid;
use crate::actor::Actor;
use crate::error_convert::ValidateRequest;

/// Trim, change case and de-duplicate a list of codes, rejecting any that
/// fail `valid`. Order of first appearance is kept.
fn normalize_codes(
    field: &str,
    codes: Vec<String>,
    upper: bool,
    valid: fn(&str) -> bool,
) -> Result<Vec<String>, AppError> {
    let mut out: Vec<String> = Vec::with_capacity(codes.len());
    for raw in codes {
        let code = if upper {
            raw.trim().to_uppercase()
        } else {
            raw.trim().to_lowercase()
        };
        if !valid(&code) {
            return Err(AppError::bad_request(format!("Invalid {} entry: {}", field, code)));
        }
        if !out.contains(&code) {
            out.push(code);
        }
    }
    Ok(out)
}

/// 400 unless every code names a non-deleted state / language.
async fn require_known(
    pool: &Pool<Postgres>,
    state_codes: &[String],
    language_codes: &[String],
) -> Result<(), AppError> {
    for code in state_codes {
        if crate::repo::state::find_by_code(pool, code).await?.is_none() {
            return Err(AppError::bad_request(format!("Unknown state code: {}", code)));
        }
    }
    for code in language_codes {
        if crate::repo::language::find_by_code(pool, code).await?.is_none() {
            return Err(AppError::bad_request(format!("Unknown language code: {}", code)));
        }
    }
    Ok(())
}

/// POST /api/lawyers
#[utoipa::path(
    post,
    path = "/api/lawyers",
    request_body = CreateLawyerRequest,
    params(("X-User-Id" = Option<String>, Header, description = "Acting user for audit columns")),
    responses(
        (status = 201, description = "Lawyer created", body = LawyerResponse),
        (status = 400, description = "Unknown state or language code", body = AppError),
        (status = 409, description = "Duplicate email or bar registration", body = AppError),
        (status = 422, description = "Field validation failure", body = AppError)
    ),
    tag = "lawyers"
)]
pub async fn create_lawyer(
    State(pool): State<Pool<Postgres>>,
    actor: Actor,
    Json(mut body): Json<CreateLawyerRequest>,
) -> Result<(StatusCode, Json<LawyerResponse>), AppError> {
    body.email = body.email.trim().to_lowercase();
    body.phone = body.phone.trim().to_string();
    body.validate_request()?;
    if is_blank(&body.name) {
        return Err(AppError::field("name", "name must not be empty"));
    }
    if !is_valid_mobile(&body.phone) {
        return Err(AppError::field("phone", "phone must be a 10-digit mobile number"));
    }

    body.state_codes = normalize_codes("state_codes", body.state_codes, true, is_valid_state_code)?;
    body.language_codes =
        normalize_codes("language_codes", body.language_codes, false, is_valid_language_code)?;
    require_known(&pool, &body.state_codes, &body.language_codes).await?;

    let lawyer = crate::repo::lawyer::create(&pool, &body, actor.as_str()).await?;
    tracing::info!(lawyer_id = %lawyer.id, "lawyer created");
    Ok((StatusCode::CREATED, Json(LawyerResponse::from(lawyer))))
}

/// GET /api/lawyers
#[utoipa::path(
    get,
    path = "/api/lawyers",
    params(LawyerListParams),
    responses(
        (status = 200, description = "Lawyers ordered by name", body = Vec<LawyerResponse>)
    ),
    tag = "lawyers"
)]
pub async fn list_lawyers(
    State(pool): State<Pool<Postgres>>,
    Query(mut params): Query<LawyerListParams>,
) -> Result<Json<Vec<LawyerResponse>>, AppError> {
    params.state_code = params.state_code.map(|s| s.trim().to_uppercase());
    params.language_code = params.language_code.map(|s| s.trim().to_lowercase());

    let rows = crate::repo::lawyer::list(&pool, &params).await?;
    Ok(Json(rows.into_iter().map(LawyerResponse::from).collect()))
}

/// GET /api/lawyers/{id}
#[utoipa::path(
    get,
    path = "/api/lawyers/{id}",
    params(("id" = String, Path, description = "Lawyer UUID")),
    responses(
        (status = 200, description = "Lawyer found", body = LawyerResponse),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "lawyers"
)]
pub async fn get_lawyer(
    State(pool): State<Pool<Postgres>>,
    Path(id): Path<String>,
) -> Result<Json<LawyerResponse>, AppError> {
    let uuid = parse_uuid(&id)?;
    let lawyer = crate::repo::lawyer::find_by_id(&pool, uuid)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Lawyer {} not found", id)))?;
    Ok(Json(LawyerResponse::from(lawyer)))
}

/// PUT /api/lawyers/{id}
#[utoipa::path(
    put,
    path = "/api/lawyers/{id}",
    request_body = UpdateLawyerRequest,
    params(
        ("id" = String, Path, description = "Lawyer UUID"),
        ("X-User-Id" = Option<String>, Header, description = "Acting user for audit columns")
    ),
    responses(
        (status = 200, description = "Lawyer updated", body = LawyerResponse),
        (status = 400, description = "Unknown state or language code", body = AppError),
        (status = 404, description = "Not found", body = AppError),
        (status = 422, description = "Field validation failure", body = AppError)
    ),
    tag = "lawyers"
)]
pub async fn update_lawyer(
    State(pool): State<Pool<Postgres>>,
    actor: Actor,
    Path(id): Path<String>,
    Json(mut body): Json<UpdateLawyerRequest>,
) -> Result<Json<LawyerResponse>, AppError> {
    let uuid = parse_uuid(&id)?;

    if body.name.as_deref().is_some_and(is_blank) {
        return Err(AppError::field("name", "name must not be empty"));
    }
    body.email = body.email.map(|e| e.trim().to_lowercase());
    if body.email.as_deref().is_some_and(|e| !is_valid_email(e)) {
        return Err(AppError::field("email", "email must be a valid address"));
    }
    body.phone = body.phone.map(|p| p.trim().to_string());
    if body.phone.as_deref().is_some_and(|p| !is_valid_mobile(p)) {
        return Err(AppError::field("phone", "phone must be a 10-digit mobile number"));
    }
    if body.max_active_cases.is_some_and(|m| m <= 0) {
        return Err(AppError::field(
            "max_active_cases",
            "max_active_cases must be greater than 0",
        ));
    }

    if let Some(codes) = body.state_codes.take() {
        body.state_codes = Some(normalize_codes("state_codes", codes, true, is_valid_state_code)?);
    }
    if let Some(codes) = body.language_codes.take() {
        body.language_codes = Some(normalize_codes(
            "language_codes",
            codes,
            false,
            is_valid_language_code,
        )?);
    }
    require_known(
        &pool,
        body.state_codes.as_deref().unwrap_or_default(),
        body.language_codes.as_deref().unwrap_or_default(),
    )
    .await?;

    let lawyer = crate::repo::lawyer::update(&pool, uuid, &body, actor.as_str())
        .await?
        .ok_or_else(|| AppError::not_found(format!("Lawyer {} not found", id)))?;
    Ok(Json(LawyerResponse::from(lawyer)))
}

/// DELETE /api/lawyers/{id}
#[utoipa::path(
    delete,
    path = "/api/lawyers/{id}",
    params(("id" = String, Path, description = "Lawyer UUID")),
    responses(
        (status = 204, description = "Lawyer deleted"),
        (status = 404, description = "Not found", body = AppError),
        (status = 409, description = "Lawyer still holds active allocations", body = AppError)
    ),
    tag = "lawyers"
)]
pub async fn delete_lawyer(
    State(pool): State<Pool<Postgres>>,
    actor: Actor,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let uuid = parse_uuid(&id)?;

    let active = crate::repo::allocation::count_active_for_lawyer(&pool, uuid).await?;
    if active > 0 {
        return Err(AppError::conflict(format!(
            "Lawyer {} holds {} active allocation(s)",
            id, active
        )));
    }

    if crate::repo::lawyer::soft_delete(&pool, uuid, actor.as_str()).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(format!("Lawyer {} not found", id)))
    }
}

/// GET /api/lawyers/{id}/cases
#[utoipa::path(
    get,
    path = "/api/lawyers/{id}/cases",
    params(("id" = String, Path, description = "Lawyer UUID")),
    responses(
        (status = 200, description = "Cases currently allocated to the lawyer", body = Vec<LegalCaseResponse>),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "lawyers"
)]
pub async fn lawyer_cases(
    State(pool): State<Pool<Postgres>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<LegalCaseResponse>>, AppError> {
    let uuid = parse_uuid(&id)?;
    if crate::repo::lawyer::find_by_id(&pool, uuid).await?.is_none() {
        return Err(AppError::not_found(format!("Lawyer {} not found", id)));
    }
    let rows = crate::repo::legal_case::list_for_lawyer(&pool, uuid).await?;
    Ok(Json(rows.into_iter().map(LegalCaseResponse::from).collect()))
}

/// GET /api/lawyers/{id}/workload
#[utoipa::path(
    get,
    path = "/api/lawyers/{id}/workload",
    params(("id" = String, Path, description = "Lawyer UUID")),
    responses(
        (status = 200, description = "Active cases against capacity", body = LawyerWorkload),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "lawyers"
)]
pub async fn lawyer_workload(
    State(pool): State<Pool<Postgres>>,
    Path(id): Path<String>,
) -> Result<Json<LawyerWorkload>, AppError> {
    let uuid = parse_uuid(&id)?;
    let load = crate::repo::lawyer::find_with_load(&pool, uuid)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Lawyer {} not found", id)))?;
    Ok(Json(LawyerWorkload::from(load)))
}

/// GET /api/lawyers/workload
#[utoipa::path(
    get,
    path = "/api/lawyers/workload",
    responses(
        (status = 200, description = "Workload of every lawyer, busiest first", body = Vec<LawyerWorkload>)
    ),
    tag = "lawyers"
)]
pub async fn all_workloads(
    State(pool): State<Pool<Postgres>>,
) -> Result<Json<Vec<LawyerWorkload>>, AppError> {
    let rows = crate::repo::lawyer::workloads(&pool).await?;
    Ok(Json(rows.into_iter().map(LawyerWorkload::from).collect()))
}
