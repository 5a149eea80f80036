use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sqlx::{Pool, Postgres};

use shared_types::{
    is_blank, is_valid_language_code, is_valid_product_code, is_valid_state_code, ActiveFilter,
    AppError, CreateLanguageRequest, CreateProductRequest, CreateStateRequest, LanguageResponse,
    ProductResponse, StateResponse, UpdateLanguageRequest, UpdateProductRequest,
    UpdateStateRequest,
};

use super::parse_uuid;
use crate::error_convert::ValidateRequest;

fn check_name(name: Option<&str>) -> Result<(), AppError> {
    match name {
        Some(n) if is_blank(n) => Err(AppError::field("name", "name must not be empty")),
        _ => Ok(()),
    }
}

// ── States ──────────────────────────────────────────────────────────

/// POST /api/states
#[utoipa::path(
    post,
    path = "/api/states",
    request_body = CreateStateRequest,
    responses(
        (status = 201, description = "State created", body = StateResponse),
        (status = 400, description = "Invalid state code", body = AppError),
        (status = 409, description = "Duplicate code", body = AppError)
    ),
    tag = "master-data"
)]
pub async fn create_state(
    State(pool): State<Pool<Postgres>>,
    Json(mut body): Json<CreateStateRequest>,
) -> Result<(StatusCode, Json<StateResponse>), AppError> {
    body.code = body.code.trim().to_uppercase();
    if !is_valid_state_code(&body.code) {
        return Err(AppError::bad_request(format!(
            "Invalid state code: {}. Expected 2-3 letters",
            body.code
        )));
    }
    body.validate_request()?;

    let state = crate::repo::state::create(&pool, &body).await?;
    Ok((StatusCode::CREATED, Json(StateResponse::from(state))))
}

/// GET /api/states
#[utoipa::path(
    get,
    path = "/api/states",
    params(ActiveFilter),
    responses(
        (status = 200, description = "States ordered by code", body = Vec<StateResponse>)
    ),
    tag = "master-data"
)]
pub async fn list_states(
    State(pool): State<Pool<Postgres>>,
    Query(filter): Query<ActiveFilter>,
) -> Result<Json<Vec<StateResponse>>, AppError> {
    let rows = crate::repo::state::list(&pool, filter.active).await?;
    Ok(Json(rows.into_iter().map(StateResponse::from).collect()))
}

/// GET /api/states/{id}
#[utoipa::path(
    get,
    path = "/api/states/{id}",
    params(("id" = String, Path, description = "State UUID")),
    responses(
        (status = 200, description = "State found", body = StateResponse),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "master-data"
)]
pub async fn get_state(
    State(pool): State<Pool<Postgres>>,
    Path(id): Path<String>,
) -> Result<Json<StateResponse>, AppError> {
    let uuid = parse_uuid(&id)?;
    let state = crate::repo::state::find_by_id(&pool, uuid)
        .await?
        .ok_or_else(|| AppError::not_found(format!("State {} not found", id)))?;
    Ok(Json(StateResponse::from(state)))
}

/// PUT /api/states/{id}
#[utoipa::path(
    put,
    path = "/api/states/{id}",
    request_body = UpdateStateRequest,
    params(("id" = String, Path, description = "State UUID")),
    responses(
        (status = 200, description = "State updated", body = StateResponse),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "master-data"
)]
pub async fn update_state(
    State(pool): State<Pool<Postgres>>,
    Path(id): Path<String>,
    Json(body): Json<UpdateStateRequest>,
) -> Result<Json<StateResponse>, AppError> {
    let uuid = parse_uuid(&id)?;
    check_name(body.name.as_deref())?;

    let state = crate::repo::state::update(&pool, uuid, &body)
        .await?
        .ok_or_else(|| AppError::not_found(format!("State {} not found", id)))?;
    Ok(Json(StateResponse::from(state)))
}

/// DELETE /api/states/{id}
#[utoipa::path(
    delete,
    path = "/api/states/{id}",
    params(("id" = String, Path, description = "State UUID")),
    responses(
        (status = 204, description = "State deleted"),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "master-data"
)]
pub async fn delete_state(
    State(pool): State<Pool<Postgres>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let uuid = parse_uuid(&id)?;
    if crate::repo::state::soft_delete(&pool, uuid).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(format!("State {} not found", id)))
    }
}

// ── Products ────────────────────────────────────────────────────────

/// POST /api/products
#[utoipa::path(
    post,
    path = "/api/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Invalid product code", body = AppError),
        (status = 409, description = "Duplicate code", body = AppError)
    ),
    tag = "master-data"
)]
pub async fn create_product(
    State(pool): State<Pool<Postgres>>,
    Json(mut body): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), AppError> {
    body.code = body.code.trim().to_uppercase();
    if !is_valid_product_code(&body.code) {
        return Err(AppError::bad_request(format!(
            "Invalid product code: {}. Use 1-20 letters, digits or underscores",
            body.code
        )));
    }
    body.validate_request()?;

    let product = crate::repo::product::create(&pool, &body).await?;
    Ok((StatusCode::CREATED, Json(ProductResponse::from(product))))
}

/// GET /api/products
#[utoipa::path(
    get,
    path = "/api/products",
    params(ActiveFilter),
    responses(
        (status = 200, description = "Products ordered by code", body = Vec<ProductResponse>)
    ),
    tag = "master-data"
)]
pub async fn list_products(
    State(pool): State<Pool<Postgres>>,
    Query(filter): Query<ActiveFilter>,
) -> Result<Json<Vec<ProductResponse>>, AppError> {
    let rows = crate::repo::product::list(&pool, filter.active).await?;
    Ok(Json(rows.into_iter().map(ProductResponse::from).collect()))
}

/// GET /api/products/{id}
#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(("id" = String, Path, description = "Product UUID")),
    responses(
        (status = 200, description = "Product found", body = ProductResponse),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "master-data"
)]
pub async fn get_product(
    State(pool): State<Pool<Postgres>>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, AppError> {
    let uuid = parse_uuid(&id)?;
    let product = crate::repo::product::find_by_id(&pool, uuid)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {} not found", id)))?;
    Ok(Json(ProductResponse::from(product)))
}

/// PUT /api/products/{id}
#[utoipa::path(
    put,
    path = "/api/products/{id}",
    request_body = UpdateProductRequest,
    params(("id" = String, Path, description = "Product UUID")),
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "master-data"
)]
pub async fn update_product(
    State(pool): State<Pool<Postgres>>,
    Path(id): Path<String>,
    Json(body): Json<UpdateProductRequest>,
) -> Result<Json<ProductResponse>, AppError> {
    let uuid = parse_uuid(&id)?;
    check_name(body.name.as_deref())?;

    let product = crate::repo::product::update(&pool, uuid, &body)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {} not found", id)))?;
    Ok(Json(ProductResponse::from(product)))
}

/// DELETE /api/products/{id}
#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    params(("id" = String, Path, description = "Product UUID")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "master-data"
)]
pub async fn delete_product(
    State(pool): State<Pool<Postgres>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let uuid = parse_uuid(&id)?;
    if crate::repo::product::soft_delete(&pool, uuid).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(format!("Product {} not found", id)))
    }
}

// ── Languages ───────────────────────────────────────────────────────

/// POST /api/languages
#[utoipa::path(
    post,
    path = "/api/languages",
    request_body = CreateLanguageRequest,
    responses(
        (status = 201, description = "Language created", body = LanguageResponse),
        (status = 400, description = "Invalid language code", body = AppError),
        (status = 409, description = "Duplicate code", body = AppError)
    ),
    tag = "master-data"
)]
pub async fn create_language(
    State(pool): State<Pool<Postgres>>,
    Json(mut body): Json<CreateLanguageRequest>,
) -> Result<(StatusCode, Json<LanguageResponse>), AppError> {
    body.code = body.code.trim().to_lowercase();
    if !is_valid_language_code(&body.code) {
        return Err(AppError::bad_request(format!(
            "Invalid language code: {}. Expected 2-3 letters",
            body.code
        )));
    }
    body.validate_request()?;

    let language = crate::repo::language::create(&pool, &body).await?;
    Ok((StatusCode::CREATED, Json(LanguageResponse::from(language))))
}

/// GET /api/languages
#[utoipa::path(
    get,
    path = "/api/languages",
    params(ActiveFilter),
    responses(
        (status = 200, description = "Languages ordered by code", body = Vec<LanguageResponse>)
    ),
    tag = "master-data"
)]
pub async fn list_languages(
    State(pool): State<Pool<Postgres>>,
    Query(filter): Query<ActiveFilter>,
) -> Result<Json<Vec<LanguageResponse>>, AppError> {
    let rows = crate::repo::language::list(&pool, filter.active).await?;
    Ok(Json(rows.into_iter().map(LanguageResponse::from).collect()))
}

/// GET /api/languages/{id}
#[utoipa::path(
    get,
    path = "/api/languages/{id}",
    params(("id" = String, Path, description = "Language UUID")),
    responses(
        (status = 200, description = "Language found", body = LanguageResponse),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "master-data"
)]
pub async fn get_language(
    State(pool): State<Pool<Postgres>>,
    Path(id): Path<String>,
) -> Result<Json<LanguageResponse>, AppError> {
    let uuid = parse_uuid(&id)?;
    let language = crate::repo::language::find_by_id(&pool, uuid)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Language {} not found", id)))?;
    Ok(Json(LanguageResponse::from(language)))
}

/// PUT /api/languages/{id}
#[utoipa::path(
    put,
    path = "/api/languages/{id}",
    request_body = UpdateLanguageRequest,
    params(("id" = String, Path, description = "Language UUID")),
    responses(
        (status = 200, description = "Language updated", body = LanguageResponse),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "master-data"
)]
pub async fn update_language(
    State(pool): State<Pool<Postgres>>,
    Path(id): Path<String>,
    Json(body): Json<UpdateLanguageRequest>,
) -> Result<Json<LanguageResponse>, AppError> {
    let uuid = parse_uuid(&id)?;
    check_name(body.name.as_deref())?;

    let language = crate::repo::language::update(&pool, uuid, &body)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Language {} not found", id)))?;
    Ok(Json(LanguageResponse::from(language)))
}

/// DELETE /api/languages/{id}
#[utoipa::path(
    delete,
    path = "/api/languages/{id}",
    params(("id" = String, Path, description = "Language UUID")),
    responses(
        (status = 204, description = "Language deleted"),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "master-data"
)]
pub async fn delete_language(
    State(pool): State<Pool<Postgres>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let uuid = parse_uuid(&id)?;
    if crate::repo::language::soft_delete(&pool, uuid).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(format!("Language {} not found", id)))
    }
}
