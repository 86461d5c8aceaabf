use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use super::extract::{ApiJson, ApiPath, ApiQuery, cached, located};
use crate::auth::extractor::AuthUser;
use crate::auth::gate;
use crate::error::AppError;
use crate::pagination::{Page, PageQuery};
use crate::services;
use crate::services::products::ProductInput;
use crate::state::SharedState;

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Response, AppError> {
    let tenant = gate::tenant(&state, &auth, "list the products").await?;
    let page = Page::try_from(query).map_err(AppError::Validation)?;

    let view = services::products::list_view(&state, tenant.customer_id, page).await?;
    Ok(cached(&view.body))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    ApiJson(req): ApiJson<ProductInput>,
) -> Result<Response, AppError> {
    let tenant = gate::tenant(&state, &auth, "add a product").await?;

    let outcome = services::products::create(&state, tenant.customer_id, req).await?;
    let resources = state.resources();
    Ok(located(
        StatusCode::CREATED,
        &resources.product_url(outcome.value.id),
        resources.product(&outcome.value),
    ))
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Response, AppError> {
    let tenant = gate::tenant(&state, &auth, "view this product").await?;

    let view = services::products::detail_view(&state, id).await?;
    tenant.require_owner(view.owner, "view this product")?;
    Ok(cached(&view.body))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<ProductInput>,
) -> Result<Response, AppError> {
    let tenant = gate::tenant(&state, &auth, "edit this product").await?;
    let product = services::products::find(&state, id).await?;
    tenant.require_owner(Some(product.customer_id), "edit this product")?;

    let outcome = services::products::update(&state, tenant.customer_id, id, req).await?;
    let resources = state.resources();
    Ok(located(
        StatusCode::OK,
        &resources.product_url(id),
        resources.product(&outcome.value),
    ))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Response, AppError> {
    let tenant = gate::tenant(&state, &auth, "delete this product").await?;
    let product = services::products::find(&state, id).await?;
    tenant.require_owner(Some(product.customer_id), "delete this product")?;

    services::products::delete(&state, tenant.customer_id, id).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}
