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
use crate::services::customers::CustomerInput;
use crate::services::products::ProductInput;
use crate::services::users::CredentialsInput;
use crate::state::SharedState;

pub async fn list(
    _auth: AuthUser,
    State(state): State<SharedState>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Response, AppError> {
    let page = Page::try_from(query).map_err(AppError::Validation)?;
    let view = services::customers::list_view(&state, page).await?;
    Ok(cached(&view.body))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    ApiJson(req): ApiJson<CustomerInput>,
) -> Result<Response, AppError> {
    gate::admin(&state, &auth, "create a customer").await?;

    let outcome = services::customers::create(&state, req).await?;
    let resources = state.resources();
    Ok(located(
        StatusCode::CREATED,
        &resources.customer_url(outcome.value.id),
        resources.customer(&outcome.value),
    ))
}

/// Administrators and the customer's own users get the aggregate with users
/// and products; everyone else only sees the customer itself.
pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Response, AppError> {
    let principal = gate::principal(&state, &auth).await?;

    let view = if principal.is_admin() || principal.customer_id == Some(id) {
        services::customers::aggregate_view(&state, id).await?
    } else {
        services::customers::summary_view(&state, id).await?
    };
    Ok(cached(&view.body))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<CustomerInput>,
) -> Result<Response, AppError> {
    gate::admin(&state, &auth, "edit a customer").await?;

    let outcome = services::customers::rename(&state, id, req).await?;
    let resources = state.resources();
    Ok(located(
        StatusCode::OK,
        &resources.customer_url(id),
        resources.customer(&outcome.value),
    ))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Response, AppError> {
    gate::admin(&state, &auth, "delete a customer").await?;

    services::customers::delete(&state, id).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// Admin: add a product to any customer.
pub async fn create_product(
    auth: AuthUser,
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<ProductInput>,
) -> Result<Response, AppError> {
    gate::admin(&state, &auth, "add a product to a customer").await?;

    let outcome = services::products::create(&state, id, req).await?;
    let resources = state.resources();
    Ok(located(
        StatusCode::CREATED,
        &resources.product_url(outcome.value.id),
        resources.product(&outcome.value),
    ))
}

/// Admin: create a user already bound to a customer.
pub async fn create_user(
    auth: AuthUser,
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<CredentialsInput>,
) -> Result<Response, AppError> {
    gate::admin(&state, &auth, "add a user to a customer").await?;

    let outcome = services::users::create_for_customer(&state, id, req).await?;
    let resources = state.resources();
    Ok(located(
        StatusCode::CREATED,
        &resources.user_url(outcome.value.id),
        resources.user(&outcome.value),
    ))
}
