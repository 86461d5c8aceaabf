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
use crate::services::users::CredentialsInput;
use crate::state::SharedState;

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Response, AppError> {
    let tenant = gate::tenant(&state, &auth, "list the users").await?;
    let page = Page::try_from(query).map_err(AppError::Validation)?;

    let view = services::users::list_view(&state, tenant.customer_id, page).await?;
    Ok(cached(&view.body))
}

/// Public sign-up.
pub async fn register(
    State(state): State<SharedState>,
    ApiJson(req): ApiJson<CredentialsInput>,
) -> Result<Response, AppError> {
    let outcome = services::users::register(&state, req).await?;
    let resources = state.resources();
    Ok(located(
        StatusCode::CREATED,
        &resources.user_url(outcome.value.id),
        resources.user(&outcome.value),
    ))
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Response, AppError> {
    let tenant = gate::tenant(&state, &auth, "view this user").await?;

    let view = services::users::detail_view(&state, id).await?;
    tenant.require_owner(view.owner, "view this user")?;
    Ok(cached(&view.body))
}

/// Edit the authenticated user's own account.
pub async fn update_self(
    auth: AuthUser,
    State(state): State<SharedState>,
    ApiJson(req): ApiJson<CredentialsInput>,
) -> Result<Response, AppError> {
    let outcome = services::users::edit(&state, auth.user_id, req).await?;
    let resources = state.resources();
    Ok(located(
        StatusCode::OK,
        &resources.user_url(auth.user_id),
        resources.user(&outcome.value),
    ))
}

/// Edit a user bound to the principal's customer. Only the user itself may
/// change its password.
pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<CredentialsInput>,
) -> Result<Response, AppError> {
    let tenant = gate::tenant(&state, &auth, "edit this user").await?;
    let user = services::users::find(&state, id).await?;
    tenant.require_owner(user.customer_id, "edit this user")?;

    let changes_password = req.password.as_deref().is_some_and(|p| !p.trim().is_empty());
    if changes_password && id != auth.user_id {
        return Err(AppError::Forbidden(
            "You can only change your own password.".to_string(),
        ));
    }

    let outcome = services::users::edit(&state, id, req).await?;
    let resources = state.resources();
    Ok(located(
        StatusCode::OK,
        &resources.user_url(id),
        resources.user(&outcome.value),
    ))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Response, AppError> {
    let tenant = gate::tenant(&state, &auth, "delete this user").await?;
    let user = services::users::find(&state, id).await?;
    tenant.require_owner(user.customer_id, "delete this user")?;

    services::users::delete(&state, tenant.customer_id, id).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub async fn bind(
    auth: AuthUser,
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Response, AppError> {
    let tenant = gate::tenant(&state, &auth, "bind this user").await?;

    let outcome = services::users::bind(&state, tenant.customer_id, id).await?;
    let resources = state.resources();
    Ok(located(
        StatusCode::OK,
        &resources.user_url(id),
        resources.user(&outcome.value),
    ))
}

pub async fn unbind(
    auth: AuthUser,
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Response, AppError> {
    let tenant = gate::tenant(&state, &auth, "unbind this user").await?;

    let outcome = services::users::unbind(&state, tenant.customer_id, id).await?;
    let resources = state.resources();
    Ok(located(
        StatusCode::OK,
        &resources.user_url(id),
        resources.user(&outcome.value),
    ))
}
