pub mod auth;
pub mod binding;
pub mod cache;
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod pagination;
pub mod rate_limit;
pub mod resources;
pub mod routes;
pub mod services;
pub mod state;
pub mod validation;

use axum::Router;
use axum::http::{HeaderName, HeaderValue};
use tower::ServiceBuilder;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::services::ServiceError;
use crate::state::{AppState, SharedState};

/// Create the configured administrator, if any, or grant it `ROLE_ADMIN`.
pub async fn seed_admin(state: &AppState) -> Result<(), ServiceError> {
    if let Some(seed) = &state.config.admin {
        services::users::ensure_admin(state, seed).await?;
    }
    Ok(())
}

pub fn build_app(state: SharedState) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ));

    Router::new()
        .merge(routes::api_routes())
        .route("/health", axum::routing::get(health))
        .layer(middleware)
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
