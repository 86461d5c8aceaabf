use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use super::extract::ApiJson;
use crate::auth::jwt::{Claims, encode_token};
use crate::error::AppError;
use crate::services;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "username")]
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub token: String,
}

pub async fn login(
    State(state): State<SharedState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    if state.login_limiter.check(&req.email).is_err() {
        return Err(AppError::RateLimited(
            "Too many login attempts. Please try again later.".to_string(),
        ));
    }

    let Some(user) = services::users::authenticate(&state, &req.email, &req.password).await? else {
        state.login_limiter.record_failure(&req.email);
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    };

    state.login_limiter.reset(&req.email);

    let claims = Claims::new(
        user.id,
        user.email.clone(),
        user.roles(),
        state.config.token_ttl_minutes,
    );
    let token = encode_token(&claims, &state.config.jwt_secret).map_err(AppError::Internal)?;

    tracing::info!(user_id = %user.id, "user logged in");
    Ok(Json(TokenResponse { token }))
}
