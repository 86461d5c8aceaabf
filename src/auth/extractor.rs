use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::auth::jwt;
use crate::error::AppError;
use crate::state::SharedState;

/// The principal named by a valid bearer token. Roles and tenant are looked
/// up from storage by [`crate::auth::gate`], never taken from the token.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: Uuid,
}

impl FromRequestParts<SharedState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AppError::TokenMissing)?;

        let claims = jwt::decode_token(token, &state.config.jwt_secret).map_err(|e| {
            tracing::debug!("Rejected bearer token: {e}");
            AppError::Unauthorized("Invalid or expired token".to_string())
        })?;

        Ok(AuthUser {
            user_id: claims.sub,
        })
    }
}
