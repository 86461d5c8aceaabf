use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;

use crate::services::ServiceError;

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    Unauthorized(String),
    Forbidden(String),
    TokenMissing,
    BadRequest(String),
    Validation(Vec<FieldError>),
    /// Invalid state transition. Reported as 405 by this API's convention.
    Conflict(String),
    RateLimited(String),
    Internal(String),
    Database(sqlx::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not Found: {msg}"),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {msg}"),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {msg}"),
            AppError::TokenMissing => write!(f, "Forbidden: Token missing"),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {msg}"),
            AppError::Validation(errors) => write!(f, "Validation failed: {} error(s)", errors.len()),
            AppError::Conflict(msg) => write!(f, "Conflict: {msg}"),
            AppError::RateLimited(msg) => write!(f, "Rate Limited: {msg}"),
            AppError::Internal(msg) => write!(f, "Internal Error: {msg}"),
            AppError::Database(err) => write!(f, "Database Error: {err}"),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) | AppError::TokenMissing => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::METHOD_NOT_ALLOWED,
            AppError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Internal(_) | AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = status.as_u16();

        let body = match self {
            // Authentication failures use the `code` envelope of the token layer.
            AppError::TokenMissing => json!({ "code": code, "message": "Token missing" }),
            AppError::Unauthorized(msg) => json!({ "code": code, "message": msg }),
            AppError::Validation(errors) => json!({
                "status": code,
                "message": "Validation failed",
                "errors": errors,
            }),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                json!({ "status": code, "message": "Internal server error" })
            }
            AppError::Database(err) => {
                tracing::error!("Database error: {err}");
                json!({ "status": code, "message": "Internal server error" })
            }
            AppError::NotFound(msg)
            | AppError::Forbidden(msg)
            | AppError::BadRequest(msg)
            | AppError::Conflict(msg)
            | AppError::RateLimited(msg) => json!({ "status": code, "message": msg }),
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        use crate::binding::BindError;

        match err {
            ServiceError::NotFound(what) => AppError::NotFound(format!("{what} not found")),
            ServiceError::Validation(errors) => AppError::Validation(errors),
            ServiceError::Binding(e @ (BindError::AlreadyBound { .. } | BindError::NotBound)) => {
                AppError::Conflict(e.to_string())
            }
            ServiceError::Binding(e @ (BindError::NotOwner | BindError::Administrator)) => {
                AppError::Forbidden(e.to_string())
            }
            ServiceError::Hashing(msg) => AppError::Internal(msg),
            ServiceError::Serialization(err) => AppError::Internal(err.to_string()),
            ServiceError::Database(err) => AppError::Database(err),
        }
    }
}
