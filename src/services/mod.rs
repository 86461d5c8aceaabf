//! Business rules. Every mutation commits first, then evicts the cache tags
//! that could hold the changed record, and reports them in its [`Outcome`].

pub mod customers;
pub mod products;
pub mod users;

use thiserror::Error;

use crate::binding::BindError;
use crate::cache::Tag;
use crate::db;
use crate::error::FieldError;
use crate::state::AppState;
use crate::validation::ALREADY_USED;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("validation failed")]
    Validation(Vec<FieldError>),
    #[error(transparent)]
    Binding(#[from] BindError),
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl From<Vec<FieldError>> for ServiceError {
    fn from(errors: Vec<FieldError>) -> Self {
        ServiceError::Validation(errors)
    }
}

/// Result of a mutation together with the cache tags it invalidated.
#[derive(Debug)]
pub struct Outcome<T> {
    pub value: T,
    pub invalidated: Vec<Tag>,
}

/// Evict `tags` and wrap `value`. Called after the write has been committed.
fn invalidate<T>(state: &AppState, value: T, tags: Vec<Tag>) -> Outcome<T> {
    let evicted = state.cache.invalidate(&tags);
    tracing::debug!(
        tags = %tags.iter().map(Tag::to_string).collect::<Vec<_>>().join(","),
        evicted,
        "cache invalidated"
    );
    Outcome {
        value,
        invalidated: tags,
    }
}

/// Turn unique-constraint violations into field errors.
fn unique_to_field(err: sqlx::Error) -> ServiceError {
    let field = db::unique_violation(&err).map(|constraint| match constraint {
        "users_email_key" => "email",
        _ => "name",
    });

    match field {
        Some(field) => ServiceError::Validation(vec![FieldError::new(field, ALREADY_USED)]),
        None => ServiceError::Database(err),
    }
}
