use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::User;
use crate::pagination::Page;

const SELECT: &str = "SELECT u.*, c.name AS customer_name
     FROM users u LEFT JOIN customers c ON c.id = u.customer_id";

pub struct NewUser<'a> {
    pub customer_id: Option<Uuid>,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub roles: &'a [String],
    pub registered_at: DateTime<Utc>,
}

pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    new: NewUser<'_>,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "WITH u AS (
             INSERT INTO users (id, customer_id, email, password_hash, roles, registered_at)
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *
         )
         SELECT u.*, c.name AS customer_name FROM u LEFT JOIN customers c ON c.id = u.customer_id",
    )
    .bind(Uuid::now_v7())
    .bind(new.customer_id)
    .bind(new.email)
    .bind(new.password_hash)
    .bind(new.roles)
    .bind(new.registered_at)
    .fetch_one(executor)
    .await
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("{SELECT} WHERE u.email = $1"))
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("{SELECT} WHERE u.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Load a user and lock its row until the surrounding transaction ends.
pub async fn find_for_update<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("{SELECT} WHERE u.id = $1 FOR UPDATE OF u"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// A tenant's users in insertion order.
pub async fn list_by_customer(
    pool: &PgPool,
    customer_id: Uuid,
    page: Page,
) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "{SELECT} WHERE u.customer_id = $1 ORDER BY u.registered_at, u.id LIMIT $2 OFFSET $3"
    ))
    .bind(customer_id)
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(pool)
    .await
}

pub async fn list_all_by_customer(
    pool: &PgPool,
    customer_id: Uuid,
) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "{SELECT} WHERE u.customer_id = $1 ORDER BY u.registered_at, u.id"
    ))
    .bind(customer_id)
    .fetch_all(pool)
    .await
}

/// Move a user from `expected` to `target`. Returns `None` when the stored
/// owner no longer matches `expected`.
pub async fn set_customer<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    expected: Option<Uuid>,
    target: Option<Uuid>,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "WITH u AS (
             UPDATE users SET customer_id = $3
             WHERE id = $1 AND customer_id IS NOT DISTINCT FROM $2 RETURNING *
         )
         SELECT u.*, c.name AS customer_name FROM u LEFT JOIN customers c ON c.id = u.customer_id",
    )
    .bind(id)
    .bind(expected)
    .bind(target)
    .fetch_optional(executor)
    .await
}

/// Update email and, when given, the password hash.
pub async fn update_credentials(
    pool: &PgPool,
    id: Uuid,
    email: &str,
    password_hash: Option<&str>,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "WITH u AS (
             UPDATE users SET email = $2, password_hash = COALESCE($3, password_hash)
             WHERE id = $1 RETURNING *
         )
         SELECT u.*, c.name AS customer_name FROM u LEFT JOIN customers c ON c.id = u.customer_id",
    )
    .bind(id)
    .bind(email)
    .bind(password_hash)
    .fetch_optional(pool)
    .await
}

pub async fn set_roles(pool: &PgPool, id: Uuid, roles: &[String]) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET roles = $2 WHERE id = $1")
        .bind(id)
        .bind(roles)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn delete(pool: &PgPool, id: Uuid, customer_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1 AND customer_id = $2")
        .bind(id)
        .bind(customer_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
