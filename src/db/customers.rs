use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Customer;
use crate::pagination::Page;

pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    name: &str,
    created_at: DateTime<Utc>,
) -> Result<Customer, sqlx::Error> {
    sqlx::query_as::<_, Customer>(
        "INSERT INTO customers (id, name, created_at) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(name)
    .bind(created_at)
    .fetch_one(executor)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Customer>, sqlx::Error> {
    sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list(pool: &PgPool, page: Page) -> Result<Vec<Customer>, sqlx::Error> {
    sqlx::query_as::<_, Customer>(
        "SELECT * FROM customers ORDER BY created_at, id LIMIT $1 OFFSET $2",
    )
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(pool)
    .await
}

pub async fn rename<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    name: &str,
) -> Result<Option<Customer>, sqlx::Error> {
    sqlx::query_as::<_, Customer>("UPDATE customers SET name = $2 WHERE id = $1 RETURNING *")
        .bind(id)
        .bind(name)
        .fetch_optional(executor)
        .await
}

/// Delete a customer. Its products and users go with it.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM customers WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
