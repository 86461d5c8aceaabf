use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Product;
use crate::pagination::Page;

const SELECT: &str = "SELECT p.*, c.name AS customer_name
     FROM products p JOIN customers c ON c.id = p.customer_id";

pub struct NewProduct<'a> {
    pub customer_id: Uuid,
    pub name: &'a str,
    pub price: Decimal,
    pub description: Option<&'a str>,
    pub created_at: DateTime<Utc>,
}

pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    new: NewProduct<'_>,
) -> Result<Product, sqlx::Error> {
    sqlx::query_as::<_, Product>(
        "WITH p AS (
             INSERT INTO products (id, customer_id, name, price, description, created_at)
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *
         )
         SELECT p.*, c.name AS customer_name FROM p JOIN customers c ON c.id = p.customer_id",
    )
    .bind(Uuid::now_v7())
    .bind(new.customer_id)
    .bind(new.name)
    .bind(new.price)
    .bind(new.description)
    .bind(new.created_at)
    .fetch_one(executor)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>(&format!("{SELECT} WHERE p.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// A tenant's products in insertion order.
pub async fn list_by_customer(
    pool: &PgPool,
    customer_id: Uuid,
    page: Page,
) -> Result<Vec<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>(&format!(
        "{SELECT} WHERE p.customer_id = $1 ORDER BY p.created_at, p.id LIMIT $2 OFFSET $3"
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
) -> Result<Vec<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>(&format!(
        "{SELECT} WHERE p.customer_id = $1 ORDER BY p.created_at, p.id"
    ))
    .bind(customer_id)
    .fetch_all(pool)
    .await
}

/// Overwrite the editable fields of a product owned by `customer_id`.
pub async fn update(
    pool: &PgPool,
    id: Uuid,
    customer_id: Uuid,
    name: &str,
    price: Decimal,
    description: Option<&str>,
) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>(
        "WITH p AS (
             UPDATE products SET name = $3, price = $4, description = $5
             WHERE id = $1 AND customer_id = $2 RETURNING *
         )
         SELECT p.*, c.name AS customer_name FROM p JOIN customers c ON c.id = p.customer_id",
    )
    .bind(id)
    .bind(customer_id)
    .bind(name)
    .bind(price)
    .bind(description)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid, customer_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1 AND customer_id = $2")
        .bind(id)
        .bind(customer_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
