use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use super::{Outcome, ServiceError, invalidate, unique_to_field};
use crate::cache::{CacheKey, Tag};
use crate::db;
use crate::db::products::NewProduct;
use crate::models::Product;
use crate::pagination::Page;
use crate::resources::CachedView;
use crate::state::AppState;
use crate::validation;

#[derive(Debug, Default, Deserialize)]
pub struct ProductInput {
    pub name: Option<String>,
    /// Accepted as a JSON string or number.
    pub price: Option<serde_json::Value>,
    pub description: Option<String>,
}

struct ValidProduct {
    name: String,
    price: Decimal,
    description: Option<String>,
}

fn validate(input: &ProductInput) -> Result<ValidProduct, ServiceError> {
    let raw_price = input.price.as_ref().and_then(|price| match price {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    });
    let (name, price) = validation::both(
        validation::required("name", input.name.as_deref(), 255),
        validation::price(raw_price.as_deref()),
    )?;

    let description = input
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string);

    Ok(ValidProduct {
        name: name.to_string(),
        price,
        description,
    })
}

fn tags(id: Uuid, customer_id: Uuid) -> Vec<Tag> {
    vec![Tag::Products, Tag::Product(id), Tag::Customer(customer_id)]
}

/// Add a product to `customer_id`'s catalogue.
pub async fn create(
    state: &AppState,
    customer_id: Uuid,
    input: ProductInput,
) -> Result<Outcome<Product>, ServiceError> {
    let valid = validate(&input)?;

    db::customers::find_by_id(&state.pool, customer_id)
        .await?
        .ok_or(ServiceError::NotFound("Customer"))?;

    let product = db::products::create(
        &state.pool,
        NewProduct {
            customer_id,
            name: &valid.name,
            price: valid.price,
            description: valid.description.as_deref(),
            created_at: state.clock.now(),
        },
    )
    .await
    .map_err(unique_to_field)?;

    tracing::info!(product_id = %product.id, %customer_id, "product created");
    let tags = tags(product.id, customer_id);
    Ok(invalidate(state, product, tags))
}

pub async fn find(state: &AppState, id: Uuid) -> Result<Product, ServiceError> {
    db::products::find_by_id(&state.pool, id)
        .await?
        .ok_or(ServiceError::NotFound("Product"))
}

/// Replace the editable fields of a product owned by `customer_id`.
pub async fn update(
    state: &AppState,
    customer_id: Uuid,
    id: Uuid,
    input: ProductInput,
) -> Result<Outcome<Product>, ServiceError> {
    let valid = validate(&input)?;

    let product = db::products::update(
        &state.pool,
        id,
        customer_id,
        &valid.name,
        valid.price,
        valid.description.as_deref(),
    )
    .await
    .map_err(unique_to_field)?
    .ok_or(ServiceError::NotFound("Product"))?;

    tracing::info!(product_id = %id, %customer_id, "product updated");
    Ok(invalidate(state, product, tags(id, customer_id)))
}

pub async fn delete(state: &AppState, customer_id: Uuid, id: Uuid) -> Result<Outcome<()>, ServiceError> {
    if !db::products::delete(&state.pool, id, customer_id).await? {
        return Err(ServiceError::NotFound("Product"));
    }

    tracing::info!(product_id = %id, %customer_id, "product deleted");
    Ok(invalidate(state, (), tags(id, customer_id)))
}

pub async fn list_view(state: &AppState, customer_id: Uuid, page: Page) -> Result<CachedView, ServiceError> {
    state
        .cache
        .get_or_try_insert_with(
            CacheKey::ProductList { tenant: customer_id, page: page.page, limit: page.limit },
            |_| vec![Tag::Products, Tag::Customer(customer_id)],
            || async {
                let products = db::products::list_by_customer(&state.pool, customer_id, page).await?;
                let resources = state.resources();
                let body: Vec<_> = products.iter().map(|p| resources.product(p)).collect();
                Ok::<_, ServiceError>(CachedView::new(Some(customer_id), &body)?)
            },
        )
        .await
}

pub async fn detail_view(state: &AppState, id: Uuid) -> Result<CachedView, ServiceError> {
    state
        .cache
        .get_or_try_insert_with(
            CacheKey::Product(id),
            |view| {
                let mut tags = vec![Tag::Product(id)];
                tags.extend(view.owner.map(Tag::Customer));
                tags
            },
            || async {
                let product = find(state, id).await?;
                let body = state.resources().product(&product);
                Ok::<_, ServiceError>(CachedView::new(Some(product.customer_id), &body)?)
            },
        )
        .await
}
