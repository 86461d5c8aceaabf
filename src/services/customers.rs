use serde::Deserialize;
use uuid::Uuid;

use super::{Outcome, ServiceError, invalidate, unique_to_field};
use crate::cache::{CacheKey, Tag};
use crate::db;
use crate::models::Customer;
use crate::pagination::Page;
use crate::resources::CachedView;
use crate::state::AppState;
use crate::validation;

#[derive(Debug, Default, Deserialize)]
pub struct CustomerInput {
    pub name: Option<String>,
}

fn validate(input: &CustomerInput) -> Result<String, ServiceError> {
    let name = validation::required("name", input.name.as_deref(), 255).map_err(|e| vec![e])?;
    Ok(name.to_string())
}

pub async fn create(state: &AppState, input: CustomerInput) -> Result<Outcome<Customer>, ServiceError> {
    let name = validate(&input)?;

    let customer = db::customers::create(&state.pool, &name, state.clock.now())
        .await
        .map_err(unique_to_field)?;

    tracing::info!(customer_id = %customer.id, "customer created");
    Ok(invalidate(state, customer, vec![Tag::Customers]))
}

pub async fn rename(
    state: &AppState,
    id: Uuid,
    input: CustomerInput,
) -> Result<Outcome<Customer>, ServiceError> {
    let name = validate(&input)?;

    let customer = db::customers::rename(&state.pool, id, &name)
        .await
        .map_err(unique_to_field)?
        .ok_or(ServiceError::NotFound("Customer"))?;

    tracing::info!(customer_id = %id, "customer renamed");
    Ok(invalidate(state, customer, vec![Tag::Customers, Tag::Customer(id)]))
}

/// Delete a customer along with its products and users.
pub async fn delete(state: &AppState, id: Uuid) -> Result<Outcome<()>, ServiceError> {
    if !db::customers::delete(&state.pool, id).await? {
        return Err(ServiceError::NotFound("Customer"));
    }

    tracing::info!(customer_id = %id, "customer deleted");
    Ok(invalidate(
        state,
        (),
        vec![Tag::Customers, Tag::Customer(id), Tag::Products, Tag::Users],
    ))
}

pub async fn list_view(state: &AppState, page: Page) -> Result<CachedView, ServiceError> {
    state
        .cache
        .get_or_try_insert_with(
            CacheKey::CustomerList { page: page.page, limit: page.limit },
            |_| vec![Tag::Customers],
            || async {
                let customers = db::customers::list(&state.pool, page).await?;
                let resources = state.resources();
                let body: Vec<_> = customers.iter().map(|c| resources.customer(c)).collect();
                Ok::<_, ServiceError>(CachedView::new(None, &body)?)
            },
        )
        .await
}

/// The customer on its own.
pub async fn summary_view(state: &AppState, id: Uuid) -> Result<CachedView, ServiceError> {
    state
        .cache
        .get_or_try_insert_with(
            CacheKey::Customer(id),
            |_| vec![Tag::Customers, Tag::Customer(id)],
            || async {
                let customer = db::customers::find_by_id(&state.pool, id)
                    .await?
                    .ok_or(ServiceError::NotFound("Customer"))?;
                let body = state.resources().customer(&customer);
                Ok::<_, ServiceError>(CachedView::new(Some(id), &body)?)
            },
        )
        .await
}

/// The customer with its users and products.
pub async fn aggregate_view(state: &AppState, id: Uuid) -> Result<CachedView, ServiceError> {
    state
        .cache
        .get_or_try_insert_with(
            CacheKey::CustomerAggregate(id),
            |_| vec![Tag::Customers, Tag::Customer(id)],
            || async {
                let customer = db::customers::find_by_id(&state.pool, id)
                    .await?
                    .ok_or(ServiceError::NotFound("Customer"))?;
                let users = db::users::list_all_by_customer(&state.pool, id).await?;
                let products = db::products::list_all_by_customer(&state.pool, id).await?;

                let body = state.resources().aggregate(&customer, &users, &products);
                Ok::<_, ServiceError>(CachedView::new(Some(id), &body)?)
            },
        )
        .await
}
