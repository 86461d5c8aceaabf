use serde::Deserialize;
use uuid::Uuid;

use super::{Outcome, ServiceError, invalidate, unique_to_field};
use crate::auth::password;
use crate::binding::BindError;
use crate::cache::{CacheKey, Tag};
use crate::config::AdminSeed;
use crate::db;
use crate::db::users::NewUser;
use crate::models::{ROLE_ADMIN, ROLE_USER, User};
use crate::pagination::Page;
use crate::resources::CachedView;
use crate::state::AppState;
use crate::validation;

#[derive(Debug, Default, Deserialize)]
pub struct CredentialsInput {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Tags covering every cached view that can contain `user`.
fn tags(user_id: Uuid, customer_id: Option<Uuid>) -> Vec<Tag> {
    let mut tags = vec![Tag::Users, Tag::User(user_id)];
    tags.extend(customer_id.map(Tag::Customer));
    tags
}

async fn hash(password: &str) -> Result<String, ServiceError> {
    password::hash_blocking(password.to_string())
        .await
        .map_err(ServiceError::Hashing)
}

async fn insert(
    state: &AppState,
    customer_id: Option<Uuid>,
    input: &CredentialsInput,
    roles: &[String],
) -> Result<User, ServiceError> {
    let (email, password) = validation::both(
        validation::email(input.email.as_deref()),
        validation::password(input.password.as_deref()),
    )?;

    let password_hash = hash(password).await?;

    db::users::create(
        &state.pool,
        NewUser {
            customer_id,
            email,
            password_hash: &password_hash,
            roles,
            registered_at: state.clock.now(),
        },
    )
    .await
    .map_err(unique_to_field)
}

/// Public sign-up. The new account is not bound to any customer.
pub async fn register(state: &AppState, input: CredentialsInput) -> Result<Outcome<User>, ServiceError> {
    let user = insert(state, None, &input, &[ROLE_USER.to_string()]).await?;

    tracing::info!(user_id = %user.id, "user registered");
    Ok(invalidate(state, user, vec![Tag::Users]))
}

/// Create a user directly bound to `customer_id`.
pub async fn create_for_customer(
    state: &AppState,
    customer_id: Uuid,
    input: CredentialsInput,
) -> Result<Outcome<User>, ServiceError> {
    db::customers::find_by_id(&state.pool, customer_id)
        .await?
        .ok_or(ServiceError::NotFound("Customer"))?;

    let user = insert(state, Some(customer_id), &input, &[ROLE_USER.to_string()]).await?;

    tracing::info!(user_id = %user.id, %customer_id, "user created for customer");
    let tags = tags(user.id, Some(customer_id));
    Ok(invalidate(state, user, tags))
}

pub async fn find(state: &AppState, id: Uuid) -> Result<User, ServiceError> {
    db::users::find_by_id(&state.pool, id)
        .await?
        .ok_or(ServiceError::NotFound("User"))
}

/// Change a user's email and, when a non-blank one is given, its password.
pub async fn edit(state: &AppState, id: Uuid, input: CredentialsInput) -> Result<Outcome<User>, ServiceError> {
    let (email, password) = validation::both(
        validation::email(input.email.as_deref()),
        validation::new_password(input.password.as_deref()),
    )?;

    let password_hash = match password {
        Some(password) => Some(hash(password).await?),
        None => None,
    };

    let user = db::users::update_credentials(&state.pool, id, email, password_hash.as_deref())
        .await
        .map_err(unique_to_field)?
        .ok_or(ServiceError::NotFound("User"))?;

    tracing::info!(user_id = %id, "user updated");
    let tags = tags(id, user.customer_id);
    Ok(invalidate(state, user, tags))
}

/// Attach an unbound user to `customer_id`.
pub async fn bind(state: &AppState, customer_id: Uuid, id: Uuid) -> Result<Outcome<User>, ServiceError> {
    let mut tx = state.pool.begin().await?;

    let user = db::users::find_for_update(&mut *tx, id)
        .await?
        .ok_or(ServiceError::NotFound("User"))?;
    if user.is_admin() {
        return Err(BindError::Administrator.into());
    }
    let current = user.binding();
    let next = current.bind(customer_id)?;

    let user = db::users::set_customer(&mut *tx, id, current.customer_id(), next.customer_id())
        .await?
        .ok_or(BindError::AlreadyBound { own: false })?;

    tx.commit().await?;

    tracing::info!(user_id = %id, %customer_id, "user bound");
    Ok(invalidate(state, user, tags(id, Some(customer_id))))
}

/// Detach a user from `customer_id`, which must be its current owner.
pub async fn unbind(state: &AppState, customer_id: Uuid, id: Uuid) -> Result<Outcome<User>, ServiceError> {
    let mut tx = state.pool.begin().await?;

    let user = db::users::find_for_update(&mut *tx, id)
        .await?
        .ok_or(ServiceError::NotFound("User"))?;
    let current = user.binding();
    let next = current.unbind(customer_id)?;

    let user = db::users::set_customer(&mut *tx, id, current.customer_id(), next.customer_id())
        .await?
        .ok_or(BindError::NotOwner)?;

    tx.commit().await?;

    tracing::info!(user_id = %id, %customer_id, "user unbound");
    Ok(invalidate(state, user, tags(id, Some(customer_id))))
}

pub async fn delete(state: &AppState, customer_id: Uuid, id: Uuid) -> Result<Outcome<()>, ServiceError> {
    if !db::users::delete(&state.pool, id, customer_id).await? {
        return Err(ServiceError::NotFound("User"));
    }

    tracing::info!(user_id = %id, %customer_id, "user deleted");
    Ok(invalidate(state, (), tags(id, Some(customer_id))))
}

/// Check login credentials. `None` means unknown email or wrong password.
pub async fn authenticate(state: &AppState, email: &str, password: &str) -> Result<Option<User>, ServiceError> {
    let Some(user) = db::users::find_by_email(&state.pool, email).await? else {
        return Ok(None);
    };

    let valid = password::verify_blocking(password.to_string(), user.password_hash.clone())
        .await
        .map_err(ServiceError::Hashing)?;

    Ok(valid.then_some(user))
}

/// Make sure the configured administrator exists and carries `ROLE_ADMIN`.
pub async fn ensure_admin(state: &AppState, seed: &AdminSeed) -> Result<User, ServiceError> {
    let admin_roles = vec![ROLE_USER.to_string(), ROLE_ADMIN.to_string()];

    if let Some(user) = db::users::find_by_email(&state.pool, &seed.email).await? {
        if !user.is_admin() {
            db::users::set_roles(&state.pool, user.id, &admin_roles).await?;
            tracing::info!(user_id = %user.id, "granted admin role to existing user");
            state.cache.invalidate(&tags(user.id, user.customer_id));
        }
        return find(state, user.id).await;
    }

    let input = CredentialsInput {
        email: Some(seed.email.clone()),
        password: Some(seed.password.clone()),
    };
    let user = insert(state, None, &input, &admin_roles).await?;
    tracing::info!(user_id = %user.id, "administrator created");
    Ok(user)
}

pub async fn list_view(state: &AppState, customer_id: Uuid, page: Page) -> Result<CachedView, ServiceError> {
    state
        .cache
        .get_or_try_insert_with(
            CacheKey::UserList { tenant: customer_id, page: page.page, limit: page.limit },
            |_| vec![Tag::Users, Tag::Customer(customer_id)],
            || async {
                let users = db::users::list_by_customer(&state.pool, customer_id, page).await?;
                let resources = state.resources();
                let body: Vec<_> = users.iter().map(|u| resources.user(u)).collect();
                Ok::<_, ServiceError>(CachedView::new(Some(customer_id), &body)?)
            },
        )
        .await
}

pub async fn detail_view(state: &AppState, id: Uuid) -> Result<CachedView, ServiceError> {
    state
        .cache
        .get_or_try_insert_with(
            CacheKey::User(id),
            |view| {
                let mut tags = vec![Tag::User(id)];
                tags.extend(view.owner.map(Tag::Customer));
                tags
            },
            || async {
                let user = find(state, id).await?;
                let body = state.resources().user(&user);
                Ok::<_, ServiceError>(CachedView::new(user.customer_id, &body)?)
            },
        )
        .await
}
