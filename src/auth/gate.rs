//! Authorization gate for tenant-scoped operations.
//!
//! Every product and user operation resolves the acting principal's
//! customer exactly once, before any business logic runs.

use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::models::User;
use crate::state::AppState;

/// The customer a principal acts for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tenant {
    pub customer_id: Uuid,
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// The principal is not bound to any customer.
    NoCustomer,
    /// The target belongs to a different customer.
    WrongTenant,
    /// The operation is reserved to administrators.
    NotAdmin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Authorized(Tenant),
    Denied(DenyReason),
}

impl Access {
    /// Decide access for an already-loaded principal.
    pub fn for_principal(principal: &User) -> Self {
        match principal.customer_id {
            Some(customer_id) => Access::Authorized(Tenant {
                customer_id,
                user_id: principal.id,
            }),
            None => Access::Denied(DenyReason::NoCustomer),
        }
    }

    /// Turn a denial into a 403 naming `action`.
    pub fn require(self, action: &str) -> Result<Tenant, AppError> {
        match self {
            Access::Authorized(tenant) => Ok(tenant),
            Access::Denied(reason) => Err(denied(reason, action)),
        }
    }
}

impl Tenant {
    /// Check that a record owned by `owner` may be touched by this tenant.
    pub fn owns(&self, owner: Option<Uuid>) -> Access {
        if owner == Some(self.customer_id) {
            Access::Authorized(*self)
        } else {
            Access::Denied(DenyReason::WrongTenant)
        }
    }

    pub fn require_owner(&self, owner: Option<Uuid>, action: &str) -> Result<(), AppError> {
        self.owns(owner).require(action).map(|_| ())
    }
}

/// Load the principal behind a token. Its roles and binding may have changed
/// since the token was issued, so the token alone is not trusted.
pub async fn principal(state: &AppState, auth: &AuthUser) -> Result<User, AppError> {
    db::users::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Unknown principal".to_string()))
}

/// Resolve the principal's current customer from storage.
pub async fn authorize(state: &AppState, auth: &AuthUser) -> Result<Access, AppError> {
    Ok(Access::for_principal(&principal(state, auth).await?))
}

/// Load the principal and require `ROLE_ADMIN` on its stored roles.
pub async fn admin(state: &AppState, auth: &AuthUser, action: &str) -> Result<User, AppError> {
    let principal = principal(state, auth).await?;
    require_admin(&principal, action)?;
    Ok(principal)
}

pub fn require_admin(principal: &User, action: &str) -> Result<(), AppError> {
    if principal.is_admin() {
        Ok(())
    } else {
        Err(denied(DenyReason::NotAdmin, action))
    }
}

/// Shorthand for `authorize(..).require(action)`.
pub async fn tenant(state: &AppState, auth: &AuthUser, action: &str) -> Result<Tenant, AppError> {
    authorize(state, auth).await?.require(action)
}

fn denied(reason: DenyReason, action: &str) -> AppError {
    tracing::debug!(?reason, action, "access denied");
    AppError::Forbidden(format!("You do not have sufficient rights to {action}."))
}
