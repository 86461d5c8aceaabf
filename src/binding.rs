//! User ↔ Customer binding rules.
//!
//! A user is attached to at most one customer. Moving a user between
//! customers always takes an explicit unbind by the current owner followed by
//! a bind by the new one.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    Unbound,
    Bound(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BindError {
    #[error("This user is already bound to {}", bound_to(.own))]
    AlreadyBound { own: bool },
    #[error("This user is not bound to any customer")]
    NotBound,
    #[error("This user is bound to another customer")]
    NotOwner,
    #[error("An administrator cannot be bound to a customer")]
    Administrator,
}

fn bound_to(own: &bool) -> &'static str {
    if *own { "your customer" } else { "another customer" }
}

impl Binding {
    pub fn from_customer(customer_id: Option<Uuid>) -> Self {
        match customer_id {
            Some(id) => Binding::Bound(id),
            None => Binding::Unbound,
        }
    }

    pub fn customer_id(self) -> Option<Uuid> {
        match self {
            Binding::Bound(id) => Some(id),
            Binding::Unbound => None,
        }
    }

    /// Attach an unbound user to `requester`.
    pub fn bind(self, requester: Uuid) -> Result<Binding, BindError> {
        match self {
            Binding::Unbound => Ok(Binding::Bound(requester)),
            Binding::Bound(owner) => Err(BindError::AlreadyBound {
                own: owner == requester,
            }),
        }
    }

    /// Detach a user currently owned by `requester`.
    pub fn unbind(self, requester: Uuid) -> Result<Binding, BindError> {
        match self {
            Binding::Unbound => Err(BindError::NotBound),
            Binding::Bound(owner) if owner == requester => Ok(Binding::Unbound),
            Binding::Bound(_) => Err(BindError::NotOwner),
        }
    }
}
