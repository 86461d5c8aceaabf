use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::binding::Binding;

pub const ROLE_USER: &str = "ROLE_USER";
pub const ROLE_ADMIN: &str = "ROLE_ADMIN";

/// A user row joined with the name of the customer it is bound to, if any.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub customer_id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub roles: Vec<String>,
    pub registered_at: DateTime<Utc>,
}

impl User {
    pub fn binding(&self) -> Binding {
        Binding::from_customer(self.customer_id)
    }

    /// Stored roles plus `ROLE_USER`, deduplicated.
    pub fn roles(&self) -> Vec<String> {
        let mut roles = self.roles.clone();
        if !roles.iter().any(|r| r == ROLE_USER) {
            roles.push(ROLE_USER.to_string());
        }
        roles.sort();
        roles.dedup();
        roles
    }

    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|r| r == ROLE_ADMIN)
    }
}
