//! JSON representations returned by the API, with hypermedia links.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::clock::Clock;
use crate::config::Config;
use crate::models::{Customer, Product, User};

#[derive(Debug, Serialize)]
pub struct Link {
    pub href: String,
}

pub type Links = BTreeMap<&'static str, Link>;

#[derive(Debug, Serialize)]
pub struct CustomerRef {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct CustomerResource {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<FixedOffset>,
    #[serde(rename = "_links")]
    pub links: Links,
}

/// A customer together with everything it owns.
#[derive(Debug, Serialize)]
pub struct CustomerAggregate {
    #[serde(flatten)]
    pub customer: CustomerResource,
    pub users: Vec<UserResource>,
    pub products: Vec<ProductResource>,
}

#[derive(Debug, Serialize)]
pub struct ProductResource {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub description: Option<String>,
    pub created_at: DateTime<FixedOffset>,
    pub customer: CustomerRef,
    #[serde(rename = "_links")]
    pub links: Links,
}

#[derive(Debug, Serialize)]
pub struct UserResource {
    pub id: Uuid,
    pub email: String,
    pub roles: Vec<String>,
    pub registered_at: DateTime<FixedOffset>,
    pub customer: Option<CustomerRef>,
    #[serde(rename = "_links")]
    pub links: Links,
}

/// A serialized read response as held by the cache. `owner` is the customer
/// the represented record belongs to, checked against the reader on every hit.
#[derive(Debug, Clone)]
pub struct CachedView {
    pub owner: Option<Uuid>,
    pub body: Arc<serde_json::Value>,
}

impl CachedView {
    pub fn new<T: Serialize>(owner: Option<Uuid>, value: &T) -> Result<Self, serde_json::Error> {
        Ok(Self {
            owner,
            body: Arc::new(serde_json::to_value(value)?),
        })
    }
}

/// Builds resources with absolute links and localized timestamps.
#[derive(Clone, Copy)]
pub struct Resources<'a> {
    config: &'a Config,
    clock: &'a Clock,
}

impl<'a> Resources<'a> {
    pub fn new(config: &'a Config, clock: &'a Clock) -> Self {
        Self { config, clock }
    }

    pub fn customer_url(&self, id: Uuid) -> String {
        self.config.url(&format!("/api/customers/{id}"))
    }

    pub fn product_url(&self, id: Uuid) -> String {
        self.config.url(&format!("/api/products/{id}"))
    }

    pub fn user_url(&self, id: Uuid) -> String {
        self.config.url(&format!("/api/users/{id}"))
    }

    pub fn customer(&self, customer: &Customer) -> CustomerResource {
        let mut links = Links::new();
        links.insert("self", Link { href: self.customer_url(customer.id) });

        CustomerResource {
            id: customer.id,
            name: customer.name.clone(),
            created_at: self.clock.localize(customer.created_at),
            links,
        }
    }

    pub fn aggregate(&self, customer: &Customer, users: &[User], products: &[Product]) -> CustomerAggregate {
        CustomerAggregate {
            customer: self.customer(customer),
            users: users.iter().map(|u| self.user(u)).collect(),
            products: products.iter().map(|p| self.product(p)).collect(),
        }
    }

    pub fn product(&self, product: &Product) -> ProductResource {
        let url = self.product_url(product.id);
        let mut links = Links::new();
        links.insert("self", Link { href: url.clone() });
        links.insert("edit", Link { href: url.clone() });
        links.insert("delete", Link { href: url });

        ProductResource {
            id: product.id,
            name: product.name.clone(),
            price: product.price,
            description: product.description.clone(),
            created_at: self.clock.localize(product.created_at),
            customer: CustomerRef {
                id: product.customer_id,
                name: product.customer_name.clone(),
            },
            links,
        }
    }

    pub fn user(&self, user: &User) -> UserResource {
        let url = self.user_url(user.id);
        let mut links = Links::new();
        links.insert("self", Link { href: url.clone() });
        links.insert("edit", Link { href: url.clone() });
        links.insert("delete", Link { href: url });
        links.insert("bind", Link { href: self.config.url(&format!("/api/users/bind/{}", user.id)) });
        links.insert("unbind", Link { href: self.config.url(&format!("/api/users/unbind/{}", user.id)) });

        let customer = match (user.customer_id, &user.customer_name) {
            (Some(id), Some(name)) => Some(CustomerRef { id, name: name.clone() }),
            _ => None,
        };

        UserResource {
            id: user.id,
            email: user.email.clone(),
            roles: user.roles(),
            registered_at: self.clock.localize(user.registered_at),
            customer,
            links,
        }
    }
}
