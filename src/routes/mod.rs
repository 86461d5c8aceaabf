pub mod auth;
pub mod customers;
pub mod extract;
pub mod products;
pub mod users;

use axum::Router;
use axum::routing::{get, post, put};

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Auth
        .route("/api/login_check", post(auth::login))
        .route("/api/register", post(users::register))
        // Customers
        .route("/api/customers", get(customers::list).post(customers::create))
        .route(
            "/api/customers/{id}",
            get(customers::get)
                .put(customers::update)
                .delete(customers::delete),
        )
        .route("/api/customers/{id}/products", post(customers::create_product))
        .route("/api/customers/{id}/users", post(customers::create_user))
        // Products
        .route("/api/products", get(products::list).post(products::create))
        .route(
            "/api/products/{id}",
            get(products::get)
                .put(products::update)
                .delete(products::delete),
        )
        // Users
        .route("/api/users", get(users::list).put(users::update_self))
        .route(
            "/api/users/{id}",
            get(users::get).put(users::update).delete(users::delete),
        )
        .route("/api/users/bind/{id}", put(users::bind))
        .route("/api/users/unbind/{id}", put(users::unbind))
}
