mod common;

use uuid::Uuid;

use directory::cache::{CacheKey, Tag};
use directory::services;
use directory::services::products::ProductInput;
use serde_json::json;

#[tokio::test]
async fn bind_and_unbind_evict_user_and_tenant_tags() {
    let app = common::spawn_app().await;
    let (customer, _) = app.tenant("Acme", "alice@test.com").await;
    let customer = Uuid::parse_str(&customer).unwrap();
    let user = Uuid::parse_str(&app.unbound_user("carol@test.com").await).unwrap();

    services::users::detail_view(&app.state, user).await.unwrap();
    assert!(app.state.cache.get(&CacheKey::User(user)).is_some());

    let outcome = services::users::bind(&app.state, customer, user).await.unwrap();
    assert_eq!(outcome.value.customer_id, Some(customer));
    assert_eq!(
        outcome.invalidated,
        vec![Tag::Users, Tag::User(user), Tag::Customer(customer)]
    );
    assert!(app.state.cache.get(&CacheKey::User(user)).is_none());

    services::customers::aggregate_view(&app.state, customer).await.unwrap();
    assert!(app.state.cache.get(&CacheKey::CustomerAggregate(customer)).is_some());

    let outcome = services::users::unbind(&app.state, customer, user).await.unwrap();
    assert_eq!(outcome.value.customer_id, None);
    assert_eq!(
        outcome.invalidated,
        vec![Tag::Users, Tag::User(user), Tag::Customer(customer)]
    );
    assert!(app.state.cache.get(&CacheKey::CustomerAggregate(customer)).is_none());

    common::cleanup(app).await;
}

#[tokio::test]
async fn product_update_evicts_product_and_tenant_tags() {
    let app = common::spawn_app().await;
    let (customer, token) = app.tenant("Acme", "alice@test.com").await;
    let customer = Uuid::parse_str(&customer).unwrap();
    let product = app.create_product(&token, "Widget", "1.00").await;
    let product = Uuid::parse_str(product["id"].as_str().unwrap()).unwrap();

    services::products::detail_view(&app.state, product).await.unwrap();

    let input = ProductInput {
        name: Some("Gadget".to_string()),
        price: Some(json!("2.50")),
        description: None,
    };
    let outcome = services::products::update(&app.state, customer, product, input)
        .await
        .unwrap();
    assert_eq!(outcome.value.name, "Gadget");
    assert_eq!(
        outcome.invalidated,
        vec![Tag::Products, Tag::Product(product), Tag::Customer(customer)]
    );
    assert!(app.state.cache.get(&CacheKey::Product(product)).is_none());

    common::cleanup(app).await;
}

#[tokio::test]
async fn administrator_cannot_be_bound() {
    let app = common::spawn_app().await;
    let (customer, _) = app.tenant("Acme", "alice@test.com").await;
    let customer = Uuid::parse_str(&customer).unwrap();
    let admin: Uuid = sqlx::query_scalar("SELECT id FROM users WHERE email = $1")
        .bind(common::ADMIN_EMAIL)
        .fetch_one(&app.pool)
        .await
        .unwrap();

    let err = services::users::bind(&app.state, customer, admin).await.unwrap_err();
    assert!(matches!(
        err,
        services::ServiceError::Binding(directory::binding::BindError::Administrator)
    ));

    common::cleanup(app).await;
}
