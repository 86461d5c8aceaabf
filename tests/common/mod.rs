use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{Value, json};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use directory::config::{AdminSeed, Config};
use directory::state::{AppState, SharedState};

pub const ADMIN_EMAIL: &str = "admin@test.com";
pub const ADMIN_PASSWORD: &str = "admin_password";
pub const PASSWORD: &str = "password123";

/// A running test server instance with a dedicated test database.
pub struct TestApp {
    pub addr: SocketAddr,
    pub pool: PgPool,
    pub state: SharedState,
    pub client: Client,
    pub db_name: String,
}

/// Status, JSON body and `Location` header of a response.
pub struct Reply {
    pub status: StatusCode,
    pub body: Value,
    pub location: Option<String>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn send(&self, request: RequestBuilder) -> Reply {
        let resp = request.send().await.expect("request failed");
        let status = resp.status();
        let location = resp
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body: Value = resp.json().await.unwrap_or(json!(null));
        Reply { status, body, location }
    }

    pub async fn register(&self, email: &str, password: &str) -> Reply {
        self.send(
            self.client
                .post(self.url("/api/register"))
                .json(&json!({ "email": email, "password": password })),
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> Reply {
        self.send(
            self.client
                .post(self.url("/api/login_check"))
                .json(&json!({ "username": email, "password": password })),
        )
        .await
    }

    /// Login and return the bearer token.
    pub async fn token(&self, email: &str, password: &str) -> String {
        let reply = self.login(email, password).await;
        assert_eq!(reply.status, StatusCode::OK, "login failed: {}", reply.body);
        reply.body["token"].as_str().unwrap().to_string()
    }

    pub async fn admin_token(&self) -> String {
        self.token(ADMIN_EMAIL, ADMIN_PASSWORD).await
    }

    /// Create a customer as the administrator, return its JSON.
    pub async fn create_customer(&self, admin_token: &str, name: &str) -> Value {
        let reply = self
            .post_auth("/api/customers", admin_token, &json!({ "name": name }))
            .await;
        assert_eq!(reply.status, StatusCode::CREATED, "create customer failed: {}", reply.body);
        reply.body
    }

    /// Create a customer with one bound user. Returns (customer_id, user token).
    pub async fn tenant(&self, name: &str, email: &str) -> (String, String) {
        let admin = self.admin_token().await;
        let customer = self.create_customer(&admin, name).await;
        let customer_id = customer["id"].as_str().unwrap().to_string();

        let reply = self
            .post_auth(
                &format!("/api/customers/{customer_id}/users"),
                &admin,
                &json!({ "email": email, "password": PASSWORD }),
            )
            .await;
        assert_eq!(reply.status, StatusCode::CREATED, "create user failed: {}", reply.body);

        (customer_id, self.token(email, PASSWORD).await)
    }

    /// Register an unbound user, return its id.
    pub async fn unbound_user(&self, email: &str) -> String {
        let reply = self.register(email, PASSWORD).await;
        assert_eq!(reply.status, StatusCode::CREATED, "register failed: {}", reply.body);
        reply.body["id"].as_str().unwrap().to_string()
    }

    pub async fn create_product(&self, token: &str, name: &str, price: &str) -> Value {
        let reply = self
            .post_auth(
                "/api/products",
                token,
                &json!({ "name": name, "price": price, "description": "A product" }),
            )
            .await;
        assert_eq!(reply.status, StatusCode::CREATED, "create product failed: {}", reply.body);
        reply.body
    }

    pub async fn get_auth(&self, path: &str, token: &str) -> Reply {
        self.send(self.client.get(self.url(path)).bearer_auth(token)).await
    }

    pub async fn post_auth(&self, path: &str, token: &str, body: &Value) -> Reply {
        self.send(self.client.post(self.url(path)).bearer_auth(token).json(body))
            .await
    }

    pub async fn put_auth(&self, path: &str, token: &str, body: &Value) -> Reply {
        self.send(self.client.put(self.url(path)).bearer_auth(token).json(body))
            .await
    }

    /// PUT without a body, as used by bind/unbind.
    pub async fn put_empty(&self, path: &str, token: &str) -> Reply {
        self.send(self.client.put(self.url(path)).bearer_auth(token)).await
    }

    pub async fn delete_auth(&self, path: &str, token: &str) -> Reply {
        self.send(self.client.delete(self.url(path)).bearer_auth(token))
            .await
    }
}

fn database_url_for(base_url: &str, db_name: &str) -> String {
    base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/{db_name}"))
        .unwrap_or_else(|| base_url.to_string())
}

/// Spawn a test app with a fresh temporary database and a seeded administrator.
pub async fn spawn_app() -> TestApp {
    let _ = dotenvy::dotenv();

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let db_name = format!("directory_test_{}", Uuid::now_v7().simple());

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url_for(&base_url, "postgres"))
        .await
        .expect("Failed to connect to postgres for test DB creation");

    sqlx::query(&format!("CREATE DATABASE \"{db_name}\""))
        .execute(&admin_pool)
        .await
        .expect("Failed to create test database");

    admin_pool.close().await;

    let test_url = database_url_for(&base_url, &db_name);
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&test_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations on test database");

    let config = Config {
        database_url: test_url,
        jwt_secret: "test-jwt-secret-that-is-long-enough".to_string(),
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        base_url: "http://localhost".to_string(),
        log_level: "warn".to_string(),
        timezone: chrono_tz::Europe::Paris,
        token_ttl_minutes: 60,
        cache_capacity: 10_000,
        cache_ttl: Duration::from_secs(300),
        admin: Some(AdminSeed {
            email: ADMIN_EMAIL.to_string(),
            password: ADMIN_PASSWORD.to_string(),
        }),
    };

    let state = Arc::new(AppState::new(pool.clone(), config));
    directory::seed_admin(&state)
        .await
        .expect("Failed to seed administrator");
    let app = directory::build_app(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        addr,
        pool,
        state,
        client,
        db_name,
    }
}

/// Drop the test database after tests complete.
pub async fn cleanup(app: TestApp) {
    let db_name = app.db_name.clone();
    app.pool.close().await;

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");
    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url_for(&base_url, "postgres"))
        .await
        .expect("Failed to connect for cleanup");

    let _ = sqlx::query(&format!("DROP DATABASE IF EXISTS \"{db_name}\" WITH (FORCE)"))
        .execute(&admin_pool)
        .await;

    admin_pool.close().await;
}
