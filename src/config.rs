use std::net::IpAddr;
use std::time::Duration;

use chrono_tz::Tz;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: IpAddr,
    pub port: u16,
    pub base_url: String,
    pub log_level: String,
    pub timezone: Tz,
    pub token_ttl_minutes: i64,
    pub cache_capacity: u64,
    pub cache_ttl: Duration,
    pub admin: Option<AdminSeed>,
}

/// Administrator account created at startup when absent.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;
        let jwt_secret = env_required("JWT_SECRET")?;

        let host: IpAddr = env_or("DIRECTORY_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid DIRECTORY_HOST: {e}"))?;

        let port: u16 = env_or("DIRECTORY_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid DIRECTORY_PORT: {e}"))?;

        let base_url = env_or("DIRECTORY_BASE_URL", &format!("http://{host}:{port}"))
            .trim_end_matches('/')
            .to_string();

        let log_level = env_or("DIRECTORY_LOG_LEVEL", "info");

        let timezone: Tz = env_or("DIRECTORY_TIMEZONE", "Europe/Paris")
            .parse()
            .map_err(|e| format!("Invalid DIRECTORY_TIMEZONE: {e}"))?;

        let token_ttl_minutes: i64 = env_or("DIRECTORY_TOKEN_TTL_MINUTES", "60")
            .parse()
            .map_err(|e| format!("Invalid DIRECTORY_TOKEN_TTL_MINUTES: {e}"))?;
        if token_ttl_minutes <= 0 {
            return Err("DIRECTORY_TOKEN_TTL_MINUTES must be positive".to_string());
        }

        let cache_capacity: u64 = env_or("DIRECTORY_CACHE_CAPACITY", "10000")
            .parse()
            .map_err(|e| format!("Invalid DIRECTORY_CACHE_CAPACITY: {e}"))?;

        let cache_ttl = env_or("DIRECTORY_CACHE_TTL_SECONDS", "300")
            .parse()
            .map(Duration::from_secs)
            .map_err(|e| format!("Invalid DIRECTORY_CACHE_TTL_SECONDS: {e}"))?;

        let admin = match (
            std::env::var("DIRECTORY_ADMIN_EMAIL").ok(),
            std::env::var("DIRECTORY_ADMIN_PASSWORD").ok(),
        ) {
            (Some(email), Some(password)) => Some(AdminSeed { email, password }),
            (None, None) => None,
            _ => {
                return Err(
                    "DIRECTORY_ADMIN_EMAIL and DIRECTORY_ADMIN_PASSWORD must be set together"
                        .to_string(),
                );
            }
        };

        Ok(Config {
            database_url,
            jwt_secret,
            host,
            port,
            base_url,
            log_level,
            timezone,
            token_ttl_minutes,
            cache_capacity,
            cache_ttl,
            admin,
        })
    }

    /// Absolute URL for an API path, e.g. `url("/api/users/1")`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
