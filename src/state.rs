use std::sync::Arc;

use sqlx::PgPool;

use crate::cache::TagCache;
use crate::clock::Clock;
use crate::config::Config;
use crate::rate_limit::LoginRateLimiter;
use crate::resources::{CachedView, Resources};

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub clock: Clock,
    pub cache: TagCache<CachedView>,
    pub login_limiter: LoginRateLimiter,
}

impl AppState {
    pub fn new(pool: PgPool, config: Config) -> Self {
        let clock = Clock::new(config.timezone);
        let cache = TagCache::new(config.cache_capacity, config.cache_ttl);
        Self {
            pool,
            config,
            clock,
            cache,
            login_limiter: LoginRateLimiter::new(),
        }
    }

    pub fn resources(&self) -> Resources<'_> {
        Resources::new(&self.config, &self.clock)
    }
}
