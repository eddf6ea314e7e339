//! Cache Module
//!
//! Redis connection management and the rate-limit counter stores.
//!
//! ```text
//! +-------------------+
//! |   RateLimiter     |
//! +-------------------+
//!          |
//!          v
//! +-------------------+
//! |  RateLimitStore   |  <-- domain port
//! +-------------------+
//!      |         |
//!      v         v
//!   Redis     DashMap (single node / dev)
//! ```

mod rate_limit_store;

pub use rate_limit_store::{MemoryRateLimitStore, RedisRateLimitStore};

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::Client;
use tracing::{info, instrument};

use crate::config::RedisSettings;
use crate::domain::ports::DependencyProbe;

/// Creates a Redis connection manager with automatic reconnection.
#[instrument(skip(settings))]
pub async fn create_redis_client(
    settings: &RedisSettings,
) -> Result<ConnectionManager, redis::RedisError> {
    info!("Connecting to Redis...");
    let client = Client::open(settings.url.as_str())?;
    let manager = ConnectionManager::new(client).await?;
    info!("Redis connection established");
    Ok(manager)
}

/// Readiness probe issuing `PING`.
#[derive(Clone)]
pub struct RedisProbe {
    conn: ConnectionManager,
}

impl RedisProbe {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl DependencyProbe for RedisProbe {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn check(&self) -> Result<(), String> {
        let mut conn = self.conn.clone();
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}

/// Cache key prefixes.
pub mod keys {
    /// Prefix for rate limiting counters (e.g. "ratelimit:post_create:42")
    pub const RATE_LIMIT: &str = "ratelimit:";

    /// Generates a rate limit key from a rule prefix and a subject id.
    #[inline]
    pub fn rate_limit(prefix: &str, subject: impl std::fmt::Display) -> String {
        format!("{}{}:{}", RATE_LIMIT, prefix, subject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_key_layout() {
        assert_eq!(keys::rate_limit("verify_resend", 42), "ratelimit:verify_resend:42");
    }
}
