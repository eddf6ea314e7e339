//! Rate-limit counter stores.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use redis::aio::ConnectionManager;
use redis::Script;
use tracing::{debug, instrument};

use crate::domain::ports::{RateLimitStore, WindowHit};
use crate::shared::error::AppError;

/// INCR, start the window on the first hit, report the remaining TTL.
/// Runs atomically so concurrent first hits cannot both skip the expiry.
static HIT_SCRIPT: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r#"
        local count = redis.call('INCR', KEYS[1])
        if count == 1 then
            redis.call('PEXPIRE', KEYS[1], ARGV[1])
        end
        local ttl = redis.call('PTTL', KEYS[1])
        if ttl < 0 then
            redis.call('PEXPIRE', KEYS[1], ARGV[1])
            ttl = tonumber(ARGV[1])
        end
        return {count, ttl}
        "#,
    )
});

/// Counters shared across instances through Redis.
#[derive(Clone)]
pub struct RedisRateLimitStore {
    conn: ConnectionManager,
}

impl RedisRateLimitStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl RateLimitStore for RedisRateLimitStore {
    #[instrument(skip(self), level = "debug")]
    async fn hit(&self, key: &str, window: Duration) -> Result<WindowHit, AppError> {
        let mut conn = self.conn.clone();
        let window_ms = u64::try_from(window.as_millis()).unwrap_or(u64::MAX).max(1);

        let (count, ttl_ms): (u64, i64) = HIT_SCRIPT
            .key(key)
            .arg(window_ms)
            .invoke_async(&mut conn)
            .await?;

        debug!(key, count, ttl_ms, "Rate limit hit recorded");
        Ok(WindowHit {
            count,
            resets_in: Duration::from_millis(u64::try_from(ttl_ms).unwrap_or(window_ms)),
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u64,
    reset_at: Instant,
}

/// In-process counters for single-node deployments and tests.
#[derive(Debug, Default)]
pub struct MemoryRateLimitStore {
    windows: DashMap<String, Window>,
}

impl MemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop windows that have already reset.
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.windows.retain(|_, w| w.reset_at > now);
    }
}

#[async_trait]
impl RateLimitStore for MemoryRateLimitStore {
    async fn hit(&self, key: &str, window: Duration) -> Result<WindowHit, AppError> {
        let now = Instant::now();
        let mut entry = self.windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            reset_at: now + window,
        });

        if entry.reset_at <= now {
            *entry = Window {
                count: 0,
                reset_at: now + window,
            };
        }
        entry.count += 1;

        Ok(WindowHit {
            count: entry.count,
            resets_in: entry.reset_at.saturating_duration_since(now),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_counts_within_window() {
        let store = MemoryRateLimitStore::new();
        let window = Duration::from_secs(60);

        assert_eq!(store.hit("k", window).await.unwrap().count, 1);
        assert_eq!(store.hit("k", window).await.unwrap().count, 2);
        assert_eq!(store.hit("other", window).await.unwrap().count, 1);
    }

    #[tokio::test]
    async fn test_memory_store_resets_after_window() {
        let store = MemoryRateLimitStore::new();
        let window = Duration::from_millis(20);

        store.hit("k", window).await.unwrap();
        store.hit("k", window).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        let hit = store.hit("k", window).await.unwrap();
        assert_eq!(hit.count, 1);
        assert!(hit.resets_in <= window);
    }

    #[tokio::test]
    async fn test_purge_removes_elapsed_windows() {
        let store = MemoryRateLimitStore::new();
        store.hit("k", Duration::from_millis(1)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        store.purge_expired();
        assert!(store.windows.is_empty());
    }
}
