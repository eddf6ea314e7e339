//! Ports for the non-relational collaborators: the rate-limit counter store,
//! the object store for uploaded media, and readiness probes.

use std::time::Duration;

use async_trait::async_trait;

use crate::shared::error::AppError;

/// Counter state after one hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowHit {
    /// Hits in the current window including this one.
    pub count: u64,
    /// Time until the window resets.
    pub resets_in: Duration,
}

/// Fixed-window hit counter.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Record a hit on `key`. The first hit of a window starts a window of `window`.
    async fn hit(&self, key: &str, window: Duration) -> Result<WindowHit, AppError>;
}

/// Blob storage addressed by generated keys.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<(), AppError>;

    /// Public URL for `key`. Pure function of the key.
    fn public_url(&self, key: &str) -> String;
}

/// A dependency checked by the readiness endpoint.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DependencyProbe: Send + Sync {
    fn name(&self) -> &'static str;

    /// Round-trip to the dependency. The error string is logged, never returned.
    async fn check(&self) -> Result<(), String>;
}
