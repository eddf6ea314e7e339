//! Common Test Utilities
//!
//! Shared helpers and fixtures.

use std::time::Duration;

use async_trait::async_trait;
use axum::body::to_bytes;
use axum::response::Response;
use chrono::{DateTime, Utc};
use serde_json::Value;

use social_server::domain::ports::{RateLimitStore, WindowHit};
use social_server::shared::{AppError, Cursor, Keyset};

/// Read a response body as JSON.
pub async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

/// A listing row ordered by `(at, id)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub id: i64,
    pub at: DateTime<Utc>,
}

impl Keyset for Row {
    fn keyset(&self) -> Cursor {
        Cursor::new(self.at, self.id)
    }
}

/// Counter store whose backend is always down.
pub struct UnreachableStore;

#[async_trait]
impl RateLimitStore for UnreachableStore {
    async fn hit(&self, _key: &str, _window: Duration) -> Result<WindowHit, AppError> {
        Err(AppError::server_error("connection refused"))
    }
}
