//! Session entity and repository trait.
//!
//! Sessions back both the browser cookie and the bearer token. The raw token
//! is only ever held by the client; the `sessions` table stores its SHA-256.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::shared::error::AppError;

/// A login session.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: i64,
    pub user_id: i64,
    pub token_hash: String,
    pub user_agent: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Data for inserting a session.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub id: i64,
    pub user_id: i64,
    pub token_hash: String,
    pub user_agent: Option<String>,
    pub expires_at: DateTime<Utc>,
}

/// Repository trait for Session data access operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create(&self, session: &NewSession) -> Result<Session, AppError>;

    /// Session for `token_hash` if it exists and has not expired.
    async fn find_active(&self, token_hash: &str) -> Result<Option<Session>, AppError>;

    /// Returns whether a session was removed.
    async fn delete_by_token_hash(&self, token_hash: &str) -> Result<bool, AppError>;

    /// Purge expired sessions. Returns the number removed.
    async fn delete_expired(&self) -> Result<u64, AppError>;
}
