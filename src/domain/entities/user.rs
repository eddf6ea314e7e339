//! User entity and repository trait.
//!
//! Maps to the `users` and `email_verifications` tables.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::shared::error::AppError;
use crate::shared::pagination::{Cursor, Keyset, PageRequest};

/// A registered account.
///
/// Maps to the `users` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - username: VARCHAR(32) NOT NULL UNIQUE
/// - email: VARCHAR(255) NOT NULL UNIQUE
/// - password_hash: VARCHAR(255) NOT NULL
/// - display_name: VARCHAR(64) NOT NULL
/// - bio, avatar_url, cover_url, location, website: nullable profile fields
/// - email_verified: BOOLEAN NOT NULL DEFAULT FALSE
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub display_name: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub cover_url: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Public card for embedding in posts, comments and lists.
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            username: self.username.clone(),
            display_name: self.display_name.clone(),
            avatar_url: self.avatar_url.clone(),
        }
    }
}

impl Default for User {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            username: String::new(),
            email: String::new(),
            password_hash: String::new(),
            display_name: String::new(),
            bio: None,
            avatar_url: None,
            cover_url: None,
            location: None,
            website: None,
            email_verified: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// The public subset of a user shown next to content they authored.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

/// A user in a list ordered by some relationship timestamp
/// (followed at, friends since, blocked at, joined at).
#[derive(Debug, Clone, PartialEq)]
pub struct UserListing {
    pub user: UserSummary,
    pub listed_at: DateTime<Utc>,
}

impl Keyset for UserListing {
    fn keyset(&self) -> Cursor {
        Cursor::new(self.listed_at, self.user.id)
    }
}

/// Data for inserting a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub display_name: String,
}

/// Partial profile update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub cover_url: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
}

/// Counters shown on a profile page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProfileStats {
    pub followers: i64,
    pub following: i64,
    pub friends: i64,
    pub posts: i64,
}

/// Repository trait for User data access operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError>;

    /// Email lookup is case-insensitive.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Insert a user. A taken email or username yields `AlreadyExists`.
    async fn create(&self, user: &NewUser) -> Result<User, AppError>;

    async fn update_profile(&self, id: i64, update: &ProfileUpdate) -> Result<User, AppError>;

    /// Summaries for the given ids, in no particular order. Unknown ids are skipped.
    async fn find_summaries(&self, ids: &[i64]) -> Result<Vec<UserSummary>, AppError>;

    async fn stats(&self, id: i64) -> Result<ProfileStats, AppError>;

    /// Username / display-name prefix search, newest accounts first.
    async fn search(
        &self,
        query: &str,
        exclude: &[i64],
        page: PageRequest,
    ) -> Result<Vec<UserListing>, AppError>;

    /// Store a hashed email verification token, replacing older ones for the user.
    async fn create_verification(
        &self,
        user_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError>;

    /// Consume an unexpired token and mark its user verified. Returns the user id.
    async fn consume_verification(&self, token_hash: &str) -> Result<Option<i64>, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_copies_public_fields_only() {
        let user = User {
            id: 7,
            username: "ada".into(),
            email: "ada@example.com".into(),
            password_hash: "secret".into(),
            display_name: "Ada".into(),
            avatar_url: Some("https://cdn/a.png".into()),
            ..Default::default()
        };

        assert_eq!(
            user.summary(),
            UserSummary {
                id: 7,
                username: "ada".into(),
                display_name: "Ada".into(),
                avatar_url: Some("https://cdn/a.png".into()),
            }
        );
    }
}
