//! User Repository Implementation
//!
//! PostgreSQL implementation of the UserRepository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{escape_like, ListingRow, SummaryRow};
use crate::domain::{NewUser, ProfileStats, ProfileUpdate, User, UserListing, UserRepository, UserSummary};
use crate::infrastructure::database::is_unique_violation;
use crate::shared::error::AppError;
use crate::shared::pagination::{PageRequest, SortDirection};

/// Database row representation matching the users table schema.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    password_hash: String,
    display_name: String,
    bio: Option<String>,
    avatar_url: Option<String>,
    cover_url: Option<String>,
    location: Option<String>,
    website: Option<String>,
    email_verified: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> User {
        User {
            id: self.id,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            display_name: self.display_name,
            bio: self.bio,
            avatar_url: self.avatar_url,
            cover_url: self.cover_url,
            location: self.location,
            website: self.website,
            email_verified: self.email_verified,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StatsRow {
    followers: i64,
    following: i64,
    friends: i64,
    posts: i64,
}

/// PostgreSQL user repository implementation.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, email, password_hash, display_name, bio, avatar_url,
                   cover_url, location, website, email_verified, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserRow::into_user))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, email, password_hash, display_name, bio, avatar_url,
                   cover_url, location, website, email_verified, created_at, updated_at
            FROM users
            WHERE LOWER(email) = LOWER($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserRow::into_user))
    }

    async fn create(&self, user: &NewUser) -> Result<User, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, username, email, password_hash, display_name)
            VALUES ($1, $2, LOWER($3), $4, $5)
            RETURNING id, username, email, password_hash, display_name, bio, avatar_url,
                      cover_url, location, website, email_verified, created_at, updated_at
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.display_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::already_exists("Email or username is already taken")
            } else {
                AppError::Database(e)
            }
        })?;

        Ok(row.into_user())
    }

    /// Empty strings clear optional fields.
    async fn update_profile(&self, id: i64, update: &ProfileUpdate) -> Result<User, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET display_name = COALESCE($2, display_name),
                bio          = NULLIF(COALESCE($3, bio), ''),
                avatar_url   = NULLIF(COALESCE($4, avatar_url), ''),
                cover_url    = NULLIF(COALESCE($5, cover_url), ''),
                location     = NULLIF(COALESCE($6, location), ''),
                website      = NULLIF(COALESCE($7, website), ''),
                updated_at   = NOW()
            WHERE id = $1
            RETURNING id, username, email, password_hash, display_name, bio, avatar_url,
                      cover_url, location, website, email_verified, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&update.display_name)
        .bind(&update.bio)
        .bind(&update.avatar_url)
        .bind(&update.cover_url)
        .bind(&update.location)
        .bind(&update.website)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

        Ok(row.into_user())
    }

    async fn find_summaries(&self, ids: &[i64]) -> Result<Vec<UserSummary>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, SummaryRow>(
            "SELECT id, username, display_name, avatar_url FROM users WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(SummaryRow::into_summary).collect())
    }

    async fn stats(&self, id: i64) -> Result<ProfileStats, AppError> {
        let row = sqlx::query_as::<_, StatsRow>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM follows     WHERE followee_id = $1) AS followers,
                (SELECT COUNT(*) FROM follows     WHERE follower_id = $1) AS following,
                (SELECT COUNT(*) FROM friendships WHERE user_id = $1)     AS friends,
                (SELECT COUNT(*) FROM posts       WHERE author_id = $1)   AS posts
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(ProfileStats {
            followers: row.followers,
            following: row.following,
            friends: row.friends,
            posts: row.posts,
        })
    }

    async fn search(
        &self,
        query: &str,
        exclude: &[i64],
        page: PageRequest,
    ) -> Result<Vec<UserListing>, AppError> {
        let pattern = format!("{}%", escape_like(query));

        let rows = sqlx::query_as::<_, ListingRow>(
            r#"
            SELECT id, username, display_name, avatar_url, created_at AS listed_at
            FROM users
            WHERE (username ILIKE $1 OR display_name ILIKE $1)
              AND NOT (id = ANY($2))
              AND ($3::timestamptz IS NULL OR (created_at, id) < ($3, $4))
            ORDER BY created_at DESC, id DESC
            LIMIT $5
            "#,
        )
        .bind(pattern)
        .bind(exclude)
        .bind(page.cursor_at())
        .bind(page.cursor_id(SortDirection::Descending))
        .bind(page.fetch_limit())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ListingRow::into_listing).collect())
    }

    async fn create_verification(
        &self,
        user_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM email_verifications WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO email_verifications (token_hash, user_id, expires_at) VALUES ($1, $2, $3)",
        )
        .bind(token_hash)
        .bind(user_id)
        .bind(expires_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn consume_verification(&self, token_hash: &str) -> Result<Option<i64>, AppError> {
        let mut tx = self.pool.begin().await?;

        let consumed: Option<(i64, DateTime<Utc>)> = sqlx::query_as(
            "DELETE FROM email_verifications WHERE token_hash = $1 RETURNING user_id, expires_at",
        )
        .bind(token_hash)
        .fetch_optional(&mut *tx)
        .await?;

        let user_id = match consumed {
            Some((user_id, expires_at)) if expires_at > Utc::now() => user_id,
            _ => {
                tx.commit().await?;
                return Ok(None);
            }
        };

        sqlx::query("UPDATE users SET email_verified = TRUE, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(user_id))
    }
}
