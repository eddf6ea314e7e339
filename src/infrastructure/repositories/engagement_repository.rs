//! Engagement Repository Implementation
//!
//! Likes and shares move a denormalized counter on `posts`; the row insert,
//! counter update and notification commit together or not at all.

use async_trait::async_trait;
use sqlx::PgPool;

use super::notification_repository::insert_notification;
use super::post_repository::PostViewRow;
use crate::domain::{EngagementRepository, NotificationDraft, PostView};
use crate::shared::error::AppError;
use crate::shared::pagination::{PageRequest, SortDirection};

/// Which table and counter a countable toggle touches.
#[derive(Debug, Clone, Copy)]
enum Counted {
    Like,
    Share,
}

impl Counted {
    fn insert_sql(self) -> &'static str {
        match self {
            Self::Like => {
                "INSERT INTO post_likes (user_id, post_id) VALUES ($1, $2) ON CONFLICT DO NOTHING"
            }
            Self::Share => {
                "INSERT INTO post_shares (user_id, post_id) VALUES ($1, $2) ON CONFLICT DO NOTHING"
            }
        }
    }

    fn increment_sql(self) -> &'static str {
        match self {
            Self::Like => "UPDATE posts SET likes_count = likes_count + 1 WHERE id = $1",
            Self::Share => "UPDATE posts SET shares_count = shares_count + 1 WHERE id = $1",
        }
    }
}

#[derive(Clone)]
pub struct PgEngagementRepository {
    pool: PgPool,
}

impl PgEngagementRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_counted(
        &self,
        kind: Counted,
        user_id: i64,
        post_id: i64,
        notification: Option<NotificationDraft>,
    ) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(kind.insert_sql())
            .bind(user_id)
            .bind(post_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if inserted == 0 {
            // Dropping the transaction rolls it back.
            return Ok(false);
        }

        sqlx::query(kind.increment_sql())
            .bind(post_id)
            .execute(&mut *tx)
            .await?;

        if let Some(draft) = &notification {
            insert_notification(&mut tx, draft).await?;
        }

        tx.commit().await?;
        Ok(true)
    }
}

#[async_trait]
impl EngagementRepository for PgEngagementRepository {
    async fn like(
        &self,
        user_id: i64,
        post_id: i64,
        notification: Option<NotificationDraft>,
    ) -> Result<bool, AppError> {
        self.insert_counted(Counted::Like, user_id, post_id, notification).await
    }

    async fn unlike(&self, user_id: i64, post_id: i64) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM post_likes WHERE user_id = $1 AND post_id = $2")
            .bind(user_id)
            .bind(post_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if removed == 0 {
            return Ok(false);
        }

        sqlx::query("UPDATE posts SET likes_count = GREATEST(likes_count - 1, 0) WHERE id = $1")
            .bind(post_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn save(&self, user_id: i64, post_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query(
            "INSERT INTO saved_posts (user_id, post_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(post_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn unsave(&self, user_id: i64, post_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM saved_posts WHERE user_id = $1 AND post_id = $2")
            .bind(user_id)
            .bind(post_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn share(
        &self,
        user_id: i64,
        post_id: i64,
        notification: Option<NotificationDraft>,
    ) -> Result<bool, AppError> {
        self.insert_counted(Counted::Share, user_id, post_id, notification).await
    }

    async fn saved_posts(&self, user_id: i64, page: PageRequest) -> Result<Vec<PostView>, AppError> {
        let rows = sqlx::query_as::<_, PostViewRow>(
            r#"
            SELECT p.id, p.author_id, p.content, p.media_urls, p.visibility,
                   p.likes_count, p.comments_count, p.shares_count, p.created_at, p.updated_at,
                   u.username AS author_username, u.display_name AS author_display_name,
                   u.avatar_url AS author_avatar_url,
                   EXISTS (SELECT 1 FROM post_likes l WHERE l.post_id = p.id AND l.user_id = $1) AS liked_by_viewer,
                   TRUE AS saved_by_viewer,
                   sp.created_at AS listed_at
            FROM saved_posts sp
            JOIN posts p ON p.id = sp.post_id
            JOIN users u ON u.id = p.author_id
            WHERE sp.user_id = $1
              AND (
                    p.author_id = $1
                 OR p.visibility = 'public'
                 OR (p.visibility = 'friends' AND EXISTS (
                        SELECT 1 FROM friendships fr WHERE fr.user_id = $1 AND fr.friend_id = p.author_id))
              )
              AND ($2::timestamptz IS NULL OR (sp.created_at, p.id) < ($2, $3))
            ORDER BY sp.created_at DESC, p.id DESC
            LIMIT $4
            "#,
        )
        .bind(user_id)
        .bind(page.cursor_at())
        .bind(page.cursor_id(SortDirection::Descending))
        .bind(page.fetch_limit())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PostViewRow::into_view).collect())
    }
}
