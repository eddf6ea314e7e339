//! Comment Repository Implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::notification_repository::insert_notification;
use crate::domain::{Comment, CommentRepository, CommentView, NewComment, NotificationDraft, UserSummary};
use crate::shared::error::AppError;
use crate::shared::pagination::{PageRequest, SortDirection};

#[derive(Debug, sqlx::FromRow)]
struct CommentRow {
    id: i64,
    post_id: i64,
    author_id: i64,
    content: String,
    created_at: DateTime<Utc>,
}

impl CommentRow {
    fn into_comment(self) -> Comment {
        Comment {
            id: self.id,
            post_id: self.post_id,
            author_id: self.author_id,
            content: self.content,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CommentViewRow {
    #[sqlx(flatten)]
    comment: CommentRow,
    author_username: String,
    author_display_name: String,
    author_avatar_url: Option<String>,
}

impl CommentViewRow {
    fn into_view(self) -> CommentView {
        let author = UserSummary {
            id: self.comment.author_id,
            username: self.author_username,
            display_name: self.author_display_name,
            avatar_url: self.author_avatar_url,
        };
        CommentView {
            comment: self.comment.into_comment(),
            author,
        }
    }
}

#[derive(Clone)]
pub struct PgCommentRepository {
    pool: PgPool,
}

impl PgCommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentRepository for PgCommentRepository {
    async fn create(
        &self,
        comment: &NewComment,
        notification: Option<NotificationDraft>,
    ) -> Result<CommentView, AppError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, CommentViewRow>(
            r#"
            WITH inserted AS (
                INSERT INTO comments (id, post_id, author_id, content)
                VALUES ($1, $2, $3, $4)
                RETURNING id, post_id, author_id, content, created_at
            )
            SELECT c.id, c.post_id, c.author_id, c.content, c.created_at,
                   u.username AS author_username, u.display_name AS author_display_name,
                   u.avatar_url AS author_avatar_url
            FROM inserted c
            JOIN users u ON u.id = c.author_id
            "#,
        )
        .bind(comment.id)
        .bind(comment.post_id)
        .bind(comment.author_id)
        .bind(&comment.content)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE posts SET comments_count = comments_count + 1 WHERE id = $1")
            .bind(comment.post_id)
            .execute(&mut *tx)
            .await?;

        if let Some(draft) = &notification {
            insert_notification(&mut tx, draft).await?;
        }

        tx.commit().await?;
        Ok(row.into_view())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Comment>, AppError> {
        let row = sqlx::query_as::<_, CommentRow>(
            "SELECT id, post_id, author_id, content, created_at FROM comments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(CommentRow::into_comment))
    }

    async fn list_for_post(
        &self,
        post_id: i64,
        page: PageRequest,
    ) -> Result<Vec<CommentView>, AppError> {
        let rows = sqlx::query_as::<_, CommentViewRow>(
            r#"
            SELECT c.id, c.post_id, c.author_id, c.content, c.created_at,
                   u.username AS author_username, u.display_name AS author_display_name,
                   u.avatar_url AS author_avatar_url
            FROM comments c
            JOIN users u ON u.id = c.author_id
            WHERE c.post_id = $1
              AND ($2::timestamptz IS NULL OR (c.created_at, c.id) > ($2, $3))
            ORDER BY c.created_at ASC, c.id ASC
            LIMIT $4
            "#,
        )
        .bind(post_id)
        .bind(page.cursor_at())
        .bind(page.cursor_id(SortDirection::Ascending))
        .bind(page.fetch_limit())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(CommentViewRow::into_view).collect())
    }

    async fn delete(&self, id: i64, post_id: i64) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM comments WHERE id = $1 AND post_id = $2")
            .bind(id)
            .bind(post_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if removed == 0 {
            return Ok(false);
        }

        sqlx::query(
            "UPDATE posts SET comments_count = GREATEST(comments_count - 1, 0) WHERE id = $1",
        )
        .bind(post_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }
}
