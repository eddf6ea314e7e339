//! Notification Repository Implementation
//!
//! Also hosts [`insert_notification`], used by the other repositories to write
//! a notification inside their own transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use crate::domain::{Notification, NotificationDraft, NotificationKind, NotificationRepository, UserSummary};
use crate::shared::error::AppError;
use crate::shared::pagination::{PageRequest, SortDirection};

/// Insert `draft` on the caller's connection (normally an open transaction).
pub(crate) async fn insert_notification(
    conn: &mut PgConnection,
    draft: &NotificationDraft,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO notifications (id, recipient_id, actor_id, kind, post_id, comment_id)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(draft.id)
    .bind(draft.recipient_id)
    .bind(draft.actor_id)
    .bind(draft.kind.as_str())
    .bind(draft.post_id)
    .bind(draft.comment_id)
    .execute(conn)
    .await?;

    Ok(())
}

#[derive(Debug, sqlx::FromRow)]
struct NotificationRow {
    id: i64,
    recipient_id: i64,
    kind: String,
    post_id: Option<i64>,
    comment_id: Option<i64>,
    read_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    actor_id: i64,
    actor_username: String,
    actor_display_name: String,
    actor_avatar_url: Option<String>,
}

impl NotificationRow {
    /// Rows with an unknown kind are skipped rather than failing the page.
    fn into_notification(self) -> Option<Notification> {
        let kind = NotificationKind::from_db(&self.kind)?;
        Some(Notification {
            id: self.id,
            recipient_id: self.recipient_id,
            actor: UserSummary {
                id: self.actor_id,
                username: self.actor_username,
                display_name: self.actor_display_name,
                avatar_url: self.actor_avatar_url,
            },
            kind,
            post_id: self.post_id,
            comment_id: self.comment_id,
            read_at: self.read_at,
            created_at: self.created_at,
        })
    }
}

#[derive(Clone)]
pub struct PgNotificationRepository {
    pool: PgPool,
}

impl PgNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for PgNotificationRepository {
    async fn list(
        &self,
        recipient_id: i64,
        unread_only: bool,
        page: PageRequest,
    ) -> Result<Vec<Notification>, AppError> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT n.id, n.recipient_id, n.kind, n.post_id, n.comment_id, n.read_at, n.created_at,
                   u.id AS actor_id, u.username AS actor_username,
                   u.display_name AS actor_display_name, u.avatar_url AS actor_avatar_url
            FROM notifications n
            JOIN users u ON u.id = n.actor_id
            WHERE n.recipient_id = $1
              AND (NOT $2 OR n.read_at IS NULL)
              AND ($3::timestamptz IS NULL OR (n.created_at, n.id) < ($3, $4))
            ORDER BY n.created_at DESC, n.id DESC
            LIMIT $5
            "#,
        )
        .bind(recipient_id)
        .bind(unread_only)
        .bind(page.cursor_at())
        .bind(page.cursor_id(SortDirection::Descending))
        .bind(page.fetch_limit())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(NotificationRow::into_notification)
            .collect())
    }

    async fn unread_count(&self, recipient_id: i64) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE recipient_id = $1 AND read_at IS NULL",
        )
        .bind(recipient_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn mark_read(&self, id: i64, recipient_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET read_at = COALESCE(read_at, NOW())
            WHERE id = $1 AND recipient_id = $2
            "#,
        )
        .bind(id)
        .bind(recipient_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_read(&self, recipient_id: i64) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE notifications SET read_at = NOW() WHERE recipient_id = $1 AND read_at IS NULL",
        )
        .bind(recipient_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
