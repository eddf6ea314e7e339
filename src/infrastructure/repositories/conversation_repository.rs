//! Conversation Repository Implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{
    direct_key, Conversation, ConversationRepository, ConversationSummary, Message, NewMessage,
    UserSummary,
};
use crate::shared::error::AppError;
use crate::shared::pagination::{PageRequest, SortDirection};

#[derive(Debug, sqlx::FromRow)]
struct ConversationRow {
    id: i64,
    created_at: DateTime<Utc>,
    last_message_at: DateTime<Utc>,
}

impl From<ConversationRow> for Conversation {
    fn from(row: ConversationRow) -> Self {
        Self {
            id: row.id,
            created_at: row.created_at,
            last_message_at: row.last_message_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    id: i64,
    conversation_id: i64,
    sender_id: i64,
    content: String,
    media_url: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Self {
            id: row.id,
            conversation_id: row.conversation_id,
            sender_id: row.sender_id,
            content: row.content,
            media_url: row.media_url,
            created_at: row.created_at,
        }
    }
}

/// Inbox row. The `last_*` columns are NULL for a conversation with no messages.
#[derive(Debug, sqlx::FromRow)]
struct InboxRow {
    #[sqlx(flatten)]
    conversation: ConversationRow,
    other_id: i64,
    other_username: String,
    other_display_name: String,
    other_avatar_url: Option<String>,
    last_id: Option<i64>,
    last_sender_id: Option<i64>,
    last_content: Option<String>,
    last_media_url: Option<String>,
    last_created_at: Option<DateTime<Utc>>,
}

impl InboxRow {
    fn into_summary(self) -> ConversationSummary {
        let last_message = match (self.last_id, self.last_sender_id, self.last_content, self.last_created_at) {
            (Some(id), Some(sender_id), Some(content), Some(created_at)) => Some(Message {
                id,
                conversation_id: self.conversation.id,
                sender_id,
                content,
                media_url: self.last_media_url,
                created_at,
            }),
            _ => None,
        };

        ConversationSummary {
            conversation: self.conversation.into(),
            other: UserSummary {
                id: self.other_id,
                username: self.other_username,
                display_name: self.other_display_name,
                avatar_url: self.other_avatar_url,
            },
            last_message,
        }
    }
}

#[derive(Clone)]
pub struct PgConversationRepository {
    pool: PgPool,
}

impl PgConversationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConversationRepository for PgConversationRepository {
    async fn find_direct(&self, a: i64, b: i64) -> Result<Option<Conversation>, AppError> {
        let row = sqlx::query_as::<_, ConversationRow>(
            "SELECT id, created_at, last_message_at FROM conversations WHERE direct_key = $1",
        )
        .bind(direct_key(a, b))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn create_direct(&self, id: i64, a: i64, b: i64) -> Result<(Conversation, bool), AppError> {
        let key = direct_key(a, b);
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, ConversationRow>(
            r#"
            INSERT INTO conversations (id, direct_key)
            VALUES ($1, $2)
            ON CONFLICT (direct_key) DO NOTHING
            RETURNING id, created_at, last_message_at
            "#,
        )
        .bind(id)
        .bind(&key)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = created else {
            // Lost the race or already existed.
            let existing = sqlx::query_as::<_, ConversationRow>(
                "SELECT id, created_at, last_message_at FROM conversations WHERE direct_key = $1",
            )
            .bind(&key)
            .fetch_one(&mut *tx)
            .await?;
            tx.commit().await?;
            return Ok((existing.into(), false));
        };

        sqlx::query(
            r#"
            INSERT INTO conversation_participants (conversation_id, user_id)
            VALUES ($1, $2), ($1, $3)
            "#,
        )
        .bind(row.id)
        .bind(a)
        .bind(b)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((row.into(), true))
    }

    async fn list_for_user(
        &self,
        user_id: i64,
        page: PageRequest,
    ) -> Result<Vec<ConversationSummary>, AppError> {
        let rows = sqlx::query_as::<_, InboxRow>(
            r#"
            SELECT c.id, c.created_at, c.last_message_at,
                   u.id AS other_id, u.username AS other_username,
                   u.display_name AS other_display_name, u.avatar_url AS other_avatar_url,
                   m.id AS last_id, m.sender_id AS last_sender_id, m.content AS last_content,
                   m.media_url AS last_media_url, m.created_at AS last_created_at
            FROM conversation_participants me
            JOIN conversations c ON c.id = me.conversation_id
            JOIN conversation_participants other
              ON other.conversation_id = c.id AND other.user_id <> me.user_id
            JOIN users u ON u.id = other.user_id
            LEFT JOIN LATERAL (
                SELECT id, sender_id, content, media_url, created_at
                FROM messages
                WHERE conversation_id = c.id
                ORDER BY created_at DESC, id DESC
                LIMIT 1
            ) m ON TRUE
            WHERE me.user_id = $1
              AND ($2::timestamptz IS NULL OR (c.last_message_at, c.id) < ($2, $3))
            ORDER BY c.last_message_at DESC, c.id DESC
            LIMIT $4
            "#,
        )
        .bind(user_id)
        .bind(page.cursor_at())
        .bind(page.cursor_id(SortDirection::Descending))
        .bind(page.fetch_limit())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(InboxRow::into_summary).collect())
    }

    async fn is_participant(&self, conversation_id: i64, user_id: i64) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM conversation_participants
                WHERE conversation_id = $1 AND user_id = $2
            )
            "#,
        )
        .bind(conversation_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn participants(&self, conversation_id: i64) -> Result<Vec<i64>, AppError> {
        let ids: Vec<i64> = sqlx::query_scalar(
            "SELECT user_id FROM conversation_participants WHERE conversation_id = $1 ORDER BY user_id",
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    async fn send_message(&self, message: &NewMessage) -> Result<Message, AppError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, MessageRow>(
            r#"
            INSERT INTO messages (id, conversation_id, sender_id, content, media_url)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, conversation_id, sender_id, content, media_url, created_at
            "#,
        )
        .bind(message.id)
        .bind(message.conversation_id)
        .bind(message.sender_id)
        .bind(&message.content)
        .bind(&message.media_url)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE conversations SET last_message_at = GREATEST(last_message_at, $2) WHERE id = $1",
        )
        .bind(message.conversation_id)
        .bind(row.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row.into())
    }

    async fn messages(
        &self,
        conversation_id: i64,
        page: PageRequest,
    ) -> Result<Vec<Message>, AppError> {
        let rows = sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT id, conversation_id, sender_id, content, media_url, created_at
            FROM messages
            WHERE conversation_id = $1
              AND ($2::timestamptz IS NULL OR (created_at, id) < ($2, $3))
            ORDER BY created_at DESC, id DESC
            LIMIT $4
            "#,
        )
        .bind(conversation_id)
        .bind(page.cursor_at())
        .bind(page.cursor_id(SortDirection::Descending))
        .bind(page.fetch_limit())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
