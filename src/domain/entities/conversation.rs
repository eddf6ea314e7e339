//! Conversation entity and repository trait.
//!
//! Only direct (two-person) conversations exist. Each has a `direct_key`
//! built from the sorted participant ids so the pair maps to one row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::message::{Message, NewMessage};
use super::user::UserSummary;
use crate::shared::error::AppError;
use crate::shared::pagination::{Cursor, Keyset, PageRequest};

#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub last_message_at: DateTime<Utc>,
}

/// Unique key for the direct conversation between `a` and `b`.
pub fn direct_key(a: i64, b: i64) -> String {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    format!("{}:{}", lo, hi)
}

/// Inbox row: the conversation, the other participant and the latest message.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationSummary {
    pub conversation: Conversation,
    pub other: UserSummary,
    pub last_message: Option<Message>,
}

impl Keyset for ConversationSummary {
    fn keyset(&self) -> Cursor {
        Cursor::new(self.conversation.last_message_at, self.conversation.id)
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    async fn find_direct(&self, a: i64, b: i64) -> Result<Option<Conversation>, AppError>;

    /// Find or create the direct conversation. The flag is true when created.
    async fn create_direct(&self, id: i64, a: i64, b: i64) -> Result<(Conversation, bool), AppError>;

    /// Conversations of `user_id`, most recently active first.
    async fn list_for_user(
        &self,
        user_id: i64,
        page: PageRequest,
    ) -> Result<Vec<ConversationSummary>, AppError>;

    async fn is_participant(&self, conversation_id: i64, user_id: i64) -> Result<bool, AppError>;

    async fn participants(&self, conversation_id: i64) -> Result<Vec<i64>, AppError>;

    /// Insert the message and bump `last_message_at` in one transaction.
    async fn send_message(&self, message: &NewMessage) -> Result<Message, AppError>;

    /// Newest first.
    async fn messages(
        &self,
        conversation_id: i64,
        page: PageRequest,
    ) -> Result<Vec<Message>, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_key_is_order_independent() {
        assert_eq!(direct_key(5, 3), direct_key(3, 5));
        assert_eq!(direct_key(3, 5), "3:5");
    }
}
