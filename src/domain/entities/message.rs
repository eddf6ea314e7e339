//! Direct message entity.

use chrono::{DateTime, Utc};

use crate::shared::pagination::{Cursor, Keyset};

/// Maps to the `messages` table.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: i64,
    pub conversation_id: i64,
    pub sender_id: i64,
    pub content: String,
    pub media_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Keyset for Message {
    fn keyset(&self) -> Cursor {
        Cursor::new(self.created_at, self.id)
    }
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub id: i64,
    pub conversation_id: i64,
    pub sender_id: i64,
    pub content: String,
    pub media_url: Option<String>,
}

/// Maximum message length in characters.
pub const MAX_MESSAGE_LENGTH: usize = 4000;
