//! Notification entity and repository trait.
//!
//! Notifications are written by the repositories that perform the triggering
//! action, inside the same transaction; this trait only covers reads and
//! read-state changes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::user::UserSummary;
use crate::shared::error::AppError;
use crate::shared::pagination::{Cursor, Keyset, PageRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Like,
    Comment,
    Share,
    Follow,
    FriendRequest,
    FriendAccept,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Comment => "comment",
            Self::Share => "share",
            Self::Follow => "follow",
            Self::FriendRequest => "friend_request",
            Self::FriendAccept => "friend_accept",
        }
    }

    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "like" => Some(Self::Like),
            "comment" => Some(Self::Comment),
            "share" => Some(Self::Share),
            "follow" => Some(Self::Follow),
            "friend_request" => Some(Self::FriendRequest),
            "friend_accept" => Some(Self::FriendAccept),
            _ => None,
        }
    }
}

/// A notification to be inserted alongside the action that caused it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationDraft {
    pub id: i64,
    pub recipient_id: i64,
    pub actor_id: i64,
    pub kind: NotificationKind,
    pub post_id: Option<i64>,
    pub comment_id: Option<i64>,
}

impl NotificationDraft {
    /// `None` when the actor would notify themselves.
    pub fn for_recipient(
        id: i64,
        recipient_id: i64,
        actor_id: i64,
        kind: NotificationKind,
    ) -> Option<Self> {
        (recipient_id != actor_id).then_some(Self {
            id,
            recipient_id,
            actor_id,
            kind,
            post_id: None,
            comment_id: None,
        })
    }

    pub fn with_post(mut self, post_id: i64) -> Self {
        self.post_id = Some(post_id);
        self
    }

    pub fn with_comment(mut self, comment_id: i64) -> Self {
        self.comment_id = Some(comment_id);
        self
    }
}

/// Maps to the `notifications` table joined with the actor.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: i64,
    pub recipient_id: i64,
    pub actor: UserSummary,
    pub kind: NotificationKind,
    pub post_id: Option<i64>,
    pub comment_id: Option<i64>,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Keyset for Notification {
    fn keyset(&self) -> Cursor {
        Cursor::new(self.created_at, self.id)
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Newest first.
    async fn list(
        &self,
        recipient_id: i64,
        unread_only: bool,
        page: PageRequest,
    ) -> Result<Vec<Notification>, AppError>;

    async fn unread_count(&self, recipient_id: i64) -> Result<i64, AppError>;

    /// Returns false when the notification does not exist or belongs to someone else.
    async fn mark_read(&self, id: i64, recipient_id: i64) -> Result<bool, AppError>;

    /// Returns the number of notifications changed.
    async fn mark_all_read(&self, recipient_id: i64) -> Result<u64, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_notifications_are_suppressed() {
        assert!(NotificationDraft::for_recipient(1, 5, 5, NotificationKind::Like).is_none());

        let draft = NotificationDraft::for_recipient(1, 5, 6, NotificationKind::Comment)
            .map(|d| d.with_post(9).with_comment(11))
            .unwrap();
        assert_eq!(draft.post_id, Some(9));
        assert_eq!(draft.comment_id, Some(11));
    }

    #[test]
    fn test_kind_round_trips_through_db_text() {
        for kind in [
            NotificationKind::Like,
            NotificationKind::Comment,
            NotificationKind::Share,
            NotificationKind::Follow,
            NotificationKind::FriendRequest,
            NotificationKind::FriendAccept,
        ] {
            assert_eq!(NotificationKind::from_db(kind.as_str()), Some(kind));
        }
    }
}
