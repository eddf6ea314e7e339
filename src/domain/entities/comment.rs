//! Comment entity and repository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::notification::NotificationDraft;
use super::user::UserSummary;
use crate::shared::error::AppError;
use crate::shared::pagination::{Cursor, Keyset, PageRequest};

/// Maps to the `comments` table.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub content: String,
}

/// Comment joined with its author.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentView {
    pub comment: Comment,
    pub author: UserSummary,
}

impl Keyset for CommentView {
    fn keyset(&self) -> Cursor {
        Cursor::new(self.comment.created_at, self.comment.id)
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Insert the comment, bump the post's comment counter and store the
    /// notification in one transaction.
    async fn create(
        &self,
        comment: &NewComment,
        notification: Option<NotificationDraft>,
    ) -> Result<CommentView, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Comment>, AppError>;

    /// Oldest first.
    async fn list_for_post(
        &self,
        post_id: i64,
        page: PageRequest,
    ) -> Result<Vec<CommentView>, AppError>;

    /// Remove the comment and decrement the counter. Returns whether a row was removed.
    async fn delete(&self, id: i64, post_id: i64) -> Result<bool, AppError>;
}
