//! Likes, saves and shares.
//!
//! Each toggle reports whether it changed anything so callers can map a
//! duplicate to `ALREADY_EXISTS` and a missing row to `NOT_FOUND`. Counter
//! updates happen in the same transaction as the row change.

use async_trait::async_trait;

use super::notification::NotificationDraft;
use super::post::PostView;
use crate::shared::error::AppError;
use crate::shared::pagination::PageRequest;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EngagementRepository: Send + Sync {
    /// False when already liked.
    async fn like(
        &self,
        user_id: i64,
        post_id: i64,
        notification: Option<NotificationDraft>,
    ) -> Result<bool, AppError>;

    /// False when not liked.
    async fn unlike(&self, user_id: i64, post_id: i64) -> Result<bool, AppError>;

    async fn save(&self, user_id: i64, post_id: i64) -> Result<bool, AppError>;

    async fn unsave(&self, user_id: i64, post_id: i64) -> Result<bool, AppError>;

    /// False when already shared.
    async fn share(
        &self,
        user_id: i64,
        post_id: i64,
        notification: Option<NotificationDraft>,
    ) -> Result<bool, AppError>;

    /// Saved posts ordered by save time, newest first.
    async fn saved_posts(&self, user_id: i64, page: PageRequest) -> Result<Vec<PostView>, AppError>;
}
