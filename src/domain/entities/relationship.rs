//! Follows, friendships, friend requests and blocks.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::notification::NotificationDraft;
use super::user::{UserListing, UserSummary};
use crate::shared::error::AppError;
use crate::shared::pagination::{Cursor, Keyset, PageRequest};

/// A pending friend request. Accepting or declining removes it.
#[derive(Debug, Clone, PartialEq)]
pub struct FriendRequest {
    pub id: i64,
    pub requester_id: i64,
    pub addressee_id: i64,
    pub created_at: DateTime<Utc>,
}

impl FriendRequest {
    pub fn involves(&self, user_id: i64) -> bool {
        self.requester_id == user_id || self.addressee_id == user_id
    }
}

/// Incoming request joined with the requester.
#[derive(Debug, Clone, PartialEq)]
pub struct FriendRequestView {
    pub request: FriendRequest,
    pub requester: UserSummary,
}

impl Keyset for FriendRequestView {
    fn keyset(&self) -> Cursor {
        Cursor::new(self.request.created_at, self.request.id)
    }
}

/// How a viewer relates to another user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelationshipFlags {
    pub is_following: bool,
    pub is_followed_by: bool,
    pub is_friend: bool,
    /// The viewer blocked the target.
    pub is_blocked: bool,
    /// The target blocked the viewer.
    pub has_blocked_viewer: bool,
    pub request_sent: bool,
    pub request_received: bool,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RelationshipRepository: Send + Sync {
    /// False when already following.
    async fn follow(
        &self,
        follower_id: i64,
        followee_id: i64,
        notification: Option<NotificationDraft>,
    ) -> Result<bool, AppError>;

    /// False when not following.
    async fn unfollow(&self, follower_id: i64, followee_id: i64) -> Result<bool, AppError>;

    async fn followers(&self, user_id: i64, page: PageRequest) -> Result<Vec<UserListing>, AppError>;

    async fn following(&self, user_id: i64, page: PageRequest) -> Result<Vec<UserListing>, AppError>;

    async fn friend_ids(&self, user_id: i64) -> Result<Vec<i64>, AppError>;

    async fn friends(&self, user_id: i64, page: PageRequest) -> Result<Vec<UserListing>, AppError>;

    async fn are_friends(&self, a: i64, b: i64) -> Result<bool, AppError>;

    async fn find_request(&self, id: i64) -> Result<Option<FriendRequest>, AppError>;

    /// A pending request between the two users in either direction.
    async fn find_request_between(&self, a: i64, b: i64) -> Result<Option<FriendRequest>, AppError>;

    /// False when a request between the pair already exists.
    async fn create_request(
        &self,
        request: &FriendRequest,
        notification: Option<NotificationDraft>,
    ) -> Result<bool, AppError>;

    /// Delete the request and store the friendship. False when the request is gone.
    async fn accept_request(
        &self,
        request: &FriendRequest,
        notification: Option<NotificationDraft>,
    ) -> Result<bool, AppError>;

    async fn delete_request(&self, id: i64) -> Result<bool, AppError>;

    /// Requests addressed to `user_id`, newest first.
    async fn incoming_requests(
        &self,
        user_id: i64,
        page: PageRequest,
    ) -> Result<Vec<FriendRequestView>, AppError>;

    /// Users with a pending request to or from `user_id`.
    async fn pending_request_user_ids(&self, user_id: i64) -> Result<Vec<i64>, AppError>;

    /// False when the users were not friends.
    async fn remove_friend(&self, a: i64, b: i64) -> Result<bool, AppError>;

    /// Block and sever follows, friendship and pending requests in both
    /// directions. False when already blocked.
    async fn block(&self, blocker_id: i64, blocked_id: i64) -> Result<bool, AppError>;

    async fn unblock(&self, blocker_id: i64, blocked_id: i64) -> Result<bool, AppError>;

    /// Users blocked by `blocker_id`, most recent first.
    async fn blocks(&self, blocker_id: i64, page: PageRequest) -> Result<Vec<UserListing>, AppError>;

    /// Either user blocked the other.
    async fn is_blocked_between(&self, a: i64, b: i64) -> Result<bool, AppError>;

    /// Users `user_id` blocked or was blocked by.
    async fn blocked_ids(&self, user_id: i64) -> Result<Vec<i64>, AppError>;

    async fn flags(&self, viewer_id: i64, target_id: i64) -> Result<RelationshipFlags, AppError>;
}
