//! Friend Service
//!
//! Friend requests and the friendship list. A friendship exists only after
//! the addressee accepts.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::{
    FriendRequest, FriendRequestView, NotificationDraft, NotificationKind,
    RelationshipRepository, UserListing, UserRepository,
};
use crate::shared::error::AppError;
use crate::shared::pagination::{Page, PageRequest};
use crate::shared::snowflake::SnowflakeGenerator;

pub struct FriendService {
    users: Arc<dyn UserRepository>,
    relationships: Arc<dyn RelationshipRepository>,
    id_generator: Arc<SnowflakeGenerator>,
}

impl FriendService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        relationships: Arc<dyn RelationshipRepository>,
        id_generator: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            users,
            relationships,
            id_generator,
        }
    }

    pub async fn friends(&self, user_id: i64, page: PageRequest) -> Result<Page<UserListing>, AppError> {
        let rows = self.relationships.friends(user_id, page).await?;
        Ok(Page::from_overfetch(rows, page.limit))
    }

    /// Pending requests addressed to `user_id`.
    pub async fn incoming(
        &self,
        user_id: i64,
        page: PageRequest,
    ) -> Result<Page<FriendRequestView>, AppError> {
        let rows = self.relationships.incoming_requests(user_id, page).await?;
        Ok(Page::from_overfetch(rows, page.limit))
    }

    pub async fn send_request(&self, requester_id: i64, addressee_id: i64) -> Result<FriendRequest, AppError> {
        if requester_id == addressee_id {
            return Err(AppError::BadRequest(
                "You cannot send a friend request to yourself".into(),
            ));
        }
        self.users
            .find_by_id(addressee_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        if self
            .relationships
            .is_blocked_between(requester_id, addressee_id)
            .await?
        {
            return Err(AppError::forbidden());
        }
        if self.relationships.are_friends(requester_id, addressee_id).await? {
            return Err(AppError::already_exists("You are already friends"));
        }
        if self
            .relationships
            .find_request_between(requester_id, addressee_id)
            .await?
            .is_some()
        {
            return Err(AppError::already_exists("A friend request is already pending"));
        }

        let request = FriendRequest {
            id: self.id_generator.generate(),
            requester_id,
            addressee_id,
            created_at: Utc::now(),
        };
        let notification = NotificationDraft::for_recipient(
            self.id_generator.generate(),
            addressee_id,
            requester_id,
            NotificationKind::FriendRequest,
        );

        // Loses to a concurrent request in either direction.
        if !self.relationships.create_request(&request, notification).await? {
            return Err(AppError::already_exists("A friend request is already pending"));
        }

        tracing::debug!(request_id = request.id, requester_id, addressee_id, "Friend request sent");
        Ok(request)
    }

    /// Addressee only.
    pub async fn accept(&self, user_id: i64, request_id: i64) -> Result<(), AppError> {
        let request = self.addressed_request(user_id, request_id).await?;

        let notification = NotificationDraft::for_recipient(
            self.id_generator.generate(),
            request.requester_id,
            user_id,
            NotificationKind::FriendAccept,
        );
        if !self.relationships.accept_request(&request, notification).await? {
            return Err(AppError::not_found("Friend request"));
        }

        tracing::info!(request_id, a = request.requester_id, b = user_id, "Friendship created");
        Ok(())
    }

    /// Addressee only.
    pub async fn decline(&self, user_id: i64, request_id: i64) -> Result<(), AppError> {
        self.addressed_request(user_id, request_id).await?;

        if !self.relationships.delete_request(request_id).await? {
            return Err(AppError::not_found("Friend request"));
        }
        Ok(())
    }

    pub async fn remove_friend(&self, user_id: i64, friend_id: i64) -> Result<(), AppError> {
        if !self.relationships.remove_friend(user_id, friend_id).await? {
            return Err(AppError::not_found("Friendship"));
        }
        Ok(())
    }

    async fn addressed_request(&self, user_id: i64, request_id: i64) -> Result<FriendRequest, AppError> {
        let request = self
            .relationships
            .find_request(request_id)
            .await?
            .ok_or_else(|| AppError::not_found("Friend request"))?;

        if request.addressee_id != user_id {
            return Err(AppError::forbidden());
        }
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MockRelationshipRepository, MockUserRepository};
    use crate::test_support::user;

    fn service(rels: MockRelationshipRepository) -> FriendService {
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().returning(|id| Ok(Some(user(id))));
        FriendService::new(
            Arc::new(users),
            Arc::new(rels),
            Arc::new(SnowflakeGenerator::default()),
        )
    }

    fn request(requester_id: i64, addressee_id: i64) -> FriendRequest {
        FriendRequest {
            id: 50,
            requester_id,
            addressee_id,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn pending_request_in_either_direction_conflicts() {
        let mut rels = MockRelationshipRepository::new();
        rels.expect_is_blocked_between().returning(|_, _| Ok(false));
        rels.expect_are_friends().returning(|_, _| Ok(false));
        rels.expect_find_request_between()
            .returning(|a, b| Ok(Some(request(b, a))));
        rels.expect_create_request().never();

        let err = service(rels).send_request(1, 2).await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn only_addressee_may_accept() {
        let mut rels = MockRelationshipRepository::new();
        rels.expect_find_request().returning(|_| Ok(Some(request(1, 2))));
        rels.expect_accept_request().never();

        let err = service(rels).accept(1, 50).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn accept_notifies_requester() {
        let mut rels = MockRelationshipRepository::new();
        rels.expect_find_request().returning(|_| Ok(Some(request(1, 2))));
        rels.expect_accept_request()
            .withf(|_, n| {
                n.as_ref().is_some_and(|d| {
                    d.recipient_id == 1 && d.actor_id == 2 && d.kind == NotificationKind::FriendAccept
                })
            })
            .returning(|_, _| Ok(true));

        assert!(service(rels).accept(2, 50).await.is_ok());
    }
}
