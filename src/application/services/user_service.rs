//! User Service
//!
//! Profiles, follows, blocks and friend suggestions.

use std::collections::HashMap;
use std::sync::Arc;

use crate::application::dto::request::UpdateProfileRequest;
use crate::domain::services::{mutual_friends, suggest_friends, Suggestion};
use crate::domain::{
    Identity, NotificationDraft, NotificationKind, PostRepository, PostView, ProfileStats,
    ProfileUpdate, RelationshipFlags, RelationshipRepository, User, UserListing, UserRepository,
    UserSummary, Visibility,
};
use crate::shared::error::AppError;
use crate::shared::pagination::{Page, PageRequest};
use crate::shared::snowflake::SnowflakeGenerator;

/// Friends whose own friend lists are scanned for suggestions.
const SUGGESTION_FAN_OUT: usize = 100;

/// A profile as seen by one viewer.
#[derive(Debug, Clone)]
pub struct Profile {
    pub user: User,
    pub stats: ProfileStats,
    pub flags: RelationshipFlags,
    pub is_self: bool,
}

pub struct UserService {
    users: Arc<dyn UserRepository>,
    relationships: Arc<dyn RelationshipRepository>,
    posts: Arc<dyn PostRepository>,
    id_generator: Arc<SnowflakeGenerator>,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        relationships: Arc<dyn RelationshipRepository>,
        posts: Arc<dyn PostRepository>,
        id_generator: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            users,
            relationships,
            posts,
            id_generator,
        }
    }

    /// The caller's own account. Bearer identities carry only an id, so the
    /// row is loaded for them.
    pub async fn me(&self, identity: &Identity) -> Result<User, AppError> {
        if let Some(user) = identity.user() {
            return Ok(user.clone());
        }
        let id = identity.user_id().ok_or_else(AppError::unauthorized)?;
        self.require_user(id).await
    }

    pub async fn update_me(&self, user_id: i64, req: UpdateProfileRequest) -> Result<User, AppError> {
        let trim = |v: Option<String>| v.map(|s| s.trim().to_string());
        let update = ProfileUpdate {
            display_name: trim(req.display_name),
            bio: trim(req.bio),
            avatar_url: trim(req.avatar_url),
            cover_url: trim(req.cover_url),
            location: trim(req.location),
            website: trim(req.website),
        };

        if update == ProfileUpdate::default() {
            return Err(AppError::BadRequest("No fields to update".into()));
        }

        let user = self.users.update_profile(user_id, &update).await?;
        tracing::debug!(user_id, "Profile updated");
        Ok(user)
    }

    /// A user who has blocked the viewer does not exist for them.
    pub async fn profile(&self, target_id: i64, viewer: Option<i64>) -> Result<Profile, AppError> {
        let user = self.require_user(target_id).await?;
        let is_self = viewer == Some(target_id);

        let flags = match viewer {
            Some(v) if !is_self => self.relationships.flags(v, target_id).await?,
            _ => RelationshipFlags::default(),
        };
        if flags.has_blocked_viewer {
            return Err(AppError::not_found("User"));
        }

        let stats = self.users.stats(target_id).await?;
        Ok(Profile {
            user,
            stats,
            flags,
            is_self,
        })
    }

    pub async fn posts_of(
        &self,
        author_id: i64,
        viewer: Option<i64>,
        page: PageRequest,
    ) -> Result<Page<PostView>, AppError> {
        self.require_user(author_id).await?;

        let is_self = viewer == Some(author_id);
        let is_friend = match viewer {
            Some(v) if !is_self => {
                if self.relationships.is_blocked_between(v, author_id).await? {
                    return Err(AppError::not_found("User"));
                }
                self.relationships.are_friends(v, author_id).await?
            }
            _ => false,
        };

        let visibilities = Visibility::visible_set(is_self, is_friend);
        let rows = self
            .posts
            .by_author(author_id, viewer, &visibilities, page)
            .await?;
        Ok(Page::from_overfetch(rows, page.limit))
    }

    pub async fn followers(&self, user_id: i64, page: PageRequest) -> Result<Page<UserListing>, AppError> {
        self.require_user(user_id).await?;
        let rows = self.relationships.followers(user_id, page).await?;
        Ok(Page::from_overfetch(rows, page.limit))
    }

    pub async fn following(&self, user_id: i64, page: PageRequest) -> Result<Page<UserListing>, AppError> {
        self.require_user(user_id).await?;
        let rows = self.relationships.following(user_id, page).await?;
        Ok(Page::from_overfetch(rows, page.limit))
    }

    pub async fn mutual_friends(&self, viewer: i64, target_id: i64) -> Result<Vec<UserSummary>, AppError> {
        self.require_user(target_id).await?;

        let mine = self.relationships.friend_ids(viewer).await?;
        let theirs = self.relationships.friend_ids(target_id).await?;
        let ids = mutual_friends(&mine, &theirs);
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        self.users.find_summaries(&ids).await
    }

    /// Friends-of-friends ranked by mutual friend count.
    pub async fn suggestions(
        &self,
        viewer: i64,
        limit: usize,
    ) -> Result<Vec<(UserSummary, Suggestion)>, AppError> {
        let friends = self.relationships.friend_ids(viewer).await?;

        let mut friends_of_friends = Vec::with_capacity(friends.len().min(SUGGESTION_FAN_OUT));
        for friend in friends.iter().take(SUGGESTION_FAN_OUT) {
            let theirs = self.relationships.friend_ids(*friend).await?;
            friends_of_friends.push((*friend, theirs));
        }

        let mut exclude = self.relationships.pending_request_user_ids(viewer).await?;
        exclude.extend(self.relationships.blocked_ids(viewer).await?);

        let ranked = suggest_friends(viewer, &friends, &friends_of_friends, &exclude, limit);
        if ranked.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = ranked.iter().map(|s| s.user_id).collect();
        let mut summaries: HashMap<i64, UserSummary> = self
            .users
            .find_summaries(&ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        Ok(ranked
            .into_iter()
            .filter_map(|s| summaries.remove(&s.user_id).map(|u| (u, s)))
            .collect())
    }

    pub async fn follow(&self, viewer: i64, target_id: i64) -> Result<(), AppError> {
        if viewer == target_id {
            return Err(AppError::BadRequest("You cannot follow yourself".into()));
        }
        self.require_user(target_id).await?;
        if self.relationships.is_blocked_between(viewer, target_id).await? {
            return Err(AppError::forbidden());
        }

        let notification = NotificationDraft::for_recipient(
            self.id_generator.generate(),
            target_id,
            viewer,
            NotificationKind::Follow,
        );
        if !self.relationships.follow(viewer, target_id, notification).await? {
            return Err(AppError::already_exists("Already following this user"));
        }

        tracing::debug!(follower_id = viewer, followee_id = target_id, "Followed");
        Ok(())
    }

    pub async fn unfollow(&self, viewer: i64, target_id: i64) -> Result<(), AppError> {
        if !self.relationships.unfollow(viewer, target_id).await? {
            return Err(AppError::not_found("Follow"));
        }
        Ok(())
    }

    /// Blocking also severs follows, friendships and pending requests.
    pub async fn block(&self, viewer: i64, target_id: i64) -> Result<(), AppError> {
        if viewer == target_id {
            return Err(AppError::BadRequest("You cannot block yourself".into()));
        }
        self.require_user(target_id).await?;

        if !self.relationships.block(viewer, target_id).await? {
            return Err(AppError::already_exists("User is already blocked"));
        }

        tracing::info!(blocker_id = viewer, blocked_id = target_id, "User blocked");
        Ok(())
    }

    pub async fn unblock(&self, viewer: i64, target_id: i64) -> Result<(), AppError> {
        if !self.relationships.unblock(viewer, target_id).await? {
            return Err(AppError::not_found("Block"));
        }
        Ok(())
    }

    pub async fn blocks(&self, viewer: i64, page: PageRequest) -> Result<Page<UserListing>, AppError> {
        let rows = self.relationships.blocks(viewer, page).await?;
        Ok(Page::from_overfetch(rows, page.limit))
    }

    async fn require_user(&self, id: i64) -> Result<User, AppError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MockPostRepository, MockRelationshipRepository, MockUserRepository};
    use crate::test_support::user;
    use mockall::predicate::eq;
    use pretty_assertions::assert_eq;

    fn service(users: MockUserRepository, rels: MockRelationshipRepository) -> UserService {
        UserService::new(
            Arc::new(users),
            Arc::new(rels),
            Arc::new(MockPostRepository::new()),
            Arc::new(SnowflakeGenerator::default()),
        )
    }

    fn existing_users() -> MockUserRepository {
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().returning(|id| Ok(Some(user(id))));
        users
    }

    #[tokio::test]
    async fn cannot_follow_self() {
        let mut rels = MockRelationshipRepository::new();
        rels.expect_follow().never();

        let err = service(MockUserRepository::new(), rels)
            .follow(3, 3)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn duplicate_follow_conflicts() {
        let mut rels = MockRelationshipRepository::new();
        rels.expect_is_blocked_between().returning(|_, _| Ok(false));
        rels.expect_follow()
            .withf(|_, _, n| n.as_ref().is_some_and(|d| d.kind == NotificationKind::Follow))
            .returning(|_, _, _| Ok(false));

        let err = service(existing_users(), rels).follow(1, 2).await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn unfollow_without_follow_is_not_found() {
        let mut rels = MockRelationshipRepository::new();
        rels.expect_unfollow().returning(|_, _| Ok(false));

        let err = service(MockUserRepository::new(), rels)
            .unfollow(1, 2)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn duplicate_block_conflicts() {
        let mut rels = MockRelationshipRepository::new();
        rels.expect_block().with(eq(1), eq(2)).returning(|_, _| Ok(false));

        let err = service(existing_users(), rels).block(1, 2).await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn unblock_without_block_is_not_found() {
        let mut rels = MockRelationshipRepository::new();
        rels.expect_unblock().returning(|_, _| Ok(false));

        let err = service(MockUserRepository::new(), rels)
            .unblock(1, 2)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref m) if m == "Block not found"));
    }

    #[tokio::test]
    async fn blocked_viewer_sees_no_profile() {
        let mut rels = MockRelationshipRepository::new();
        rels.expect_flags().returning(|_, _| {
            Ok(RelationshipFlags {
                has_blocked_viewer: true,
                ..Default::default()
            })
        });

        let err = service(existing_users(), rels)
            .profile(2, Some(1))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn suggestions_rank_by_mutual_count_and_skip_excluded() {
        let mut rels = MockRelationshipRepository::new();
        rels.expect_friend_ids().with(eq(1)).returning(|_| Ok(vec![2, 3]));
        rels.expect_friend_ids().with(eq(2)).returning(|_| Ok(vec![1, 4, 5]));
        rels.expect_friend_ids().with(eq(3)).returning(|_| Ok(vec![1, 4, 6]));
        rels.expect_pending_request_user_ids().returning(|_| Ok(vec![5]));
        rels.expect_blocked_ids().returning(|_| Ok(vec![]));

        let mut users = MockUserRepository::new();
        users.expect_find_summaries().returning(|ids| {
            Ok(ids.iter().rev().map(|id| user(*id).summary()).collect())
        });

        let suggestions = service(users, rels).suggestions(1, 10).await.unwrap();
        let ranked: Vec<(i64, usize)> = suggestions
            .iter()
            .map(|(u, s)| (u.id, s.mutual_count))
            .collect();

        assert_eq!(ranked, vec![(4, 2), (6, 1)]);
    }
}
