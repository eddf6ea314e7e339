//! Engagement Service
//!
//! Likes, saves and shares. Each action returns the post as the caller now
//! sees it so clients can refresh counters without another round trip.

use std::sync::Arc;

use super::post_service::visible_post;
use crate::domain::{
    EngagementRepository, NotificationDraft, NotificationKind, PostRepository, PostView,
    RelationshipRepository, Visibility,
};
use crate::shared::error::AppError;
use crate::shared::pagination::{Page, PageRequest};
use crate::shared::snowflake::SnowflakeGenerator;

pub struct EngagementService {
    posts: Arc<dyn PostRepository>,
    engagement: Arc<dyn EngagementRepository>,
    relationships: Arc<dyn RelationshipRepository>,
    id_generator: Arc<SnowflakeGenerator>,
}

impl EngagementService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        engagement: Arc<dyn EngagementRepository>,
        relationships: Arc<dyn RelationshipRepository>,
        id_generator: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            posts,
            engagement,
            relationships,
            id_generator,
        }
    }

    pub async fn like(&self, user_id: i64, post_id: i64) -> Result<PostView, AppError> {
        let view = self.visible(user_id, post_id).await?;
        let notification = self.notify(&view, user_id, NotificationKind::Like);

        if !self.engagement.like(user_id, post_id, notification).await? {
            return Err(AppError::already_exists("Post already liked"));
        }
        self.refreshed(user_id, post_id).await
    }

    pub async fn unlike(&self, user_id: i64, post_id: i64) -> Result<PostView, AppError> {
        self.ensure_exists(post_id).await?;

        if !self.engagement.unlike(user_id, post_id).await? {
            return Err(AppError::not_found("Like"));
        }
        self.refreshed(user_id, post_id).await
    }

    pub async fn save(&self, user_id: i64, post_id: i64) -> Result<PostView, AppError> {
        self.visible(user_id, post_id).await?;

        if !self.engagement.save(user_id, post_id).await? {
            return Err(AppError::already_exists("Post already saved"));
        }
        self.refreshed(user_id, post_id).await
    }

    pub async fn unsave(&self, user_id: i64, post_id: i64) -> Result<PostView, AppError> {
        self.ensure_exists(post_id).await?;

        if !self.engagement.unsave(user_id, post_id).await? {
            return Err(AppError::not_found("Saved post"));
        }
        self.refreshed(user_id, post_id).await
    }

    /// Public posts only.
    pub async fn share(&self, user_id: i64, post_id: i64) -> Result<PostView, AppError> {
        let view = self.visible(user_id, post_id).await?;
        if view.post.visibility != Visibility::Public {
            return Err(AppError::BadRequest("Only public posts can be shared".into()));
        }

        let notification = self.notify(&view, user_id, NotificationKind::Share);
        if !self.engagement.share(user_id, post_id, notification).await? {
            return Err(AppError::already_exists("Post already shared"));
        }
        self.refreshed(user_id, post_id).await
    }

    pub async fn saved(&self, user_id: i64, page: PageRequest) -> Result<Page<PostView>, AppError> {
        let rows = self.engagement.saved_posts(user_id, page).await?;
        Ok(Page::from_overfetch(rows, page.limit))
    }

    async fn visible(&self, user_id: i64, post_id: i64) -> Result<PostView, AppError> {
        visible_post(
            self.posts.as_ref(),
            self.relationships.as_ref(),
            post_id,
            Some(user_id),
        )
        .await
    }

    async fn ensure_exists(&self, post_id: i64) -> Result<(), AppError> {
        self.posts
            .find_by_id(post_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| AppError::not_found("Post"))
    }

    async fn refreshed(&self, user_id: i64, post_id: i64) -> Result<PostView, AppError> {
        self.posts
            .find_view(post_id, Some(user_id))
            .await?
            .ok_or_else(|| AppError::not_found("Post"))
    }

    fn notify(
        &self,
        view: &PostView,
        actor_id: i64,
        kind: NotificationKind,
    ) -> Option<NotificationDraft> {
        NotificationDraft::for_recipient(
            self.id_generator.generate(),
            view.post.author_id,
            actor_id,
            kind,
        )
        .map(|draft| draft.with_post(view.post.id))
    }
}
