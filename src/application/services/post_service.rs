//! Post Service
//!
//! Post CRUD, the home feed and the visibility rules every post read goes
//! through.

use std::sync::Arc;

use crate::application::dto::request::{CreatePostRequest, UpdatePostRequest};
use crate::domain::services::extract_hashtags;
use crate::domain::{
    NewPost, PostRepository, PostUpdate, PostView, RelationshipRepository, Visibility,
};
use crate::shared::error::AppError;
use crate::shared::pagination::{Page, PageRequest};
use crate::shared::snowflake::SnowflakeGenerator;

/// Load a post as `viewer` sees it. Hidden and blocked posts look exactly
/// like missing ones.
pub(crate) async fn visible_post(
    posts: &dyn PostRepository,
    relationships: &dyn RelationshipRepository,
    post_id: i64,
    viewer: Option<i64>,
) -> Result<PostView, AppError> {
    let not_found = || AppError::not_found("Post");

    let view = posts.find_view(post_id, viewer).await?.ok_or_else(not_found)?;
    let author_id = view.post.author_id;

    let is_friend = match viewer {
        Some(v) if v != author_id => {
            if relationships.is_blocked_between(v, author_id).await? {
                return Err(not_found());
            }
            view.post.visibility == Visibility::Friends
                && relationships.are_friends(v, author_id).await?
        }
        _ => false,
    };

    if !view.post.is_visible_to(viewer, is_friend) {
        return Err(not_found());
    }

    Ok(view)
}

pub struct PostService {
    posts: Arc<dyn PostRepository>,
    relationships: Arc<dyn RelationshipRepository>,
    id_generator: Arc<SnowflakeGenerator>,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        relationships: Arc<dyn RelationshipRepository>,
        id_generator: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            posts,
            relationships,
            id_generator,
        }
    }

    pub async fn create(&self, author_id: i64, req: CreatePostRequest) -> Result<PostView, AppError> {
        let visibility = req.visibility();
        let media_urls = req
            .media_urls
            .into_iter()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .collect();

        let post = self
            .posts
            .create(&NewPost {
                id: self.id_generator.generate(),
                author_id,
                hashtags: extract_hashtags(&req.content),
                content: req.content,
                media_urls,
                visibility,
            })
            .await?;

        tracing::info!(post_id = post.id, author_id, visibility = %visibility, "Post created");

        self.posts
            .find_view(post.id, Some(author_id))
            .await?
            .ok_or_else(|| AppError::server_error(format!("post {} vanished after insert", post.id)))
    }

    pub async fn get(&self, post_id: i64, viewer: Option<i64>) -> Result<PostView, AppError> {
        visible_post(self.posts.as_ref(), self.relationships.as_ref(), post_id, viewer).await
    }

    /// Author only.
    pub async fn update(
        &self,
        viewer: i64,
        post_id: i64,
        req: UpdatePostRequest,
    ) -> Result<PostView, AppError> {
        let visibility = req.visibility();
        if req.content.is_none() && visibility.is_none() {
            return Err(AppError::BadRequest("No fields to update".into()));
        }

        let post = self
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| AppError::not_found("Post"))?;
        if post.author_id != viewer {
            return Err(AppError::forbidden());
        }

        let update = PostUpdate {
            hashtags: req.content.as_deref().map(extract_hashtags),
            content: req.content,
            visibility,
        };
        self.posts.update(post_id, &update).await?;

        self.posts
            .find_view(post_id, Some(viewer))
            .await?
            .ok_or_else(|| AppError::not_found("Post"))
    }

    /// Author only.
    pub async fn delete(&self, viewer: i64, post_id: i64) -> Result<(), AppError> {
        let post = self
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| AppError::not_found("Post"))?;
        if post.author_id != viewer {
            return Err(AppError::forbidden());
        }

        if !self.posts.delete(post_id).await? {
            return Err(AppError::not_found("Post"));
        }

        tracing::info!(post_id, "Post deleted");
        Ok(())
    }

    pub async fn feed(&self, viewer: i64, page: PageRequest) -> Result<Page<PostView>, AppError> {
        let rows = self.posts.feed(viewer, page).await?;
        Ok(Page::from_overfetch(rows, page.limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MockPostRepository, MockRelationshipRepository};
    use crate::test_support::post_view;
    use test_case::test_case;

    #[test_case(Visibility::Public, false, true)]
    #[test_case(Visibility::Friends, false, false)]
    #[test_case(Visibility::Friends, true, true)]
    #[test_case(Visibility::Private, true, false)]
    #[tokio::test]
    async fn visibility_is_enforced(visibility: Visibility, friends: bool, visible: bool) {
        let mut posts = MockPostRepository::new();
        posts
            .expect_find_view()
            .returning(move |id, _| Ok(Some(post_view(id, 10, visibility))));
        let mut rels = MockRelationshipRepository::new();
        rels.expect_is_blocked_between().returning(|_, _| Ok(false));
        rels.expect_are_friends().returning(move |_, _| Ok(friends));

        let result = visible_post(&posts, &rels, 1, Some(2)).await;

        assert_eq!(result.is_ok(), visible);
        if let Err(err) = result {
            assert!(matches!(err, AppError::NotFound(_)));
        }
    }

    #[tokio::test]
    async fn blocked_author_hides_public_post() {
        let mut posts = MockPostRepository::new();
        posts
            .expect_find_view()
            .returning(|id, _| Ok(Some(post_view(id, 10, Visibility::Public))));
        let mut rels = MockRelationshipRepository::new();
        rels.expect_is_blocked_between().returning(|_, _| Ok(true));

        let err = visible_post(&posts, &rels, 1, Some(2)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn only_author_may_delete() {
        let mut posts = MockPostRepository::new();
        posts
            .expect_find_by_id()
            .returning(|id| Ok(Some(post_view(id, 10, Visibility::Public).post)));
        posts.expect_delete().never();

        let service = PostService::new(
            Arc::new(posts),
            Arc::new(MockRelationshipRepository::new()),
            Arc::new(SnowflakeGenerator::default()),
        );

        let err = service.delete(11, 1).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
