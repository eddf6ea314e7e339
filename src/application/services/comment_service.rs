//! Comment Service

use std::sync::Arc;

use super::post_service::visible_post;
use crate::application::dto::request::CreateCommentRequest;
use crate::domain::{
    CommentRepository, CommentView, NewComment, NotificationDraft, NotificationKind,
    PostRepository, RelationshipRepository,
};
use crate::shared::error::AppError;
use crate::shared::pagination::{Page, PageRequest};
use crate::shared::snowflake::SnowflakeGenerator;

pub struct CommentService {
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
    relationships: Arc<dyn RelationshipRepository>,
    id_generator: Arc<SnowflakeGenerator>,
}

impl CommentService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        comments: Arc<dyn CommentRepository>,
        relationships: Arc<dyn RelationshipRepository>,
        id_generator: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            posts,
            comments,
            relationships,
            id_generator,
        }
    }

    /// Oldest first.
    pub async fn list(
        &self,
        post_id: i64,
        viewer: Option<i64>,
        page: PageRequest,
    ) -> Result<Page<CommentView>, AppError> {
        visible_post(self.posts.as_ref(), self.relationships.as_ref(), post_id, viewer).await?;

        let rows = self.comments.list_for_post(post_id, page).await?;
        Ok(Page::from_overfetch(rows, page.limit))
    }

    pub async fn create(
        &self,
        author_id: i64,
        post_id: i64,
        req: CreateCommentRequest,
    ) -> Result<CommentView, AppError> {
        let post = visible_post(
            self.posts.as_ref(),
            self.relationships.as_ref(),
            post_id,
            Some(author_id),
        )
        .await?;

        let comment_id = self.id_generator.generate();
        let notification = NotificationDraft::for_recipient(
            self.id_generator.generate(),
            post.post.author_id,
            author_id,
            NotificationKind::Comment,
        )
        .map(|draft| draft.with_post(post_id).with_comment(comment_id));

        let view = self
            .comments
            .create(
                &NewComment {
                    id: comment_id,
                    post_id,
                    author_id,
                    content: req.content,
                },
                notification,
            )
            .await?;

        tracing::debug!(comment_id, post_id, "Comment created");
        Ok(view)
    }

    /// The comment's author or the post's author may delete.
    pub async fn delete(&self, viewer: i64, comment_id: i64) -> Result<(), AppError> {
        let comment = self
            .comments
            .find_by_id(comment_id)
            .await?
            .ok_or_else(|| AppError::not_found("Comment"))?;

        if comment.author_id != viewer {
            let post_author = self
                .posts
                .find_by_id(comment.post_id)
                .await?
                .map(|p| p.author_id);
            if post_author != Some(viewer) {
                return Err(AppError::forbidden());
            }
        }

        if !self.comments.delete(comment_id, comment.post_id).await? {
            return Err(AppError::not_found("Comment"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Comment, MockCommentRepository, MockPostRepository, MockRelationshipRepository,
        Visibility,
    };
    use crate::test_support::post_view;
    use chrono::Utc;

    fn service(
        posts: MockPostRepository,
        comments: MockCommentRepository,
    ) -> CommentService {
        let mut rels = MockRelationshipRepository::new();
        rels.expect_is_blocked_between().returning(|_, _| Ok(false));
        rels.expect_are_friends().returning(|_, _| Ok(false));
        CommentService::new(
            Arc::new(posts),
            Arc::new(comments),
            Arc::new(rels),
            Arc::new(SnowflakeGenerator::default()),
        )
    }

    #[tokio::test]
    async fn comment_notifies_post_author() {
        let mut posts = MockPostRepository::new();
        posts
            .expect_find_view()
            .returning(|id, _| Ok(Some(post_view(id, 10, Visibility::Public))));
        let mut comments = MockCommentRepository::new();
        comments
            .expect_create()
            .withf(|c, n| {
                c.post_id == 1
                    && n.as_ref().is_some_and(|d| {
                        d.recipient_id == 10
                            && d.kind == NotificationKind::Comment
                            && d.comment_id == Some(c.id)
                    })
            })
            .returning(|c, _| {
                Ok(CommentView {
                    comment: Comment {
                        id: c.id,
                        post_id: c.post_id,
                        author_id: c.author_id,
                        content: c.content.clone(),
                        created_at: Utc::now(),
                    },
                    author: Default::default(),
                })
            });

        let view = service(posts, comments)
            .create(2, 1, CreateCommentRequest { content: "nice".into() })
            .await
            .unwrap();

        assert_eq!(view.comment.author_id, 2);
    }

    #[tokio::test]
    async fn stranger_cannot_delete_comment() {
        let mut comments = MockCommentRepository::new();
        comments.expect_find_by_id().returning(|id| {
            Ok(Some(Comment {
                id,
                post_id: 1,
                author_id: 5,
                content: "x".into(),
                created_at: Utc::now(),
            }))
        });
        comments.expect_delete().never();
        let mut posts = MockPostRepository::new();
        posts
            .expect_find_by_id()
            .returning(|id| Ok(Some(post_view(id, 6, Visibility::Public).post)));

        let err = service(posts, comments).delete(7, 3).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
