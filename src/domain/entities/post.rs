//! Post entity and repository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::UserSummary;
use crate::shared::error::AppError;
use crate::shared::pagination::{Cursor, Keyset, PageRequest};

/// Who may see a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Friends,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Friends => "friends",
            Self::Private => "private",
        }
    }

    /// Parse the database representation. Unknown values fall back to the
    /// most restrictive visibility.
    pub fn from_db(s: &str) -> Self {
        match s {
            "public" => Self::Public,
            "friends" => Self::Friends,
            _ => Self::Private,
        }
    }

    /// Visibilities a viewer may see on `author`'s profile.
    pub fn visible_set(is_self: bool, is_friend: bool) -> Vec<Visibility> {
        if is_self {
            vec![Self::Public, Self::Friends, Self::Private]
        } else if is_friend {
            vec![Self::Public, Self::Friends]
        } else {
            vec![Self::Public]
        }
    }
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps to the `posts` table.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: i64,
    pub author_id: i64,
    pub content: String,
    pub media_urls: Vec<String>,
    pub visibility: Visibility,
    pub likes_count: i32,
    pub comments_count: i32,
    pub shares_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Whether `viewer` may see this post. `is_friend` is the friendship
    /// between viewer and author.
    pub fn is_visible_to(&self, viewer: Option<i64>, is_friend: bool) -> bool {
        if viewer == Some(self.author_id) {
            return true;
        }
        match self.visibility {
            Visibility::Public => true,
            Visibility::Friends => viewer.is_some() && is_friend,
            Visibility::Private => false,
        }
    }
}

/// Data for inserting a post together with its extracted hashtags.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub id: i64,
    pub author_id: i64,
    pub content: String,
    pub media_urls: Vec<String>,
    pub visibility: Visibility,
    pub hashtags: Vec<String>,
}

/// Partial post update. When `content` changes, `hashtags` carries the new set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostUpdate {
    pub content: Option<String>,
    pub visibility: Option<Visibility>,
    pub hashtags: Option<Vec<String>>,
}

/// A post as seen by a particular viewer.
#[derive(Debug, Clone, PartialEq)]
pub struct PostView {
    pub post: Post,
    pub author: UserSummary,
    pub liked_by_viewer: bool,
    pub saved_by_viewer: bool,
    /// Ordering timestamp of the list this view came from: the post's creation
    /// time for feeds, the save time for saved posts.
    pub listed_at: DateTime<Utc>,
}

impl Keyset for PostView {
    fn keyset(&self) -> Cursor {
        Cursor::new(self.listed_at, self.post.id)
    }
}

/// Repository trait for Post data access operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Insert the post and link its hashtags in one transaction.
    async fn create(&self, post: &NewPost) -> Result<Post, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, AppError>;

    /// Post with author and viewer flags. Visibility is not checked here.
    async fn find_view(&self, id: i64, viewer: Option<i64>) -> Result<Option<PostView>, AppError>;

    async fn update(&self, id: i64, update: &PostUpdate) -> Result<Post, AppError>;

    /// Returns whether a post was removed.
    async fn delete(&self, id: i64) -> Result<bool, AppError>;

    /// Home feed: own posts, public posts of followed users, and public or
    /// friends-only posts of friends. Blocked authors in either direction are excluded.
    async fn feed(&self, viewer: i64, page: PageRequest) -> Result<Vec<PostView>, AppError>;

    /// `author`'s posts restricted to `visibilities`, newest first.
    async fn by_author(
        &self,
        author_id: i64,
        viewer: Option<i64>,
        visibilities: &[Visibility],
        page: PageRequest,
    ) -> Result<Vec<PostView>, AppError>;

    /// Public posts whose content contains `query`.
    async fn search(
        &self,
        query: &str,
        viewer: Option<i64>,
        page: PageRequest,
    ) -> Result<Vec<PostView>, AppError>;

    /// Public posts tagged with `tag` (lowercase, without '#').
    async fn by_hashtag(
        &self,
        tag: &str,
        viewer: Option<i64>,
        page: PageRequest,
    ) -> Result<Vec<PostView>, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn post(visibility: Visibility) -> Post {
        let now = Utc::now();
        Post {
            id: 1,
            author_id: 10,
            content: "hello".into(),
            media_urls: vec![],
            visibility,
            likes_count: 0,
            comments_count: 0,
            shares_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test_case(Visibility::Public, None, false, true)]
    #[test_case(Visibility::Public, Some(2), false, true)]
    #[test_case(Visibility::Friends, None, false, false)]
    #[test_case(Visibility::Friends, Some(2), false, false)]
    #[test_case(Visibility::Friends, Some(2), true, true)]
    #[test_case(Visibility::Private, Some(2), true, false)]
    #[test_case(Visibility::Private, Some(10), false, true)]
    fn test_visibility_rules(v: Visibility, viewer: Option<i64>, is_friend: bool, expected: bool) {
        assert_eq!(post(v).is_visible_to(viewer, is_friend), expected);
    }

    #[test]
    fn test_visible_set_widens_with_relationship() {
        assert_eq!(Visibility::visible_set(false, false), vec![Visibility::Public]);
        assert_eq!(
            Visibility::visible_set(false, true),
            vec![Visibility::Public, Visibility::Friends]
        );
        assert_eq!(Visibility::visible_set(true, false).len(), 3);
    }

    #[test]
    fn test_unknown_db_visibility_is_private() {
        assert_eq!(Visibility::from_db("weird"), Visibility::Private);
    }
}
