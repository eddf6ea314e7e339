//! Search Service
//!
//! `#tag` queries search hashtags; anything else is a substring match on
//! usernames/display names or post content.

use std::sync::Arc;

use crate::domain::services::normalize_tag;
use crate::domain::{PostRepository, PostView, RelationshipRepository, UserListing, UserRepository};
use crate::shared::error::AppError;
use crate::shared::pagination::{Page, PageRequest};

/// What to search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchKind {
    Users,
    #[default]
    Posts,
}

impl SearchKind {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("users") => Self::Users,
            _ => Self::Posts,
        }
    }
}

#[derive(Debug)]
pub enum SearchResults {
    Users(Page<UserListing>),
    Posts(Page<PostView>),
}

pub struct SearchService {
    users: Arc<dyn UserRepository>,
    posts: Arc<dyn PostRepository>,
    relationships: Arc<dyn RelationshipRepository>,
}

impl SearchService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        posts: Arc<dyn PostRepository>,
        relationships: Arc<dyn RelationshipRepository>,
    ) -> Self {
        Self {
            users,
            posts,
            relationships,
        }
    }

    pub async fn search(
        &self,
        query: &str,
        kind: SearchKind,
        viewer: Option<i64>,
        page: PageRequest,
    ) -> Result<SearchResults, AppError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::invalid_field("q", "Query must not be blank"));
        }

        if query.starts_with('#') {
            let tag = normalize_tag(query)
                .ok_or_else(|| AppError::invalid_field("q", "Invalid hashtag"))?;
            let rows = self.posts.by_hashtag(&tag, viewer, page).await?;
            return Ok(SearchResults::Posts(Page::from_overfetch(rows, page.limit)));
        }

        match kind {
            SearchKind::Users => {
                let exclude = match viewer {
                    Some(v) => self.relationships.blocked_ids(v).await?,
                    None => Vec::new(),
                };
                let rows = self.users.search(query, &exclude, page).await?;
                Ok(SearchResults::Users(Page::from_overfetch(rows, page.limit)))
            }
            SearchKind::Posts => {
                let rows = self.posts.search(query, viewer, page).await?;
                Ok(SearchResults::Posts(Page::from_overfetch(rows, page.limit)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MockPostRepository, MockRelationshipRepository, MockUserRepository};

    #[tokio::test]
    async fn hash_prefix_searches_tags_even_for_user_kind() {
        let mut posts = MockPostRepository::new();
        posts
            .expect_by_hashtag()
            .withf(|tag, _, _| tag == "rustlang")
            .returning(|_, _, _| Ok(vec![]));
        let mut users = MockUserRepository::new();
        users.expect_search().never();

        let service = SearchService::new(
            Arc::new(users),
            Arc::new(posts),
            Arc::new(MockRelationshipRepository::new()),
        );
        let results = service
            .search("#RustLang", SearchKind::Users, None, PageRequest::first(20))
            .await
            .unwrap();

        assert!(matches!(results, SearchResults::Posts(ref p) if p.items.is_empty()));
    }

    #[tokio::test]
    async fn user_search_excludes_blocked() {
        let mut rels = MockRelationshipRepository::new();
        rels.expect_blocked_ids().returning(|_| Ok(vec![4]));
        let mut users = MockUserRepository::new();
        users
            .expect_search()
            .withf(|q, exclude, _| q == "ann" && exclude == [4])
            .returning(|_, _, _| Ok(vec![]));

        let service = SearchService::new(Arc::new(users), Arc::new(MockPostRepository::new()), Arc::new(rels));
        let results = service
            .search(" ann ", SearchKind::Users, Some(1), PageRequest::first(20))
            .await
            .unwrap();

        assert!(matches!(results, SearchResults::Users(_)));
    }
}
