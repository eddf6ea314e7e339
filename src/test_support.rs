//! Fixtures shared by unit tests across layers.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, Response};
use axum::Router;
use chrono::{Duration, Utc};
use fake::faker::internet::en::Username;
use fake::faker::name::en::Name;
use fake::Fake;
use serde_json::Value;

use crate::config::Settings;
use crate::domain::ports::{MockObjectStore, RateLimitStore};
use crate::domain::{
    MockCommentRepository, MockConversationRepository, MockEngagementRepository,
    MockEventRepository, MockNotificationRepository, MockPostRepository,
    MockRelationshipRepository, MockReportRepository, MockSessionRepository, MockUserRepository,
    Post, PostView, Session, User, Visibility,
};
use crate::infrastructure::cache::MemoryRateLimitStore;
use crate::presentation::http::routes::create_router;
use crate::shared::snowflake::SnowflakeGenerator;
use crate::startup::AppState;

pub(crate) const TEST_TOKEN: &str = "test-session-token";

pub(crate) fn user(id: i64) -> User {
    User {
        id,
        username: Username().fake(),
        email: format!("user{}@example.com", id),
        display_name: Name().fake(),
        ..Default::default()
    }
}

pub(crate) fn post_view(id: i64, author_id: i64, visibility: Visibility) -> PostView {
    let now = Utc::now();
    PostView {
        post: Post {
            id,
            author_id,
            content: "hello #world".into(),
            media_urls: vec![],
            visibility,
            likes_count: 0,
            comments_count: 0,
            shares_count: 0,
            created_at: now,
            updated_at: now,
        },
        author: user(author_id).summary(),
        liked_by_viewer: false,
        saved_by_viewer: false,
        listed_at: now,
    }
}

pub(crate) fn session(user_id: i64) -> Session {
    let now = Utc::now();
    Session {
        id: 1,
        user_id,
        token_hash: "hash".into(),
        user_agent: None,
        expires_at: now + Duration::hours(1),
        created_at: now,
    }
}

/// Mock collaborators for driving the real router.
pub(crate) struct TestState {
    pub users: MockUserRepository,
    pub sessions: MockSessionRepository,
    pub posts: MockPostRepository,
    pub comments: MockCommentRepository,
    pub engagement: MockEngagementRepository,
    pub relationships: MockRelationshipRepository,
    pub conversations: MockConversationRepository,
    pub notifications: MockNotificationRepository,
    pub events: MockEventRepository,
    pub reports: MockReportRepository,
    pub object_store: MockObjectStore,
    pub rate_limit_store: Arc<dyn RateLimitStore>,
    pub settings: Settings,
}

impl Default for TestState {
    fn default() -> Self {
        Self {
            users: MockUserRepository::new(),
            sessions: MockSessionRepository::new(),
            posts: MockPostRepository::new(),
            comments: MockCommentRepository::new(),
            engagement: MockEngagementRepository::new(),
            relationships: MockRelationshipRepository::new(),
            conversations: MockConversationRepository::new(),
            notifications: MockNotificationRepository::new(),
            events: MockEventRepository::new(),
            reports: MockReportRepository::new(),
            object_store: MockObjectStore::new(),
            rate_limit_store: Arc::new(MemoryRateLimitStore::new()),
            settings: Settings::for_tests(),
        }
    }
}

impl TestState {
    /// Any bearer token resolves to `user_id`.
    pub fn signed_in(mut self, user_id: i64) -> Self {
        self.sessions
            .expect_find_active()
            .returning(move |_| Ok(Some(session(user_id))));
        self
    }

    pub fn into_state(self) -> AppState {
        AppState {
            users: Arc::new(self.users),
            sessions: Arc::new(self.sessions),
            posts: Arc::new(self.posts),
            comments: Arc::new(self.comments),
            engagement: Arc::new(self.engagement),
            relationships: Arc::new(self.relationships),
            conversations: Arc::new(self.conversations),
            notifications: Arc::new(self.notifications),
            events: Arc::new(self.events),
            reports: Arc::new(self.reports),
            rate_limit_store: self.rate_limit_store,
            object_store: Arc::new(self.object_store),
            probes: Vec::new(),
            settings: Arc::new(self.settings),
            snowflake: Arc::new(SnowflakeGenerator::default()),
        }
    }

    pub fn router(self) -> Router {
        create_router(self.into_state())
    }
}

pub(crate) fn request(method: Method, uri: &str, body: Option<Value>, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub(crate) async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
