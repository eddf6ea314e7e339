//! Application Services
//!
//! Business logic services that coordinate domain operations. Each service
//! is built per request from the repository handles held in `AppState`.
//!
//! ## Available Services
//!
//! - **AuthService**: Registration, login, sessions, email verification, identity resolution
//! - **UserService**: Profiles, follows, blocks, suggestions
//! - **FriendService**: Friend requests and friendships
//! - **PostService**: Post CRUD, feed, visibility rules
//! - **CommentService**: Comments on posts
//! - **EngagementService**: Likes, saves, shares
//! - **ConversationService**: Direct conversations and messages
//! - **NotificationService**: Notification inbox
//! - **EventService**: Events and RSVPs
//! - **ReportService**: Moderation reports
//! - **SearchService**: User, post and hashtag search
//! - **UploadService**: Media upload policy and storage

pub mod auth_service;
pub mod comment_service;
pub mod conversation_service;
pub mod engagement_service;
pub mod event_service;
pub mod friend_service;
pub mod notification_service;
pub mod post_service;
pub mod report_service;
pub mod search_service;
pub mod upload_service;
pub mod user_service;

pub use auth_service::{AuthService, IssuedSession};
pub use comment_service::CommentService;
pub use conversation_service::ConversationService;
pub use engagement_service::EngagementService;
pub use event_service::EventService;
pub use friend_service::FriendService;
pub use notification_service::NotificationService;
pub use post_service::PostService;
pub use report_service::{ReportDraft, ReportService};
pub use search_service::{SearchKind, SearchResults, SearchService};
pub use upload_service::{StoredUpload, UploadService, UploadedFile};
pub use user_service::{Profile, UserService};
