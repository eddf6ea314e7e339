//! Response DTOs
//!
//! Data structures for API response bodies. Ids are serialized as strings
//! and timestamps as RFC 3339.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::application::services::{IssuedSession, Profile, StoredUpload};
use crate::domain::services::Suggestion;
use crate::domain::{
    CommentView, ConversationSummary, EventView, FriendRequest, FriendRequestView, Message, Notification,
    NotificationKind, PostView, ProfileStats, RelationshipFlags, Report, ReportTarget,
    RsvpStatus, User, UserListing, UserSummary, Visibility,
};

fn ts(at: DateTime<Utc>) -> String {
    at.to_rfc3339()
}

/// Full user response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub display_name: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub cover_url: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub email_verified: bool,
    pub created_at: String,
}

impl UserResponse {
    pub fn from_user(user: User, include_email: bool) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username,
            email: include_email.then_some(user.email),
            display_name: user.display_name,
            bio: user.bio,
            avatar_url: user.avatar_url,
            cover_url: user.cover_url,
            location: user.location,
            website: user.website,
            email_verified: user.email_verified,
            created_at: ts(user.created_at),
        }
    }
}

/// Compact user embedded in other resources
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummaryResponse {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

impl From<UserSummary> for UserSummaryResponse {
    fn from(user: UserSummary) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username,
            display_name: user.display_name,
            avatar_url: user.avatar_url,
        }
    }
}

impl From<UserListing> for UserSummaryResponse {
    fn from(listing: UserListing) -> Self {
        listing.user.into()
    }
}

/// Session issued by register/login
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
    pub expires_at: String,
}

impl From<IssuedSession> for AuthResponse {
    fn from(session: IssuedSession) -> Self {
        Self {
            user: UserResponse::from_user(session.user, true),
            token: session.token,
            expires_at: ts(session.expires_at),
        }
    }
}

/// Viewer-relative flags on a profile
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipResponse {
    pub is_self: bool,
    pub is_following: bool,
    pub is_followed_by: bool,
    pub is_friend: bool,
    pub is_blocked: bool,
    pub friend_request_sent: bool,
    pub friend_request_received: bool,
}

impl RelationshipResponse {
    pub fn from_flags(flags: RelationshipFlags, is_self: bool) -> Self {
        Self {
            is_self,
            is_following: flags.is_following,
            is_followed_by: flags.is_followed_by,
            is_friend: flags.is_friend,
            is_blocked: flags.is_blocked,
            friend_request_sent: flags.request_sent,
            friend_request_received: flags.request_received,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileStatsResponse {
    pub followers_count: i64,
    pub following_count: i64,
    pub friends_count: i64,
    pub posts_count: i64,
}

impl From<ProfileStats> for ProfileStatsResponse {
    fn from(stats: ProfileStats) -> Self {
        Self {
            followers_count: stats.followers,
            following_count: stats.following,
            friends_count: stats.friends,
            posts_count: stats.posts,
        }
    }
}

/// Public profile with counts and viewer flags
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    #[serde(flatten)]
    pub stats: ProfileStatsResponse,
    #[serde(flatten)]
    pub relationship: RelationshipResponse,
}

impl From<Profile> for ProfileResponse {
    fn from(profile: Profile) -> Self {
        Self {
            user: UserResponse::from_user(profile.user, profile.is_self),
            stats: profile.stats.into(),
            relationship: RelationshipResponse::from_flags(profile.flags, profile.is_self),
        }
    }
}

/// Post response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: String,
    pub author: UserSummaryResponse,
    pub content: String,
    pub media_urls: Vec<String>,
    pub visibility: Visibility,
    pub likes_count: i32,
    pub comments_count: i32,
    pub shares_count: i32,
    pub is_liked: bool,
    pub is_saved: bool,
    pub is_own_post: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl PostResponse {
    pub fn from_view(view: PostView, viewer: Option<i64>) -> Self {
        let post = view.post;
        Self {
            id: post.id.to_string(),
            is_own_post: viewer == Some(post.author_id),
            author: view.author.into(),
            content: post.content,
            media_urls: post.media_urls,
            visibility: post.visibility,
            likes_count: post.likes_count,
            comments_count: post.comments_count,
            shares_count: post.shares_count,
            is_liked: view.liked_by_viewer,
            is_saved: view.saved_by_viewer,
            created_at: ts(post.created_at),
            updated_at: ts(post.updated_at),
        }
    }
}

/// Comment response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: String,
    pub post_id: String,
    pub author: UserSummaryResponse,
    pub content: String,
    pub is_own_comment: bool,
    pub created_at: String,
}

impl CommentResponse {
    pub fn from_view(view: CommentView, viewer: Option<i64>) -> Self {
        let comment = view.comment;
        Self {
            id: comment.id.to_string(),
            post_id: comment.post_id.to_string(),
            is_own_comment: viewer == Some(comment.author_id),
            author: view.author.into(),
            content: comment.content,
            created_at: ts(comment.created_at),
        }
    }
}

/// Incoming friend request
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestResponse {
    pub id: String,
    pub requester: UserSummaryResponse,
    pub addressee_id: String,
    pub created_at: String,
}

impl From<FriendRequestView> for FriendRequestResponse {
    fn from(view: FriendRequestView) -> Self {
        Self {
            id: view.request.id.to_string(),
            requester: view.requester.into(),
            addressee_id: view.request.addressee_id.to_string(),
            created_at: ts(view.request.created_at),
        }
    }
}

/// Friend request just sent
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentFriendRequestResponse {
    pub id: String,
    pub addressee_id: String,
    pub created_at: String,
}

impl From<FriendRequest> for SentFriendRequestResponse {
    fn from(request: FriendRequest) -> Self {
        Self {
            id: request.id.to_string(),
            addressee_id: request.addressee_id.to_string(),
            created_at: ts(request.created_at),
        }
    }
}

/// Friend suggestion
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionResponse {
    pub user: UserSummaryResponse,
    pub mutual_friends_count: usize,
}

impl SuggestionResponse {
    pub fn new(user: UserSummary, suggestion: Suggestion) -> Self {
        Self {
            user: user.into(),
            mutual_friends_count: suggestion.mutual_count,
        }
    }
}

/// Direct message
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub content: String,
    pub media_url: Option<String>,
    pub is_own_message: bool,
    pub created_at: String,
}

impl MessageResponse {
    pub fn from_message(message: Message, viewer: i64) -> Self {
        Self {
            id: message.id.to_string(),
            conversation_id: message.conversation_id.to_string(),
            sender_id: message.sender_id.to_string(),
            is_own_message: message.sender_id == viewer,
            content: message.content,
            media_url: message.media_url,
            created_at: ts(message.created_at),
        }
    }
}

/// Inbox entry
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationResponse {
    pub id: String,
    pub participant: UserSummaryResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message: Option<MessageResponse>,
    pub last_message_at: String,
    pub created_at: String,
}

impl ConversationResponse {
    pub fn from_summary(summary: ConversationSummary, viewer: i64) -> Self {
        Self {
            id: summary.conversation.id.to_string(),
            participant: summary.other.into(),
            last_message: summary
                .last_message
                .map(|m| MessageResponse::from_message(m, viewer)),
            last_message_at: ts(summary.conversation.last_message_at),
            created_at: ts(summary.conversation.created_at),
        }
    }
}

/// Notification response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub actor: UserSummaryResponse,
    pub post_id: Option<String>,
    pub comment_id: Option<String>,
    pub is_read: bool,
    pub created_at: String,
}

impl From<Notification> for NotificationResponse {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id.to_string(),
            kind: n.kind,
            actor: n.actor.into(),
            post_id: n.post_id.map(|id| id.to_string()),
            comment_id: n.comment_id.map(|id| id.to_string()),
            is_read: n.read_at.is_some(),
            created_at: ts(n.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct UpdatedCountResponse {
    pub updated: u64,
}

/// Event response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub id: String,
    pub organizer: UserSummaryResponse,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub starts_at: String,
    pub ends_at: Option<String>,
    pub going_count: i32,
    pub interested_count: i32,
    pub viewer_status: Option<RsvpStatus>,
    pub is_organizer: bool,
    pub created_at: String,
}

impl EventResponse {
    pub fn from_view(view: EventView, viewer: Option<i64>) -> Self {
        let event = view.event;
        Self {
            id: event.id.to_string(),
            is_organizer: viewer == Some(event.organizer_id),
            organizer: view.organizer.into(),
            title: event.title,
            description: event.description,
            location: event.location,
            starts_at: ts(event.starts_at),
            ends_at: event.ends_at.map(ts),
            going_count: event.going_count,
            interested_count: event.interested_count,
            viewer_status: view.viewer_status,
            created_at: ts(event.created_at),
        }
    }
}

/// Filed report
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub id: String,
    pub target_type: ReportTarget,
    pub target_id: String,
    pub reason: String,
    pub details: Option<String>,
    pub status: String,
    pub created_at: String,
}

impl From<Report> for ReportResponse {
    fn from(report: Report) -> Self {
        Self {
            id: report.id.to_string(),
            target_type: report.target_type,
            target_id: report.target_id.to_string(),
            reason: report.reason,
            details: report.details,
            status: report.status,
            created_at: ts(report.created_at),
        }
    }
}

/// Stored upload
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub url: String,
    pub key: String,
    pub content_type: String,
    pub size: u64,
}

impl From<StoredUpload> for UploadResponse {
    fn from(upload: StoredUpload) -> Self {
        Self {
            url: upload.url,
            key: upload.key,
            content_type: upload.content_type,
            size: upload.size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Post;
    use fake::faker::internet::en::Username;
    use fake::Fake;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn view(author_id: i64) -> PostView {
        let now = Utc::now();
        let username: String = Username().fake();
        PostView {
            post: Post {
                id: 99,
                author_id,
                content: "hi #rust".into(),
                media_urls: vec![],
                visibility: Visibility::Friends,
                likes_count: 3,
                comments_count: 1,
                shares_count: 0,
                created_at: now,
                updated_at: now,
            },
            author: UserSummary {
                id: author_id,
                username,
                display_name: "Author".into(),
                avatar_url: None,
            },
            liked_by_viewer: true,
            saved_by_viewer: false,
            listed_at: now,
        }
    }

    #[test]
    fn post_response_is_camel_cased_with_string_ids() {
        let value = serde_json::to_value(PostResponse::from_view(view(5), Some(5))).unwrap();

        assert_eq!(value["id"], json!("99"));
        assert_eq!(value["author"]["id"], json!("5"));
        assert_eq!(value["visibility"], json!("friends"));
        assert_eq!(value["likesCount"], json!(3));
        assert_eq!(value["isLiked"], json!(true));
        assert_eq!(value["isOwnPost"], json!(true));
    }

    #[test]
    fn anonymous_viewer_owns_nothing() {
        let response = PostResponse::from_view(view(5), None);
        assert!(!response.is_own_post);
    }

    #[test]
    fn email_is_only_included_on_request() {
        let user = User {
            id: 1,
            email: "a@example.com".into(),
            ..Default::default()
        };
        let value = serde_json::to_value(UserResponse::from_user(user, false)).unwrap();
        assert!(value.get("email").is_none());
    }

    #[test]
    fn notification_kind_serializes_as_type() {
        let n = Notification {
            id: 4,
            recipient_id: 1,
            actor: UserSummary::default(),
            kind: NotificationKind::FriendRequest,
            post_id: None,
            comment_id: None,
            read_at: None,
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(NotificationResponse::from(n)).unwrap();
        assert_eq!(value["type"], json!("friend_request"));
        assert_eq!(value["isRead"], json!(false));
    }
}
