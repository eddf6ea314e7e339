//! # Domain Entities
//!
//! Core domain entities of the social network. All entities map directly to
//! their corresponding database tables.
//!
//! ## Core Entities
//!
//! - **User**: account and profile
//! - **Post**: content with visibility, counters and hashtags
//! - **Comment**: reply on a post
//! - **Conversation / Message**: direct messaging
//! - **Event**: scheduled gathering with RSVPs
//!
//! ## Supporting Entities
//!
//! - **Session**: opaque login session (cookie or bearer)
//! - **Notification**: activity addressed to a user
//! - **Relationship**: follows, friendships, friend requests, blocks
//! - **Report**: moderation report on a post, comment or user
//!
//! ## Repository Traits
//!
//! Each entity has an associated repository trait defining data access
//! operations. These traits are implemented in the infrastructure layer.

mod comment;
mod conversation;
mod engagement;
mod event;
mod message;
mod notification;
mod post;
mod relationship;
mod report;
mod session;
mod user;

pub use comment::{Comment, CommentRepository, CommentView, NewComment};
pub use conversation::{direct_key, Conversation, ConversationRepository, ConversationSummary};
pub use engagement::EngagementRepository;
pub use event::{Event, EventRepository, EventView, NewEvent, RsvpOutcome, RsvpStatus};
pub use message::{Message, NewMessage, MAX_MESSAGE_LENGTH};
pub use notification::{Notification, NotificationDraft, NotificationKind, NotificationRepository};
pub use post::{NewPost, Post, PostRepository, PostUpdate, PostView, Visibility};
pub use relationship::{FriendRequest, FriendRequestView, RelationshipFlags, RelationshipRepository};
pub use report::{NewReport, Report, ReportRepository, ReportTarget};
pub use session::{NewSession, Session, SessionRepository};
pub use user::{
    NewUser, ProfileStats, ProfileUpdate, User, UserListing, UserRepository, UserSummary,
};

#[cfg(test)]
pub use comment::MockCommentRepository;
#[cfg(test)]
pub use conversation::MockConversationRepository;
#[cfg(test)]
pub use engagement::MockEngagementRepository;
#[cfg(test)]
pub use event::MockEventRepository;
#[cfg(test)]
pub use notification::MockNotificationRepository;
#[cfg(test)]
pub use post::MockPostRepository;
#[cfg(test)]
pub use relationship::MockRelationshipRepository;
#[cfg(test)]
pub use report::MockReportRepository;
#[cfg(test)]
pub use session::MockSessionRepository;
#[cfg(test)]
pub use user::MockUserRepository;
