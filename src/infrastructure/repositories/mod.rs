//! Repository Implementations
//!
//! PostgreSQL implementations of the domain repository traits.
//!
//! List queries use keyset pagination on `(timestamp, id)`:
//!
//! ```sql
//! WHERE ($2::timestamptz IS NULL OR (created_at, id) < ($2, $3))
//! ORDER BY created_at DESC, id DESC
//! LIMIT $4 -- page.fetch_limit()
//! ```
//!
//! Multi-step writes (row + counter + notification) run in a single
//! transaction and detect duplicates with `ON CONFLICT DO NOTHING`.

pub mod comment_repository;
pub mod conversation_repository;
pub mod engagement_repository;
pub mod event_repository;
pub mod notification_repository;
pub mod post_repository;
pub mod relationship_repository;
pub mod report_repository;
pub mod session_repository;
pub mod user_repository;

pub use comment_repository::PgCommentRepository;
pub use conversation_repository::PgConversationRepository;
pub use engagement_repository::PgEngagementRepository;
pub use event_repository::PgEventRepository;
pub use notification_repository::PgNotificationRepository;
pub use post_repository::PgPostRepository;
pub use relationship_repository::PgRelationshipRepository;
pub use report_repository::PgReportRepository;
pub use session_repository::PgSessionRepository;
pub use user_repository::PgUserRepository;

use chrono::{DateTime, Utc};

use crate::domain::{UserListing, UserSummary};

/// `users` columns for an embedded summary.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct SummaryRow {
    id: i64,
    username: String,
    display_name: String,
    avatar_url: Option<String>,
}

impl SummaryRow {
    pub(crate) fn into_summary(self) -> UserSummary {
        UserSummary {
            id: self.id,
            username: self.username,
            display_name: self.display_name,
            avatar_url: self.avatar_url,
        }
    }
}

/// A user plus the timestamp their list is ordered by.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ListingRow {
    id: i64,
    username: String,
    display_name: String,
    avatar_url: Option<String>,
    listed_at: DateTime<Utc>,
}

impl ListingRow {
    pub(crate) fn into_listing(self) -> UserListing {
        UserListing {
            user: UserSummary {
                id: self.id,
                username: self.username,
                display_name: self.display_name,
                avatar_url: self.avatar_url,
            },
            listed_at: self.listed_at,
        }
    }
}

/// Escape `%`, `_` and `\` for use inside a LIKE pattern.
pub(crate) fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }
}
