//! Event entity and repository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::UserSummary;
use crate::shared::error::AppError;
use crate::shared::pagination::{Cursor, Keyset, PageRequest};

/// An attendee's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RsvpStatus {
    Going,
    Interested,
}

impl RsvpStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Going => "going",
            Self::Interested => "interested",
        }
    }

    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "going" => Some(Self::Going),
            "interested" => Some(Self::Interested),
            _ => None,
        }
    }
}

/// Result of setting an RSVP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RsvpOutcome {
    Created,
    /// The status changed from the other value.
    Updated,
    /// The user already had this status.
    Unchanged,
}

/// Maps to the `events` table.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub id: i64,
    pub organizer_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub going_count: i32,
    pub interested_count: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewEvent {
    pub id: i64,
    pub organizer_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
}

/// Event with organizer and the viewer's RSVP.
#[derive(Debug, Clone, PartialEq)]
pub struct EventView {
    pub event: Event,
    pub organizer: UserSummary,
    pub viewer_status: Option<RsvpStatus>,
}

impl Keyset for EventView {
    fn keyset(&self) -> Cursor {
        Cursor::new(self.event.starts_at, self.event.id)
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn create(&self, event: &NewEvent) -> Result<Event, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Event>, AppError>;

    async fn find_view(&self, id: i64, viewer: Option<i64>) -> Result<Option<EventView>, AppError>;

    /// Events starting at or after `now`, soonest first.
    async fn upcoming(
        &self,
        viewer: Option<i64>,
        now: DateTime<Utc>,
        page: PageRequest,
    ) -> Result<Vec<EventView>, AppError>;

    /// Upsert the attendee row and adjust both counters in one transaction.
    async fn set_rsvp(
        &self,
        event_id: i64,
        user_id: i64,
        status: RsvpStatus,
    ) -> Result<RsvpOutcome, AppError>;

    /// False when the user had no RSVP.
    async fn remove_rsvp(&self, event_id: i64, user_id: i64) -> Result<bool, AppError>;
}
