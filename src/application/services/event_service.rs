//! Event Service
//!
//! Events and RSVPs. Attendee counters are maintained by the repository in
//! the same transaction as the RSVP row.

use std::sync::Arc;

use chrono::Utc;

use crate::application::dto::request::CreateEventRequest;
use crate::domain::{EventRepository, EventView, NewEvent, RsvpOutcome, RsvpStatus};
use crate::shared::error::AppError;
use crate::shared::pagination::{Page, PageRequest};
use crate::shared::snowflake::SnowflakeGenerator;

pub struct EventService {
    events: Arc<dyn EventRepository>,
    id_generator: Arc<SnowflakeGenerator>,
}

impl EventService {
    pub fn new(events: Arc<dyn EventRepository>, id_generator: Arc<SnowflakeGenerator>) -> Self {
        Self {
            events,
            id_generator,
        }
    }

    /// Soonest first, starting now.
    pub async fn upcoming(&self, viewer: Option<i64>, page: PageRequest) -> Result<Page<EventView>, AppError> {
        let rows = self.events.upcoming(viewer, Utc::now(), page).await?;
        Ok(Page::from_overfetch(rows, page.limit))
    }

    pub async fn create(&self, organizer_id: i64, req: CreateEventRequest) -> Result<EventView, AppError> {
        let starts_at = req
            .starts_at
            .ok_or_else(|| AppError::invalid_field("startsAt", "Start time is required"))?;
        if req.ends_at.is_some_and(|ends| ends < starts_at) {
            return Err(AppError::invalid_field(
                "endsAt",
                "End time must not be before the start time",
            ));
        }

        let event = self
            .events
            .create(&NewEvent {
                id: self.id_generator.generate(),
                organizer_id,
                title: req.title.trim().to_string(),
                description: req.description.filter(|d| !d.trim().is_empty()),
                location: req.location.filter(|l| !l.trim().is_empty()),
                starts_at,
                ends_at: req.ends_at,
            })
            .await?;

        tracing::info!(event_id = event.id, organizer_id, "Event created");
        self.get(event.id, Some(organizer_id)).await
    }

    pub async fn get(&self, event_id: i64, viewer: Option<i64>) -> Result<EventView, AppError> {
        self.events
            .find_view(event_id, viewer)
            .await?
            .ok_or_else(|| AppError::not_found("Event"))
    }

    /// Responding again with the same status is a conflict; switching
    /// between going and interested is an update.
    pub async fn attend(
        &self,
        user_id: i64,
        event_id: i64,
        status: RsvpStatus,
    ) -> Result<(EventView, RsvpOutcome), AppError> {
        self.ensure_exists(event_id).await?;

        let outcome = self.events.set_rsvp(event_id, user_id, status).await?;
        if outcome == RsvpOutcome::Unchanged {
            return Err(AppError::already_exists(format!(
                "Already marked as {}",
                status.as_str()
            )));
        }

        Ok((self.get(event_id, Some(user_id)).await?, outcome))
    }

    pub async fn unattend(&self, user_id: i64, event_id: i64) -> Result<EventView, AppError> {
        self.ensure_exists(event_id).await?;

        if !self.events.remove_rsvp(event_id, user_id).await? {
            return Err(AppError::not_found("RSVP"));
        }
        self.get(event_id, Some(user_id)).await
    }

    async fn ensure_exists(&self, event_id: i64) -> Result<(), AppError> {
        self.events
            .find_by_id(event_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| AppError::not_found("Event"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MockEventRepository;
    use chrono::Duration;

    fn service(events: MockEventRepository) -> EventService {
        EventService::new(Arc::new(events), Arc::new(SnowflakeGenerator::default()))
    }

    #[tokio::test]
    async fn end_before_start_is_rejected() {
        let mut events = MockEventRepository::new();
        events.expect_create().never();

        let starts = Utc::now() + Duration::days(2);
        let req = CreateEventRequest {
            title: "Meetup".into(),
            starts_at: Some(starts),
            ends_at: Some(starts - Duration::hours(1)),
            ..Default::default()
        };

        let err = service(events).create(1, req).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ref d) if d[0].field == "endsAt"));
    }

    #[tokio::test]
    async fn same_status_twice_conflicts() {
        let mut events = MockEventRepository::new();
        events.expect_find_by_id().returning(|id| {
            Ok(Some(crate::domain::Event {
                id,
                organizer_id: 1,
                title: "t".into(),
                description: None,
                location: None,
                starts_at: Utc::now(),
                ends_at: None,
                going_count: 1,
                interested_count: 0,
                created_at: Utc::now(),
            }))
        });
        events
            .expect_set_rsvp()
            .returning(|_, _, _| Ok(RsvpOutcome::Unchanged));

        let err = service(events)
            .attend(2, 7, RsvpStatus::Going)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AlreadyExists(_)));
    }
}
