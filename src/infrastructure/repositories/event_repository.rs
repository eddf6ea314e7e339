//! Event Repository Implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use crate::domain::{
    Event, EventRepository, EventView, NewEvent, RsvpOutcome, RsvpStatus, UserSummary,
};
use crate::shared::error::AppError;
use crate::shared::pagination::{PageRequest, SortDirection};

macro_rules! event_view_select {
    () => {
        r#"
        SELECT e.id, e.organizer_id, e.title, e.description, e.location, e.starts_at, e.ends_at,
               e.going_count, e.interested_count, e.created_at,
               u.username AS organizer_username, u.display_name AS organizer_display_name,
               u.avatar_url AS organizer_avatar_url,
               (SELECT a.status FROM event_attendees a WHERE a.event_id = e.id AND a.user_id = $1) AS viewer_status
        FROM events e
        JOIN users u ON u.id = e.organizer_id
        "#
    };
}

#[derive(Debug, sqlx::FromRow)]
struct EventRow {
    id: i64,
    organizer_id: i64,
    title: String,
    description: Option<String>,
    location: Option<String>,
    starts_at: DateTime<Utc>,
    ends_at: Option<DateTime<Utc>>,
    going_count: i32,
    interested_count: i32,
    created_at: DateTime<Utc>,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Self {
            id: row.id,
            organizer_id: row.organizer_id,
            title: row.title,
            description: row.description,
            location: row.location,
            starts_at: row.starts_at,
            ends_at: row.ends_at,
            going_count: row.going_count,
            interested_count: row.interested_count,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct EventViewRow {
    #[sqlx(flatten)]
    event: EventRow,
    organizer_username: String,
    organizer_display_name: String,
    organizer_avatar_url: Option<String>,
    viewer_status: Option<String>,
}

impl EventViewRow {
    fn into_view(self) -> EventView {
        EventView {
            organizer: UserSummary {
                id: self.event.organizer_id,
                username: self.organizer_username,
                display_name: self.organizer_display_name,
                avatar_url: self.organizer_avatar_url,
            },
            viewer_status: self.viewer_status.as_deref().and_then(RsvpStatus::from_db),
            event: self.event.into(),
        }
    }
}

/// Insert attempts before giving up on an RSVP that keeps vanishing.
const RSVP_ATTEMPTS: usize = 3;

/// What to do after the insert hit an existing row.
#[derive(Debug, PartialEq, Eq)]
enum RsvpStep {
    /// The row was removed after the conflicting insert; insert again.
    Retry,
    Unchanged,
    Switch(RsvpStatus),
}

fn rsvp_step(current: Option<&str>, requested: RsvpStatus) -> Result<RsvpStep, AppError> {
    let Some(current) = current else {
        return Ok(RsvpStep::Retry);
    };
    let previous = RsvpStatus::from_db(current)
        .ok_or_else(|| AppError::server_error(format!("unknown rsvp status {current}")))?;

    Ok(if previous == requested {
        RsvpStep::Unchanged
    } else {
        RsvpStep::Switch(previous)
    })
}

/// Counter deltas `(going, interested)` for one attendee in `status`.
fn deltas(status: RsvpStatus, sign: i32) -> (i32, i32) {
    match status {
        RsvpStatus::Going => (sign, 0),
        RsvpStatus::Interested => (0, sign),
    }
}

async fn adjust_counts(
    conn: &mut PgConnection,
    event_id: i64,
    (going, interested): (i32, i32),
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        UPDATE events
        SET going_count      = GREATEST(going_count + $2, 0),
            interested_count = GREATEST(interested_count + $3, 0)
        WHERE id = $1
        "#,
    )
    .bind(event_id)
    .bind(going)
    .bind(interested)
    .execute(conn)
    .await?;

    Ok(())
}

#[derive(Clone)]
pub struct PgEventRepository {
    pool: PgPool,
}

impl PgEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventRepository for PgEventRepository {
    async fn create(&self, event: &NewEvent) -> Result<Event, AppError> {
        let row = sqlx::query_as::<_, EventRow>(
            r#"
            INSERT INTO events (id, organizer_id, title, description, location, starts_at, ends_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, organizer_id, title, description, location, starts_at, ends_at,
                      going_count, interested_count, created_at
            "#,
        )
        .bind(event.id)
        .bind(event.organizer_id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.location)
        .bind(event.starts_at)
        .bind(event.ends_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Event>, AppError> {
        let row = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT id, organizer_id, title, description, location, starts_at, ends_at,
                   going_count, interested_count, created_at
            FROM events
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn find_view(&self, id: i64, viewer: Option<i64>) -> Result<Option<EventView>, AppError> {
        let row = sqlx::query_as::<_, EventViewRow>(concat!(event_view_select!(), "WHERE e.id = $2"))
            .bind(viewer)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(EventViewRow::into_view))
    }

    async fn upcoming(
        &self,
        viewer: Option<i64>,
        now: DateTime<Utc>,
        page: PageRequest,
    ) -> Result<Vec<EventView>, AppError> {
        let rows = sqlx::query_as::<_, EventViewRow>(concat!(
            event_view_select!(),
            r#"
            WHERE e.starts_at >= $2
              AND ($3::timestamptz IS NULL OR (e.starts_at, e.id) > ($3, $4))
            ORDER BY e.starts_at ASC, e.id ASC
            LIMIT $5
            "#,
        ))
        .bind(viewer)
        .bind(now)
        .bind(page.cursor_at())
        .bind(page.cursor_id(SortDirection::Ascending))
        .bind(page.fetch_limit())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(EventViewRow::into_view).collect())
    }

    async fn set_rsvp(
        &self,
        event_id: i64,
        user_id: i64,
        status: RsvpStatus,
    ) -> Result<RsvpOutcome, AppError> {
        let mut tx = self.pool.begin().await?;

        for _ in 0..RSVP_ATTEMPTS {
            let inserted = sqlx::query(
                r#"
                INSERT INTO event_attendees (event_id, user_id, status)
                VALUES ($1, $2, $3)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(event_id)
            .bind(user_id)
            .bind(status.as_str())
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if inserted > 0 {
                adjust_counts(&mut tx, event_id, deltas(status, 1)).await?;
                tx.commit().await?;
                return Ok(RsvpOutcome::Created);
            }

            let current: Option<String> = sqlx::query_scalar(
                "SELECT status FROM event_attendees WHERE event_id = $1 AND user_id = $2 FOR UPDATE",
            )
            .bind(event_id)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;

            let previous = match rsvp_step(current.as_deref(), status)? {
                RsvpStep::Retry => continue,
                RsvpStep::Unchanged => return Ok(RsvpOutcome::Unchanged),
                RsvpStep::Switch(previous) => previous,
            };

            sqlx::query("UPDATE event_attendees SET status = $3 WHERE event_id = $1 AND user_id = $2")
                .bind(event_id)
                .bind(user_id)
                .bind(status.as_str())
                .execute(&mut *tx)
                .await?;

            let (going_out, interested_out) = deltas(previous, -1);
            let (going_in, interested_in) = deltas(status, 1);
            adjust_counts(
                &mut tx,
                event_id,
                (going_out + going_in, interested_out + interested_in),
            )
            .await?;

            tx.commit().await?;
            return Ok(RsvpOutcome::Updated);
        }

        Err(AppError::server_error(format!(
            "rsvp for event {event_id} kept conflicting with concurrent removals"
        )))
    }

    async fn remove_rsvp(&self, event_id: i64, user_id: i64) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let removed: Option<String> = sqlx::query_scalar(
            "DELETE FROM event_attendees WHERE event_id = $1 AND user_id = $2 RETURNING status",
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(status) = removed.as_deref().and_then(RsvpStatus::from_db) else {
            return Ok(false);
        };

        adjust_counts(&mut tx, event_id, deltas(status, -1)).await?;

        tx.commit().await?;
        Ok(true)
    }
}
