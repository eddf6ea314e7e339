//! Event Handlers

use axum::{extract::State, http::StatusCode};

use crate::application::dto::request::{AttendRequest, CreateEventRequest, PageQuery};
use crate::application::dto::response::EventResponse;
use crate::domain::RsvpOutcome;
use crate::presentation::http::extractors::{PathId, ValidatedJson, ValidatedQuery};
use crate::presentation::middleware::{AuthContext, OptionalAuthContext};
use crate::shared::response::{ApiResponse, ApiResult};
use crate::startup::AppState;

/// Upcoming events, soonest first
pub async fn list_events(
    State(state): State<AppState>,
    ctx: OptionalAuthContext,
    ValidatedQuery(query): ValidatedQuery<PageQuery>,
) -> ApiResult<Vec<EventResponse>> {
    let page = state.page(query.cursor.as_deref(), query.limit)?;
    let viewer = ctx.user_id();

    let events = state.event_service().upcoming(viewer, page).await?;
    Ok(ApiResponse::page(events.map(|e| EventResponse::from_view(e, viewer))))
}

pub async fn create_event(
    State(state): State<AppState>,
    ctx: AuthContext,
    ValidatedJson(body): ValidatedJson<CreateEventRequest>,
) -> ApiResult<EventResponse> {
    let event = state.event_service().create(ctx.user_id, body).await?;
    Ok(ApiResponse::created(EventResponse::from_view(event, Some(ctx.user_id))))
}

pub async fn get_event(
    State(state): State<AppState>,
    ctx: OptionalAuthContext,
    PathId(event_id): PathId,
) -> ApiResult<EventResponse> {
    let viewer = ctx.user_id();
    let event = state.event_service().get(event_id, viewer).await?;
    Ok(ApiResponse::success(EventResponse::from_view(event, viewer)))
}

/// RSVP; 201 for a first response, 200 when switching status
pub async fn attend(
    State(state): State<AppState>,
    ctx: AuthContext,
    PathId(event_id): PathId,
    ValidatedJson(body): ValidatedJson<AttendRequest>,
) -> ApiResult<EventResponse> {
    let (event, outcome) = state
        .event_service()
        .attend(ctx.user_id, event_id, body.status())
        .await?;

    let status = match outcome {
        RsvpOutcome::Created => StatusCode::CREATED,
        RsvpOutcome::Updated | RsvpOutcome::Unchanged => StatusCode::OK,
    };
    Ok(ApiResponse::success(EventResponse::from_view(event, Some(ctx.user_id))).with_status(status))
}

pub async fn unattend(
    State(state): State<AppState>,
    ctx: AuthContext,
    PathId(event_id): PathId,
) -> ApiResult<EventResponse> {
    let event = state.event_service().unattend(ctx.user_id, event_id).await?;
    Ok(ApiResponse::success(EventResponse::from_view(event, Some(ctx.user_id))))
}
