//! Notification Handlers

use axum::extract::State;
use serde_json::{json, Value};

use crate::application::dto::request::NotificationQuery;
use crate::application::dto::response::{
    NotificationResponse, UnreadCountResponse, UpdatedCountResponse,
};
use crate::presentation::http::extractors::{PathId, ValidatedQuery};
use crate::presentation::middleware::AuthContext;
use crate::shared::response::{ApiResponse, ApiResult};
use crate::startup::AppState;

pub async fn list_notifications(
    State(state): State<AppState>,
    ctx: AuthContext,
    ValidatedQuery(query): ValidatedQuery<NotificationQuery>,
) -> ApiResult<Vec<NotificationResponse>> {
    let page = state.page(query.cursor.as_deref(), query.limit)?;
    let unread_only = query.unread_only.unwrap_or(false);

    let notifications = state
        .notification_service()
        .list(ctx.user_id, unread_only, page)
        .await?;
    Ok(ApiResponse::page(notifications.map(Into::into)))
}

pub async fn unread_count(State(state): State<AppState>, ctx: AuthContext) -> ApiResult<UnreadCountResponse> {
    let count = state.notification_service().unread_count(ctx.user_id).await?;
    Ok(ApiResponse::success(UnreadCountResponse { count }))
}

pub async fn mark_read(
    State(state): State<AppState>,
    ctx: AuthContext,
    PathId(notification_id): PathId,
) -> ApiResult<Value> {
    state
        .notification_service()
        .mark_read(ctx.user_id, notification_id)
        .await?;
    Ok(ApiResponse::success(json!({ "read": true })))
}

pub async fn mark_all_read(State(state): State<AppState>, ctx: AuthContext) -> ApiResult<UpdatedCountResponse> {
    let updated = state.notification_service().mark_all_read(ctx.user_id).await?;
    Ok(ApiResponse::success(UpdatedCountResponse { updated }))
}
