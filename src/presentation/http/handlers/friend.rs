//! Friend Handlers

use axum::extract::State;
use serde_json::{json, Value};

use crate::application::dto::parse_id;
use crate::application::dto::request::{FriendRequestBody, PageQuery};
use crate::application::dto::response::{
    FriendRequestResponse, SentFriendRequestResponse, UserSummaryResponse,
};
use crate::presentation::http::extractors::{PathId, ValidatedJson, ValidatedQuery};
use crate::presentation::middleware::AuthContext;
use crate::shared::response::{ApiResponse, ApiResult};
use crate::startup::AppState;

pub async fn list_friends(
    State(state): State<AppState>,
    ctx: AuthContext,
    ValidatedQuery(query): ValidatedQuery<PageQuery>,
) -> ApiResult<Vec<UserSummaryResponse>> {
    let page = state.page(query.cursor.as_deref(), query.limit)?;
    let friends = state.friend_service().friends(ctx.user_id, page).await?;
    Ok(ApiResponse::page(friends.map(Into::into)))
}

/// Pending requests addressed to the caller
pub async fn list_requests(
    State(state): State<AppState>,
    ctx: AuthContext,
    ValidatedQuery(query): ValidatedQuery<PageQuery>,
) -> ApiResult<Vec<FriendRequestResponse>> {
    let page = state.page(query.cursor.as_deref(), query.limit)?;
    let requests = state.friend_service().incoming(ctx.user_id, page).await?;
    Ok(ApiResponse::page(requests.map(Into::into)))
}

pub async fn send_request(
    State(state): State<AppState>,
    ctx: AuthContext,
    ValidatedJson(body): ValidatedJson<FriendRequestBody>,
) -> ApiResult<SentFriendRequestResponse> {
    let addressee_id = parse_id("userId", &body.user_id)?;
    let request = state
        .friend_service()
        .send_request(ctx.user_id, addressee_id)
        .await?;

    Ok(ApiResponse::created(request.into()))
}

pub async fn accept_request(
    State(state): State<AppState>,
    ctx: AuthContext,
    PathId(request_id): PathId,
) -> ApiResult<Value> {
    state.friend_service().accept(ctx.user_id, request_id).await?;
    Ok(ApiResponse::success(json!({ "accepted": true })))
}

pub async fn decline_request(
    State(state): State<AppState>,
    ctx: AuthContext,
    PathId(request_id): PathId,
) -> ApiResult<Value> {
    state.friend_service().decline(ctx.user_id, request_id).await?;
    Ok(ApiResponse::success(json!({ "declined": true })))
}

pub async fn remove_friend(
    State(state): State<AppState>,
    ctx: AuthContext,
    PathId(friend_id): PathId,
) -> ApiResult<Value> {
    state.friend_service().remove_friend(ctx.user_id, friend_id).await?;
    Ok(ApiResponse::success(json!({ "removed": true })))
}
