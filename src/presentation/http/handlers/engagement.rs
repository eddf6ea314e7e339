//! Engagement Handlers
//!
//! Likes, saves and shares. Each returns the post with refreshed counters
//! and viewer flags.

use axum::extract::State;

use crate::application::dto::response::PostResponse;
use crate::presentation::http::extractors::PathId;
use crate::presentation::middleware::AuthContext;
use crate::shared::response::{ApiResponse, ApiResult};
use crate::startup::AppState;

pub async fn like(
    State(state): State<AppState>,
    ctx: AuthContext,
    PathId(post_id): PathId,
) -> ApiResult<PostResponse> {
    let post = state.engagement_service().like(ctx.user_id, post_id).await?;
    Ok(ApiResponse::success(PostResponse::from_view(post, Some(ctx.user_id))))
}

pub async fn unlike(
    State(state): State<AppState>,
    ctx: AuthContext,
    PathId(post_id): PathId,
) -> ApiResult<PostResponse> {
    let post = state.engagement_service().unlike(ctx.user_id, post_id).await?;
    Ok(ApiResponse::success(PostResponse::from_view(post, Some(ctx.user_id))))
}

pub async fn save(
    State(state): State<AppState>,
    ctx: AuthContext,
    PathId(post_id): PathId,
) -> ApiResult<PostResponse> {
    let post = state.engagement_service().save(ctx.user_id, post_id).await?;
    Ok(ApiResponse::success(PostResponse::from_view(post, Some(ctx.user_id))))
}

pub async fn unsave(
    State(state): State<AppState>,
    ctx: AuthContext,
    PathId(post_id): PathId,
) -> ApiResult<PostResponse> {
    let post = state.engagement_service().unsave(ctx.user_id, post_id).await?;
    Ok(ApiResponse::success(PostResponse::from_view(post, Some(ctx.user_id))))
}

pub async fn share(
    State(state): State<AppState>,
    ctx: AuthContext,
    PathId(post_id): PathId,
) -> ApiResult<PostResponse> {
    let post = state.engagement_service().share(ctx.user_id, post_id).await?;
    Ok(ApiResponse::created(PostResponse::from_view(post, Some(ctx.user_id))))
}
