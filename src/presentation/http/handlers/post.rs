//! Post Handlers

use axum::extract::State;
use serde_json::{json, Value};

use crate::application::dto::request::{CreatePostRequest, PageQuery, UpdatePostRequest};
use crate::application::dto::response::PostResponse;
use crate::presentation::http::extractors::{PathId, ValidatedJson, ValidatedQuery};
use crate::presentation::middleware::{AuthContext, OptionalAuthContext};
use crate::shared::response::{ApiResponse, ApiResult};
use crate::startup::AppState;

/// Home feed: own posts, followed authors' public posts and friends' posts
pub async fn feed(
    State(state): State<AppState>,
    ctx: AuthContext,
    ValidatedQuery(query): ValidatedQuery<PageQuery>,
) -> ApiResult<Vec<PostResponse>> {
    let page = state.page(query.cursor.as_deref(), query.limit)?;
    let viewer = Some(ctx.user_id);

    let posts = state.post_service().feed(ctx.user_id, page).await?;
    Ok(ApiResponse::page(posts.map(|p| PostResponse::from_view(p, viewer))))
}

pub async fn create_post(
    State(state): State<AppState>,
    ctx: AuthContext,
    ValidatedJson(body): ValidatedJson<CreatePostRequest>,
) -> ApiResult<PostResponse> {
    let post = state.post_service().create(ctx.user_id, body).await?;

    tracing::info!(post_id = post.post.id, author_id = ctx.user_id, "Post created");

    Ok(ApiResponse::created(PostResponse::from_view(post, Some(ctx.user_id))))
}

pub async fn get_post(
    State(state): State<AppState>,
    ctx: OptionalAuthContext,
    PathId(post_id): PathId,
) -> ApiResult<PostResponse> {
    let viewer = ctx.user_id();
    let post = state.post_service().get(post_id, viewer).await?;
    Ok(ApiResponse::success(PostResponse::from_view(post, viewer)))
}

pub async fn update_post(
    State(state): State<AppState>,
    ctx: AuthContext,
    PathId(post_id): PathId,
    ValidatedJson(body): ValidatedJson<UpdatePostRequest>,
) -> ApiResult<PostResponse> {
    let post = state.post_service().update(ctx.user_id, post_id, body).await?;
    Ok(ApiResponse::success(PostResponse::from_view(post, Some(ctx.user_id))))
}

pub async fn delete_post(
    State(state): State<AppState>,
    ctx: AuthContext,
    PathId(post_id): PathId,
) -> ApiResult<Value> {
    state.post_service().delete(ctx.user_id, post_id).await?;

    tracing::info!(post_id, author_id = ctx.user_id, "Post deleted");

    Ok(ApiResponse::success(json!({ "deleted": true })))
}
