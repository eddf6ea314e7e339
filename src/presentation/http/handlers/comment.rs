//! Comment Handlers

use axum::extract::State;
use serde_json::{json, Value};

use crate::application::dto::request::{CreateCommentRequest, PageQuery};
use crate::application::dto::response::CommentResponse;
use crate::presentation::http::extractors::{PathId, ValidatedJson, ValidatedQuery};
use crate::presentation::middleware::{AuthContext, OptionalAuthContext};
use crate::shared::response::{ApiResponse, ApiResult};
use crate::startup::AppState;

/// Comments on a visible post, oldest first
pub async fn list_comments(
    State(state): State<AppState>,
    ctx: OptionalAuthContext,
    PathId(post_id): PathId,
    ValidatedQuery(query): ValidatedQuery<PageQuery>,
) -> ApiResult<Vec<CommentResponse>> {
    let page = state.page(query.cursor.as_deref(), query.limit)?;
    let viewer = ctx.user_id();

    let comments = state.comment_service().list(post_id, viewer, page).await?;
    Ok(ApiResponse::page(comments.map(|c| CommentResponse::from_view(c, viewer))))
}

pub async fn create_comment(
    State(state): State<AppState>,
    ctx: AuthContext,
    PathId(post_id): PathId,
    ValidatedJson(body): ValidatedJson<CreateCommentRequest>,
) -> ApiResult<CommentResponse> {
    let comment = state
        .comment_service()
        .create(ctx.user_id, post_id, body)
        .await?;

    Ok(ApiResponse::created(CommentResponse::from_view(comment, Some(ctx.user_id))))
}

/// Comment author or post author only
pub async fn delete_comment(
    State(state): State<AppState>,
    ctx: AuthContext,
    PathId(comment_id): PathId,
) -> ApiResult<Value> {
    state.comment_service().delete(ctx.user_id, comment_id).await?;
    Ok(ApiResponse::success(json!({ "deleted": true })))
}
