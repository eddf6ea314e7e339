//! User Handlers

use axum::extract::State;
use serde_json::{json, Value};

use crate::application::dto::request::{PageQuery, SuggestionQuery, UpdateProfileRequest};
use crate::application::dto::response::{
    PostResponse, ProfileResponse, SuggestionResponse, UserResponse, UserSummaryResponse,
};
use crate::presentation::http::extractors::{PathId, ValidatedJson, ValidatedQuery};
use crate::presentation::middleware::{AuthContext, OptionalAuthContext};
use crate::shared::response::{ApiResponse, ApiResult};
use crate::startup::AppState;

/// Get current authenticated user
pub async fn me(State(state): State<AppState>, ctx: AuthContext) -> ApiResult<UserResponse> {
    let user = state.user_service().me(&ctx.identity).await?;
    Ok(ApiResponse::success(UserResponse::from_user(user, true)))
}

/// Update current user profile
pub async fn update_me(
    State(state): State<AppState>,
    ctx: AuthContext,
    ValidatedJson(body): ValidatedJson<UpdateProfileRequest>,
) -> ApiResult<UserResponse> {
    let user = state.user_service().update_me(ctx.user_id, body).await?;
    Ok(ApiResponse::success(UserResponse::from_user(user, true)))
}

pub async fn get_user(
    State(state): State<AppState>,
    ctx: OptionalAuthContext,
    PathId(user_id): PathId,
) -> ApiResult<ProfileResponse> {
    let profile = state.user_service().profile(user_id, ctx.user_id()).await?;
    Ok(ApiResponse::success(profile.into()))
}

pub async fn user_posts(
    State(state): State<AppState>,
    ctx: OptionalAuthContext,
    PathId(user_id): PathId,
    ValidatedQuery(query): ValidatedQuery<PageQuery>,
) -> ApiResult<Vec<PostResponse>> {
    let page = state.page(query.cursor.as_deref(), query.limit)?;
    let viewer = ctx.user_id();

    let posts = state.user_service().posts_of(user_id, viewer, page).await?;
    Ok(ApiResponse::page(posts.map(|p| PostResponse::from_view(p, viewer))))
}

pub async fn followers(
    State(state): State<AppState>,
    _ctx: OptionalAuthContext,
    PathId(user_id): PathId,
    ValidatedQuery(query): ValidatedQuery<PageQuery>,
) -> ApiResult<Vec<UserSummaryResponse>> {
    let page = state.page(query.cursor.as_deref(), query.limit)?;
    let users = state.user_service().followers(user_id, page).await?;
    Ok(ApiResponse::page(users.map(Into::into)))
}

pub async fn following(
    State(state): State<AppState>,
    _ctx: OptionalAuthContext,
    PathId(user_id): PathId,
    ValidatedQuery(query): ValidatedQuery<PageQuery>,
) -> ApiResult<Vec<UserSummaryResponse>> {
    let page = state.page(query.cursor.as_deref(), query.limit)?;
    let users = state.user_service().following(user_id, page).await?;
    Ok(ApiResponse::page(users.map(Into::into)))
}

pub async fn mutual_friends(
    State(state): State<AppState>,
    ctx: AuthContext,
    PathId(user_id): PathId,
) -> ApiResult<Vec<UserSummaryResponse>> {
    let users = state.user_service().mutual_friends(ctx.user_id, user_id).await?;
    Ok(ApiResponse::success(users.into_iter().map(Into::into).collect()))
}

/// Friends-of-friends ranked by mutual friend count
pub async fn suggestions(
    State(state): State<AppState>,
    ctx: AuthContext,
    ValidatedQuery(query): ValidatedQuery<SuggestionQuery>,
) -> ApiResult<Vec<SuggestionResponse>> {
    let limit = query.page_size(state.settings.pagination.limits());
    let ranked = state.user_service().suggestions(ctx.user_id, limit).await?;

    Ok(ApiResponse::success(
        ranked
            .into_iter()
            .map(|(user, suggestion)| SuggestionResponse::new(user, suggestion))
            .collect(),
    ))
}

pub async fn saved(
    State(state): State<AppState>,
    ctx: AuthContext,
    ValidatedQuery(query): ValidatedQuery<PageQuery>,
) -> ApiResult<Vec<PostResponse>> {
    let page = state.page(query.cursor.as_deref(), query.limit)?;
    let viewer = Some(ctx.user_id);

    let posts = state.engagement_service().saved(ctx.user_id, page).await?;
    Ok(ApiResponse::page(posts.map(|p| PostResponse::from_view(p, viewer))))
}

pub async fn follow(
    State(state): State<AppState>,
    ctx: AuthContext,
    PathId(user_id): PathId,
) -> ApiResult<Value> {
    state.user_service().follow(ctx.user_id, user_id).await?;
    Ok(ApiResponse::created(json!({ "following": true })))
}

pub async fn unfollow(
    State(state): State<AppState>,
    ctx: AuthContext,
    PathId(user_id): PathId,
) -> ApiResult<Value> {
    state.user_service().unfollow(ctx.user_id, user_id).await?;
    Ok(ApiResponse::success(json!({ "following": false })))
}

pub async fn block(
    State(state): State<AppState>,
    ctx: AuthContext,
    PathId(user_id): PathId,
) -> ApiResult<Value> {
    state.user_service().block(ctx.user_id, user_id).await?;
    Ok(ApiResponse::created(json!({ "blocked": true })))
}

pub async fn unblock(
    State(state): State<AppState>,
    ctx: AuthContext,
    PathId(user_id): PathId,
) -> ApiResult<Value> {
    state.user_service().unblock(ctx.user_id, user_id).await?;
    Ok(ApiResponse::success(json!({ "blocked": false })))
}

/// Users the caller has blocked
pub async fn blocks(
    State(state): State<AppState>,
    ctx: AuthContext,
    ValidatedQuery(query): ValidatedQuery<PageQuery>,
) -> ApiResult<Vec<UserSummaryResponse>> {
    let page = state.page(query.cursor.as_deref(), query.limit)?;
    let users = state.user_service().blocks(ctx.user_id, page).await?;
    Ok(ApiResponse::page(users.map(Into::into)))
}
