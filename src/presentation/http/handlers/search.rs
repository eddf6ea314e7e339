//! Search Handlers

use axum::{
    extract::State,
    response::{IntoResponse, Response},
};

use crate::application::dto::request::SearchQuery;
use crate::application::dto::response::{PostResponse, UserSummaryResponse};
use crate::application::services::{SearchKind, SearchResults};
use crate::presentation::http::extractors::ValidatedQuery;
use crate::presentation::middleware::OptionalAuthContext;
use crate::shared::error::AppError;
use crate::shared::response::ApiResponse;
use crate::startup::AppState;

/// `?q=&type=users|posts`; a query starting with `#` searches hashtags
pub async fn search(
    State(state): State<AppState>,
    ctx: OptionalAuthContext,
    ValidatedQuery(query): ValidatedQuery<SearchQuery>,
) -> Result<Response, AppError> {
    let page = state.page(query.cursor.as_deref(), query.limit)?;
    let viewer = ctx.user_id();
    let kind = SearchKind::parse(query.kind.as_deref());

    let results = state
        .search_service()
        .search(&query.q, kind, viewer, page)
        .await?;

    Ok(match results {
        SearchResults::Users(users) => {
            ApiResponse::page(users.map(UserSummaryResponse::from)).into_response()
        }
        SearchResults::Posts(posts) => {
            ApiResponse::page(posts.map(|p| PostResponse::from_view(p, viewer))).into_response()
        }
    })
}
