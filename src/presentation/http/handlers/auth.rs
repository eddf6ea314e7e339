//! Authentication Handlers
//!
//! Register and login issue an opaque session: the token is returned in
//! the body for non-browser clients and set as an HttpOnly cookie.

use axum::{
    extract::State,
    http::{header::USER_AGENT, HeaderMap},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde_json::{json, Value};

use crate::application::dto::request::{ConfirmVerificationRequest, LoginRequest, RegisterRequest};
use crate::application::dto::response::AuthResponse;
use crate::config::SessionSettings;
use crate::presentation::http::extractors::ValidatedJson;
use crate::presentation::middleware::auth::presented_token;
use crate::presentation::middleware::AuthContext;
use crate::shared::error::AppError;
use crate::shared::response::{ApiResponse, ApiResult};
use crate::startup::AppState;

fn session_cookie(settings: &SessionSettings, token: String) -> Cookie<'static> {
    Cookie::build((settings.cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .secure(settings.secure_cookie)
        .same_site(SameSite::Lax)
        .build()
}

fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|ua| ua.chars().take(255).collect())
}

/// Register a new user
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    ValidatedJson(body): ValidatedJson<RegisterRequest>,
) -> Result<(CookieJar, ApiResponse<AuthResponse>), AppError> {
    let issued = state.auth_service().register(body, user_agent(&headers)).await?;

    let jar = jar.add(session_cookie(&state.settings.session, issued.token.clone()));
    Ok((jar, ApiResponse::created(issued.into())))
}

/// Login with credentials
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    ValidatedJson(body): ValidatedJson<LoginRequest>,
) -> Result<(CookieJar, ApiResponse<AuthResponse>), AppError> {
    let issued = state.auth_service().login(body, user_agent(&headers)).await?;

    let jar = jar.add(session_cookie(&state.settings.session, issued.token.clone()));
    Ok((jar, ApiResponse::success(issued.into())))
}

/// Delete the presented session and clear the cookie
pub async fn logout(
    State(state): State<AppState>,
    ctx: AuthContext,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<(CookieJar, ApiResponse<Value>), AppError> {
    let cookie_name = state.settings.session.cookie_name.clone();
    if let Some(token) = presented_token(&headers, &cookie_name) {
        state.auth_service().logout(&token).await?;
    }

    tracing::info!(user_id = ctx.user_id, trace_id = %ctx.trace_id, "User logged out");

    let jar = jar.remove(Cookie::build(cookie_name).path("/"));
    Ok((jar, ApiResponse::success(json!({ "loggedOut": true }))))
}

/// Issue a new verification token
pub async fn resend_verification(State(state): State<AppState>, ctx: AuthContext) -> ApiResult<Value> {
    state.auth_service().resend_verification(ctx.user_id).await?;
    Ok(ApiResponse::success(json!({ "sent": true })))
}

/// Consume a verification token
pub async fn confirm_verification(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<ConfirmVerificationRequest>,
) -> ApiResult<Value> {
    state.auth_service().confirm_verification(&body.token).await?;
    Ok(ApiResponse::success(json!({ "verified": true })))
}
