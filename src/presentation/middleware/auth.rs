//! Authentication Extractors
//!
//! `AuthContext` requires a resolved caller and rejects with 401 before the
//! handler runs. `OptionalAuthContext` passes anonymous callers through.
//!
//! The session cookie is tried first, then `Authorization: Bearer`. The
//! resolved identity is cached in request extensions so middleware and the
//! handler share one lookup.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    RequestPartsExt,
};
use axum_extra::{
    extract::CookieJar,
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::domain::Identity;
use crate::shared::error::AppError;
use crate::shared::trace_id::TraceId;
use crate::startup::AppState;

/// An authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub identity: Identity,
    pub user_id: i64,
    pub trace_id: TraceId,
}

/// A caller that may be anonymous.
#[derive(Debug, Clone)]
pub struct OptionalAuthContext {
    pub identity: Identity,
    pub trace_id: TraceId,
}

impl OptionalAuthContext {
    pub fn user_id(&self) -> Option<i64> {
        self.identity.user_id()
    }
}

impl FromRequestParts<AppState> for AuthContext {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let identity = resolve_identity(parts, state).await?;
        let user_id = identity.user_id().ok_or_else(AppError::unauthorized)?;

        Ok(Self {
            identity,
            user_id,
            trace_id: request_trace_id(parts),
        })
    }
}

impl FromRequestParts<AppState> for OptionalAuthContext {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let identity = resolve_identity(parts, state).await?;

        Ok(Self {
            identity,
            trace_id: request_trace_id(parts),
        })
    }
}

/// Resolve the caller once per request.
pub async fn resolve_identity(parts: &mut Parts, state: &AppState) -> Result<Identity, AppError> {
    if let Some(identity) = parts.extensions.get::<Identity>() {
        return Ok(identity.clone());
    }

    let jar = CookieJar::from_headers(&parts.headers);
    let cookie = jar
        .get(&state.settings.session.cookie_name)
        .map(|c| c.value().to_string());

    let bearer = parts
        .extract::<TypedHeader<Authorization<Bearer>>>()
        .await
        .ok()
        .map(|TypedHeader(Authorization(bearer))| bearer.token().to_string());

    let identity = state
        .auth_service()
        .resolve(cookie.as_deref(), bearer.as_deref())
        .await?;

    parts.extensions.insert(identity.clone());
    Ok(identity)
}

/// Raw session token presented by the caller, cookie first.
pub fn presented_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(cookie_name)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
        .or_else(|| {
            headers
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(|t| t.trim().to_string())
        })
}

fn request_trace_id(parts: &Parts) -> TraceId {
    parts
        .extensions
        .get::<TraceId>()
        .cloned()
        .or_else(TraceId::current)
        .unwrap_or_else(TraceId::generate)
}
