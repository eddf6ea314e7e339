//! Rate Limiting Middleware
//!
//! Fixed-window counters keyed by `"ratelimit:<rule>:<userId>"`, applied to selected
//! routes only. A request is allowed while the count after increment stays
//! within the rule's limit.
//!
//! When the counter store is unreachable the request is let through if
//! `rate_limit.fail_open` is set (the default) and rejected with
//! `INTERNAL_ERROR` otherwise. Either way the failure is logged.
//!
//! Anonymous requests are not counted; the route's `AuthContext` rejects them.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::domain::ports::RateLimitStore;
use crate::infrastructure::cache::keys;
use crate::infrastructure::metrics::record_rate_limit;
use crate::presentation::middleware::auth::resolve_identity;
use crate::shared::error::AppError;
use crate::startup::AppState;

// ============================================================================
// Rules
// ============================================================================

/// Limit and window of one rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub limit: u64,
    pub window: Duration,
}

/// Operations that carry a per-user quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateRule {
    /// One verification email per 5 minutes
    VerificationResend,
    /// 30 posts per minute
    PostCreate,
    /// 10 reports per hour
    Report,
    /// 60 uploads per hour
    Upload,
}

impl RateRule {
    pub fn config(&self) -> RateLimitConfig {
        match self {
            RateRule::VerificationResend => RateLimitConfig {
                limit: 1,
                window: Duration::from_secs(300),
            },
            RateRule::PostCreate => RateLimitConfig {
                limit: 30,
                window: Duration::from_secs(60),
            },
            RateRule::Report => RateLimitConfig {
                limit: 10,
                window: Duration::from_secs(3600),
            },
            RateRule::Upload => RateLimitConfig {
                limit: 60,
                window: Duration::from_secs(3600),
            },
        }
    }

    /// Metric label and counter key segment.
    pub fn as_str(&self) -> &'static str {
        match self {
            RateRule::VerificationResend => "verification_resend",
            RateRule::PostCreate => "post_create",
            RateRule::Report => "report",
            RateRule::Upload => "upload",
        }
    }
}

// ============================================================================
// Limiter
// ============================================================================

/// Window state reported to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitInfo {
    pub limit: u64,
    pub remaining: u64,
    /// Seconds until the window resets
    pub reset_after: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed(RateLimitInfo),
    Limited(RateLimitInfo),
    /// The store failed and the limiter is fail-open.
    Unchecked,
}

#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    fail_open: bool,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn RateLimitStore>, fail_open: bool) -> Self {
        Self { store, fail_open }
    }

    /// Count one request by `user_id` against `rule`.
    pub async fn check(&self, rule: RateRule, user_id: i64) -> Result<RateDecision, AppError> {
        let config = rule.config();
        let key = keys::rate_limit(rule.as_str(), user_id);

        let hit = match self.store.hit(&key, config.window).await {
            Ok(hit) => hit,
            Err(e) if self.fail_open => {
                tracing::warn!(rule = rule.as_str(), error = %e, "Rate limit store unavailable, allowing request");
                record_rate_limit(rule.as_str(), "failed_open");
                return Ok(RateDecision::Unchecked);
            }
            Err(e) => {
                tracing::error!(rule = rule.as_str(), error = %e, "Rate limit store unavailable, rejecting request");
                record_rate_limit(rule.as_str(), "failed_closed");
                return Err(AppError::server_error(format!("Rate limit store unavailable: {}", e)));
            }
        };

        let info = RateLimitInfo {
            limit: config.limit,
            remaining: config.limit.saturating_sub(hit.count),
            reset_after: ceil_secs(hit.resets_in),
        };

        if hit.count <= config.limit {
            record_rate_limit(rule.as_str(), "allowed");
            Ok(RateDecision::Allowed(info))
        } else {
            record_rate_limit(rule.as_str(), "rejected");
            Ok(RateDecision::Limited(info))
        }
    }
}

fn ceil_secs(d: Duration) -> u64 {
    let secs = d.as_secs() + u64::from(d.subsec_nanos() > 0);
    secs.max(1)
}

// ============================================================================
// Middleware Functions
// ============================================================================

pub async fn rate_limit_verification(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    rate_limit_inner(state, request, next, RateRule::VerificationResend).await
}

pub async fn rate_limit_post_create(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    rate_limit_inner(state, request, next, RateRule::PostCreate).await
}

pub async fn rate_limit_report(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    rate_limit_inner(state, request, next, RateRule::Report).await
}

pub async fn rate_limit_upload(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    rate_limit_inner(state, request, next, RateRule::Upload).await
}

async fn rate_limit_inner(state: AppState, request: Request, next: Next, rule: RateRule) -> Response {
    let (mut parts, body) = request.into_parts();
    let identity = match resolve_identity(&mut parts, &state).await {
        Ok(identity) => identity,
        Err(e) => return e.into_response(),
    };
    let request = Request::from_parts(parts, body);

    let Some(user_id) = identity.user_id() else {
        return next.run(request).await;
    };

    match state.rate_limiter().check(rule, user_id).await {
        Ok(RateDecision::Allowed(info)) => {
            let mut response = next.run(request).await;
            add_rate_limit_headers(response.headers_mut(), &info);
            response
        }
        Ok(RateDecision::Unchecked) => next.run(request).await,
        Ok(RateDecision::Limited(info)) => {
            tracing::warn!(user_id, rule = rule.as_str(), "Rate limit exceeded");
            let mut response = AppError::rate_limit_error(info.reset_after).into_response();
            add_rate_limit_headers(response.headers_mut(), &info);
            response
        }
        Err(e) => e.into_response(),
    }
}

fn add_rate_limit_headers(headers: &mut HeaderMap, info: &RateLimitInfo) {
    for (name, value) in [
        ("x-ratelimit-limit", info.limit),
        ("x-ratelimit-remaining", info.remaining),
        ("x-ratelimit-reset", info.reset_after),
    ] {
        if let Ok(v) = HeaderValue::from_str(&value.to_string()) {
            headers.insert(header::HeaderName::from_static(name), v);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{MockRateLimitStore, WindowHit};
    use crate::infrastructure::cache::MemoryRateLimitStore;
    use test_case::test_case;

    fn failing_store() -> Arc<dyn RateLimitStore> {
        let mut store = MockRateLimitStore::new();
        store
            .expect_hit()
            .returning(|_, _| Err(AppError::server_error("connection refused")));
        Arc::new(store)
    }

    #[test_case(RateRule::VerificationResend, 1, 300)]
    #[test_case(RateRule::PostCreate, 30, 60)]
    #[test_case(RateRule::Report, 10, 3600)]
    #[test_case(RateRule::Upload, 60, 3600)]
    fn test_rule_config(rule: RateRule, limit: u64, window_secs: u64) {
        let config = rule.config();
        assert_eq!(config.limit, limit);
        assert_eq!(config.window, Duration::from_secs(window_secs));
    }

    #[tokio::test]
    async fn test_request_over_limit_is_limited() {
        let limiter = RateLimiter::new(Arc::new(MemoryRateLimitStore::new()), true);

        let first = limiter.check(RateRule::VerificationResend, 7).await.unwrap();
        let second = limiter.check(RateRule::VerificationResend, 7).await.unwrap();
        let other_user = limiter.check(RateRule::VerificationResend, 8).await.unwrap();

        assert!(matches!(first, RateDecision::Allowed(info) if info.remaining == 0));
        assert!(matches!(second, RateDecision::Limited(info) if info.reset_after > 0));
        assert!(matches!(other_user, RateDecision::Allowed(_)));
    }

    #[tokio::test]
    async fn test_key_is_prefix_and_user() {
        let mut store = MockRateLimitStore::new();
        store
            .expect_hit()
            .withf(|key, window| key == "ratelimit:report:42" && *window == Duration::from_secs(3600))
            .returning(|_, _| {
                Ok(WindowHit {
                    count: 10,
                    resets_in: Duration::from_millis(1500),
                })
            });
        let limiter = RateLimiter::new(Arc::new(store), true);

        let decision = limiter.check(RateRule::Report, 42).await.unwrap();
        assert_eq!(
            decision,
            RateDecision::Allowed(RateLimitInfo {
                limit: 10,
                remaining: 0,
                reset_after: 2,
            })
        );
    }

    #[tokio::test]
    async fn test_store_failure_fails_open() {
        let limiter = RateLimiter::new(failing_store(), true);
        let decision = limiter.check(RateRule::Upload, 1).await.unwrap();
        assert_eq!(decision, RateDecision::Unchecked);
    }

    #[tokio::test]
    async fn test_store_failure_can_fail_closed() {
        let limiter = RateLimiter::new(failing_store(), false);
        let err = limiter.check(RateRule::Upload, 1).await.unwrap_err();
        assert!(err.is_internal());
    }
}
