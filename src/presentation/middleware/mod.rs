//! Middleware
//!
//! Request extractors and tower middleware for request processing.

pub mod auth;
pub mod cors;
pub mod logging;
pub mod rate_limit;
pub mod security;

pub use auth::{AuthContext, OptionalAuthContext};
pub use logging::trace_requests;
pub use rate_limit::{
    rate_limit_post_create, rate_limit_report, rate_limit_upload, rate_limit_verification,
    RateDecision, RateLimitInfo, RateLimiter, RateRule,
};
pub use security::{create_security_headers_layer, SecurityHeadersConfig, SecurityHeadersLayer};
