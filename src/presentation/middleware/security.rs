//! Security Headers Middleware
//!
//! Adds the response headers every API response carries: nosniff, frame
//! deny, referrer policy, a locked-down CSP and, when serving over HTTPS,
//! HSTS. Error envelopes, the 404 fallback and panic responses get them too
//! since the layer wraps the whole router.

use axum::{
    body::Body,
    http::{header, HeaderName, HeaderValue, Request, Response},
};
use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};
use tower::{Layer, Service};

use crate::config::Settings;

/// Security headers configuration
#[derive(Clone, Debug)]
pub struct SecurityHeadersConfig {
    /// Only meaningful behind HTTPS
    pub enable_hsts: bool,
    pub hsts_max_age: u64,
    pub content_security_policy: String,
    pub referrer_policy: String,
}

impl Default for SecurityHeadersConfig {
    fn default() -> Self {
        Self {
            enable_hsts: false,
            hsts_max_age: 31_536_000,
            content_security_policy: "default-src 'none'; frame-ancestors 'none'".to_string(),
            referrer_policy: "no-referrer".to_string(),
        }
    }
}

impl SecurityHeadersConfig {
    /// HSTS follows the secure-cookie flag: both mean "served over HTTPS".
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            enable_hsts: settings.session.secure_cookie,
            ..Default::default()
        }
    }

    fn header_values(&self) -> Vec<(HeaderName, HeaderValue)> {
        let mut values = vec![
            (header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
            (header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY")),
        ];
        if let Ok(v) = HeaderValue::from_str(&self.content_security_policy) {
            values.push((header::CONTENT_SECURITY_POLICY, v));
        }
        if let Ok(v) = HeaderValue::from_str(&self.referrer_policy) {
            values.push((header::REFERRER_POLICY, v));
        }
        if self.enable_hsts {
            if let Ok(v) = HeaderValue::from_str(&format!(
                "max-age={}; includeSubDomains",
                self.hsts_max_age
            )) {
                values.push((header::STRICT_TRANSPORT_SECURITY, v));
            }
        }
        values
    }
}

/// Layer that adds security headers to responses
#[derive(Clone)]
pub struct SecurityHeadersLayer {
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl SecurityHeadersLayer {
    pub fn new(config: &SecurityHeadersConfig) -> Self {
        Self {
            headers: config.header_values(),
        }
    }
}

impl<S> Layer<S> for SecurityHeadersLayer {
    type Service = SecurityHeadersMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SecurityHeadersMiddleware {
            inner,
            headers: self.headers.clone(),
        }
    }
}

/// Middleware service that adds security headers
#[derive(Clone)]
pub struct SecurityHeadersMiddleware<S> {
    inner: S,
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl<S> Service<Request<Body>> for SecurityHeadersMiddleware<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let headers = self.headers.clone();

        Box::pin(async move {
            let mut response = inner.call(request).await?;
            let response_headers = response.headers_mut();
            for (name, value) in headers {
                response_headers.insert(name, value);
            }
            Ok(response)
        })
    }
}

pub fn create_security_headers_layer(settings: &Settings) -> SecurityHeadersLayer {
    SecurityHeadersLayer::new(&SecurityHeadersConfig::from_settings(settings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::get, Router};
    use tower::ServiceExt;

    async fn test_handler() -> &'static str {
        "OK"
    }

    async fn headers_for(config: SecurityHeadersConfig) -> axum::http::HeaderMap {
        let app = Router::new()
            .route("/", get(test_handler))
            .layer(SecurityHeadersLayer::new(&config));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        response.headers().clone()
    }

    #[tokio::test]
    async fn test_security_headers_added() {
        let headers = headers_for(SecurityHeadersConfig::default()).await;

        assert_eq!(headers.get(header::X_CONTENT_TYPE_OPTIONS).unwrap(), "nosniff");
        assert_eq!(headers.get(header::X_FRAME_OPTIONS).unwrap(), "DENY");
        assert_eq!(headers.get(header::REFERRER_POLICY).unwrap(), "no-referrer");
        assert_eq!(
            headers.get(header::CONTENT_SECURITY_POLICY).unwrap(),
            "default-src 'none'; frame-ancestors 'none'"
        );
        assert!(headers.get(header::STRICT_TRANSPORT_SECURITY).is_none());
    }

    #[tokio::test]
    async fn test_hsts_when_enabled() {
        let headers = headers_for(SecurityHeadersConfig {
            enable_hsts: true,
            hsts_max_age: 86400,
            ..Default::default()
        })
        .await;

        assert_eq!(
            headers.get(header::STRICT_TRANSPORT_SECURITY).unwrap(),
            "max-age=86400; includeSubDomains"
        );
    }
}
