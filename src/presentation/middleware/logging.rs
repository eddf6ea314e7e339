//! Request Logging Middleware
//!
//! Assigns every request a trace id, runs it inside a span carrying the id,
//! method and matched route template, and records completion status and
//! latency in the log and in Prometheus.

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;

use crate::infrastructure::metrics::record_http_request;
use crate::shared::trace_id::TraceId;

pub async fn trace_requests(mut request: Request, next: Next) -> Response {
    let trace_id = TraceId::generate();
    let method = request.method().clone();
    let operation = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());

    request.extensions_mut().insert(trace_id.clone());

    let span = tracing::info_span!(
        "request",
        trace_id = %trace_id,
        method = %method,
        operation = %operation,
    );

    let start = Instant::now();
    let response = trace_id
        .scope(next.run(request))
        .instrument(span.clone())
        .await;
    let elapsed = start.elapsed();
    let status = response.status();

    span.in_scope(|| {
        let latency_ms = elapsed.as_millis() as u64;
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), latency_ms, "Request failed");
        } else if status.is_client_error() {
            tracing::info!(status = status.as_u16(), latency_ms, "Request rejected");
        } else {
            tracing::info!(status = status.as_u16(), latency_ms, "Request completed");
        }
    });

    record_http_request(method.as_str(), &operation, status.as_u16(), elapsed.as_secs_f64());

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, middleware, routing::get, Router};
    use tower::ServiceExt;

    #[tokio::test]
    async fn handler_sees_trace_id_in_extensions_and_task_local() {
        async fn handler(request: Request) -> StatusCode {
            let from_ext = request.extensions().get::<TraceId>().cloned();
            if from_ext.is_some() && from_ext == TraceId::current() {
                StatusCode::OK
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }

        let app = Router::new()
            .route("/probe", get(handler))
            .layer(middleware::from_fn(trace_requests));

        let response = app
            .oneshot(Request::builder().uri("/probe").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get("x-trace-id").is_none());
    }
}
