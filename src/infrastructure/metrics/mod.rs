//! Prometheus Metrics Module
//!
//! # Metrics Collected
//! - HTTP request counts by method, route template, and status
//! - HTTP request latency histograms
//! - Rate limiter decisions by rule and outcome
//! - Uploaded bytes by upload kind

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};

const NAMESPACE: &str = "social_server";

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// HTTP request counter - tracks total requests by method, route, and status code
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests").namespace(NAMESPACE),
        &["method", "operation", "status"],
    )
    .expect("Failed to create HTTP_REQUESTS_TOTAL metric")
});

/// HTTP request latency histogram - tracks request duration in seconds
pub static HTTP_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    let buckets = vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];
    HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request latency in seconds",
        )
        .namespace(NAMESPACE)
        .buckets(buckets),
        &["method", "operation"],
    )
    .expect("Failed to create HTTP_REQUEST_DURATION_SECONDS metric")
});

/// Rate limiter decisions
pub static RATE_LIMIT_DECISIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("rate_limit_decisions_total", "Rate limiter decisions").namespace(NAMESPACE),
        &["rule", "outcome"], // "allowed", "rejected", "failed_open", "failed_closed"
    )
    .expect("Failed to create RATE_LIMIT_DECISIONS_TOTAL metric")
});

/// Bytes accepted by the upload endpoint
pub static UPLOAD_BYTES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("upload_bytes_total", "Bytes written to the object store").namespace(NAMESPACE),
        &["kind"],
    )
    .expect("Failed to create UPLOAD_BYTES_TOTAL metric")
});

/// Register all metrics with the registry
fn register_metrics(registry: &Registry) {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(HTTP_REQUESTS_TOTAL.clone()),
        Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()),
        Box::new(RATE_LIMIT_DECISIONS_TOTAL.clone()),
        Box::new(UPLOAD_BYTES_TOTAL.clone()),
    ];
    for collector in collectors {
        if let Err(e) = registry.register(collector) {
            tracing::warn!(error = %e, "Failed to register metric");
        }
    }
}

/// Collect and encode all metrics as Prometheus text format
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

/// Helper to record HTTP request metrics
pub fn record_http_request(method: &str, operation: &str, status: u16, duration_secs: f64) {
    let status = status.to_string();
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, operation, status.as_str()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, operation])
        .observe(duration_secs);
}

/// Helper to record a rate limiter decision
pub fn record_rate_limit(rule: &str, outcome: &str) {
    RATE_LIMIT_DECISIONS_TOTAL
        .with_label_values(&[rule, outcome])
        .inc();
}

/// Helper to record an accepted upload
pub fn record_upload(kind: &str, bytes: u64) {
    UPLOAD_BYTES_TOTAL.with_label_values(&[kind]).inc_by(bytes);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_http_request() {
        record_http_request("GET", "/api/v1/posts/{post_id}", 200, 0.001);
        let metrics = gather_metrics().unwrap();
        assert!(metrics.contains("social_server_http_requests_total"));
        assert!(metrics.contains("/api/v1/posts/{post_id}"));
    }

    #[test]
    fn test_record_rate_limit_and_upload() {
        record_rate_limit("post_create", "rejected");
        record_upload("avatar", 1024);
        let metrics = gather_metrics().unwrap();
        assert!(metrics.contains("rate_limit_decisions_total"));
        assert!(metrics.contains("upload_bytes_total"));
    }
}
