//! Health Check Handlers
//!
//! Liveness and readiness probes plus the Prometheus scrape endpoint.
//!
//! # Endpoints
//! - `GET /health` - Basic health check
//! - `GET /health/live` - Liveness probe (is the process running?)
//! - `GET /health/ready` - Readiness probe (are Postgres and Redis reachable?)
//! - `GET /metrics` - Prometheus text format

use std::time::Instant;

use axum::{
    extract::State,
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::domain::ports::DependencyProbe;
use crate::infrastructure::metrics::gather_metrics;
use crate::shared::error::AppError;
use crate::shared::response::{ApiResponse, ApiResult};
use crate::startup::AppState;

/// Server start time for uptime calculation
static SERVER_START: Lazy<Instant> = Lazy::new(Instant::now);
static SERVER_START_TIME: Lazy<DateTime<Utc>> = Lazy::new(Utc::now);

/// Pin the start time (call during startup)
pub fn init_server_start() {
    Lazy::force(&SERVER_START);
    Lazy::force(&SERVER_START_TIME);
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessResponse {
    pub status: HealthStatus,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub started_at: String,
    pub checks: Vec<DependencyHealth>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyHealth {
    pub name: &'static str,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

pub async fn health_check() -> ApiResult<HealthResponse> {
    Ok(ApiResponse::success(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn liveness() -> ApiResult<HealthResponse> {
    Ok(ApiResponse::success(HealthResponse {
        status: "alive",
        version: env!("CARGO_PKG_VERSION"),
    }))
}

/// 200 when every dependency answers, 503 otherwise
pub async fn readiness(State(state): State<AppState>) -> ApiResult<ReadinessResponse> {
    let checks = join_all(state.probes.iter().map(|probe| check(probe.as_ref()))).await;
    let status = overall_status(&checks);

    let response = ReadinessResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: SERVER_START.elapsed().as_secs(),
        started_at: SERVER_START_TIME.to_rfc3339(),
        checks,
    };

    let code = match status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };
    Ok(ApiResponse::success(response).with_status(code))
}

pub async fn metrics() -> Result<Response, AppError> {
    let body = gather_metrics().map_err(|e| AppError::server_error(format!("Metrics encoding failed: {}", e)))?;
    Ok(([(CONTENT_TYPE, "text/plain; version=0.0.4")], body).into_response())
}

async fn check(probe: &dyn DependencyProbe) -> DependencyHealth {
    let start = Instant::now();
    match probe.check().await {
        Ok(()) => DependencyHealth {
            name: probe.name(),
            status: HealthStatus::Healthy,
            latency_ms: Some(start.elapsed().as_millis() as u64),
        },
        Err(e) => {
            tracing::warn!(dependency = probe.name(), error = %e, "Readiness check failed");
            DependencyHealth {
                name: probe.name(),
                status: HealthStatus::Unhealthy,
                latency_ms: None,
            }
        }
    }
}

fn overall_status(checks: &[DependencyHealth]) -> HealthStatus {
    if checks.iter().all(|c| c.status == HealthStatus::Healthy) {
        HealthStatus::Healthy
    } else {
        HealthStatus::Unhealthy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::MockDependencyProbe;
    use pretty_assertions::assert_eq;

    fn probe(name: &'static str, healthy: bool) -> MockDependencyProbe {
        let mut probe = MockDependencyProbe::new();
        probe.expect_name().return_const(name);
        probe
            .expect_check()
            .returning(move || if healthy { Ok(()) } else { Err("connection refused".into()) });
        probe
    }

    #[tokio::test]
    async fn failing_probe_reports_unhealthy_without_latency() {
        let result = check(&probe("redis", false)).await;

        assert_eq!(result.status, HealthStatus::Unhealthy);
        assert_eq!(result.name, "redis");
        assert!(result.latency_ms.is_none());
    }

    #[tokio::test]
    async fn one_unhealthy_dependency_fails_readiness() {
        let checks = vec![
            check(&probe("postgres", true)).await,
            check(&probe("redis", false)).await,
        ];
        assert_eq!(overall_status(&checks), HealthStatus::Unhealthy);
        assert_eq!(overall_status(&checks[..1]), HealthStatus::Healthy);
    }
}
