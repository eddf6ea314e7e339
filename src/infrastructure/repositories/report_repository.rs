//! Report Repository Implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{NewReport, Report, ReportRepository, ReportTarget};
use crate::shared::error::AppError;

#[derive(Debug, sqlx::FromRow)]
struct ReportRow {
    id: i64,
    reporter_id: i64,
    target_type: String,
    target_id: i64,
    reason: String,
    details: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
}

impl ReportRow {
    fn into_report(self) -> Result<Report, AppError> {
        let target_type = ReportTarget::from_db(&self.target_type).ok_or_else(|| {
            AppError::server_error(format!("unknown report target {}", self.target_type))
        })?;

        Ok(Report {
            id: self.id,
            reporter_id: self.reporter_id,
            target_type,
            target_id: self.target_id,
            reason: self.reason,
            details: self.details,
            status: self.status,
            created_at: self.created_at,
        })
    }
}

#[derive(Clone)]
pub struct PgReportRepository {
    pool: PgPool,
}

impl PgReportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReportRepository for PgReportRepository {
    async fn create(&self, report: &NewReport) -> Result<Option<Report>, AppError> {
        // The partial unique index allows one open report per reporter and target.
        let row = sqlx::query_as::<_, ReportRow>(
            r#"
            INSERT INTO reports (id, reporter_id, target_type, target_id, reason, details)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT DO NOTHING
            RETURNING id, reporter_id, target_type, target_id, reason, details, status, created_at
            "#,
        )
        .bind(report.id)
        .bind(report.reporter_id)
        .bind(report.target_type.as_str())
        .bind(report.target_id)
        .bind(&report.reason)
        .bind(&report.details)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ReportRow::into_report).transpose()
    }
}
