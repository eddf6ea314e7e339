//! Report Handlers

use axum::extract::State;

use crate::application::dto::parse_id;
use crate::application::dto::request::CreateReportRequest;
use crate::application::dto::response::ReportResponse;
use crate::application::services::ReportDraft;
use crate::domain::ReportTarget;
use crate::presentation::http::extractors::ValidatedJson;
use crate::presentation::middleware::AuthContext;
use crate::shared::error::AppError;
use crate::shared::response::{ApiResponse, ApiResult};
use crate::startup::AppState;

/// File a moderation report against a post, comment or user
pub async fn create_report(
    State(state): State<AppState>,
    ctx: AuthContext,
    ValidatedJson(body): ValidatedJson<CreateReportRequest>,
) -> ApiResult<ReportResponse> {
    let target_type = ReportTarget::from_db(&body.target_type).ok_or_else(|| {
        AppError::invalid_field("targetType", "Target type must be post, comment or user")
    })?;
    let draft = ReportDraft {
        target_type,
        target_id: parse_id("targetId", &body.target_id)?,
        reason: body.reason,
        details: body.details,
    };

    let report = state.report_service().create(ctx.user_id, draft).await?;

    tracing::info!(
        report_id = report.id,
        reporter_id = ctx.user_id,
        target_type = target_type.as_str(),
        "Report filed"
    );

    Ok(ApiResponse::created(report.into()))
}
