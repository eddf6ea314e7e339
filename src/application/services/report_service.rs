//! Report Service
//!
//! Moderation reports against posts, comments and users. Review happens
//! outside this server; reports are only recorded.

use std::sync::Arc;

use crate::domain::{
    CommentRepository, NewReport, PostRepository, Report, ReportRepository, ReportTarget,
    UserRepository,
};
use crate::shared::error::AppError;
use crate::shared::snowflake::SnowflakeGenerator;

/// Validated report input.
#[derive(Debug, Clone)]
pub struct ReportDraft {
    pub target_type: ReportTarget,
    pub target_id: i64,
    pub reason: String,
    pub details: Option<String>,
}

pub struct ReportService {
    users: Arc<dyn UserRepository>,
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
    reports: Arc<dyn ReportRepository>,
    id_generator: Arc<SnowflakeGenerator>,
}

impl ReportService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        posts: Arc<dyn PostRepository>,
        comments: Arc<dyn CommentRepository>,
        reports: Arc<dyn ReportRepository>,
        id_generator: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            users,
            posts,
            comments,
            reports,
            id_generator,
        }
    }

    /// One open report per reporter and target.
    pub async fn create(&self, reporter_id: i64, draft: ReportDraft) -> Result<Report, AppError> {
        let exists = match draft.target_type {
            ReportTarget::Post => self.posts.find_by_id(draft.target_id).await?.is_some(),
            ReportTarget::Comment => self.comments.find_by_id(draft.target_id).await?.is_some(),
            ReportTarget::User => {
                if draft.target_id == reporter_id {
                    return Err(AppError::BadRequest("You cannot report yourself".into()));
                }
                self.users.find_by_id(draft.target_id).await?.is_some()
            }
        };
        if !exists {
            return Err(AppError::not_found(match draft.target_type {
                ReportTarget::Post => "Post",
                ReportTarget::Comment => "Comment",
                ReportTarget::User => "User",
            }));
        }

        let report = self
            .reports
            .create(&NewReport {
                id: self.id_generator.generate(),
                reporter_id,
                target_type: draft.target_type,
                target_id: draft.target_id,
                reason: draft.reason.trim().to_string(),
                details: draft.details.filter(|d| !d.trim().is_empty()),
            })
            .await?
            .ok_or_else(|| AppError::already_exists("You have already reported this"))?;

        tracing::info!(
            report_id = report.id,
            target_type = report.target_type.as_str(),
            target_id = report.target_id,
            "Report filed"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        MockCommentRepository, MockPostRepository, MockReportRepository, MockUserRepository,
        Visibility,
    };
    use crate::test_support::post_view;

    fn draft(target_type: ReportTarget, target_id: i64) -> ReportDraft {
        ReportDraft {
            target_type,
            target_id,
            reason: "spam".into(),
            details: None,
        }
    }

    fn service(posts: MockPostRepository, reports: MockReportRepository) -> ReportService {
        ReportService::new(
            Arc::new(MockUserRepository::new()),
            Arc::new(posts),
            Arc::new(MockCommentRepository::new()),
            Arc::new(reports),
            Arc::new(SnowflakeGenerator::default()),
        )
    }

    #[tokio::test]
    async fn duplicate_open_report_conflicts() {
        let mut posts = MockPostRepository::new();
        posts
            .expect_find_by_id()
            .returning(|id| Ok(Some(post_view(id, 3, Visibility::Public).post)));
        let mut reports = MockReportRepository::new();
        reports.expect_create().returning(|_| Ok(None));

        let err = service(posts, reports)
            .create(1, draft(ReportTarget::Post, 8))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn self_report_is_rejected() {
        let mut reports = MockReportRepository::new();
        reports.expect_create().never();

        let err = service(MockPostRepository::new(), reports)
            .create(1, draft(ReportTarget::User, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
