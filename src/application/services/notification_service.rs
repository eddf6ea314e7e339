//! Notification Service

use std::sync::Arc;

use crate::domain::{Notification, NotificationRepository};
use crate::shared::error::AppError;
use crate::shared::pagination::{Page, PageRequest};

pub struct NotificationService {
    notifications: Arc<dyn NotificationRepository>,
}

impl NotificationService {
    pub fn new(notifications: Arc<dyn NotificationRepository>) -> Self {
        Self { notifications }
    }

    pub async fn list(
        &self,
        user_id: i64,
        unread_only: bool,
        page: PageRequest,
    ) -> Result<Page<Notification>, AppError> {
        let rows = self.notifications.list(user_id, unread_only, page).await?;
        Ok(Page::from_overfetch(rows, page.limit))
    }

    pub async fn unread_count(&self, user_id: i64) -> Result<i64, AppError> {
        self.notifications.unread_count(user_id).await
    }

    /// Marking an already-read notification succeeds.
    pub async fn mark_read(&self, user_id: i64, notification_id: i64) -> Result<(), AppError> {
        if !self.notifications.mark_read(notification_id, user_id).await? {
            return Err(AppError::not_found("Notification"));
        }
        Ok(())
    }

    pub async fn mark_all_read(&self, user_id: i64) -> Result<u64, AppError> {
        self.notifications.mark_all_read(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MockNotificationRepository;
    use mockall::predicate::eq;

    #[tokio::test]
    async fn foreign_notification_is_not_found() {
        let mut repo = MockNotificationRepository::new();
        repo.expect_mark_read()
            .with(eq(5), eq(1))
            .returning(|_, _| Ok(false));

        let err = NotificationService::new(Arc::new(repo))
            .mark_read(1, 5)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
