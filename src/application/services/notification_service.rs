use crate::domain::entities::{NewNotification, Notification};
use crate::domain::ports::notification_repository::NotificationRepository;
use crate::infrastructure::http::middleware::error::{ApiError, ApiResult};
use crate::infrastructure::realtime::{DeliveryReport, NotificationHub};
use std::sync::Arc;
use uuid::Uuid;

/// Notification operations for the REST layer and for mutation handlers
/// elsewhere in the system.
#[derive(Clone)]
pub struct NotificationService {
    repo: Arc<dyn NotificationRepository>,
    hub: NotificationHub,
    frontend_url: String,
}

impl NotificationService {
    pub fn new(
        repo: Arc<dyn NotificationRepository>,
        hub: NotificationHub,
        frontend_url: impl Into<String>,
    ) -> Self {
        Self {
            repo,
            hub,
            frontend_url: frontend_url.into(),
        }
    }

    pub fn hub(&self) -> &NotificationHub {
        &self.hub
    }

    /// Persist a notification, then push it to the user's open connections.
    ///
    /// The two steps are independent: a store failure fails the call, a push
    /// failure never does. A crash in between leaves a stored but undelivered
    /// record, which the client picks up on its next list call.
    pub async fn notify(&self, request: NewNotification) -> ApiResult<Notification> {
        request.validate()?;

        let notification = request.into_record(&self.frontend_url);
        self.repo.create_notification(&notification).await?;

        let report = self.push(&notification).await;
        tracing::debug!(
            user_id = %notification.user_id,
            notification_id = %notification.id,
            delivered = report.delivered,
            evicted = report.evicted,
            "Notification created"
        );

        Ok(notification)
    }

    /// `notify` for several recipients, e.g. every member of a project.
    ///
    /// The batch is stored in one transaction before anything is pushed, so a
    /// failed call leaves no recipient notified.
    pub async fn notify_all(&self, requests: Vec<NewNotification>) -> ApiResult<Vec<Notification>> {
        for request in &requests {
            request.validate()?;
        }

        let created: Vec<Notification> = requests
            .into_iter()
            .map(|request| request.into_record(&self.frontend_url))
            .collect();
        if created.is_empty() {
            return Ok(created);
        }
        self.repo.create_notifications(&created).await?;

        for notification in &created {
            self.push(notification).await;
        }
        tracing::debug!(count = created.len(), "Notifications created");

        Ok(created)
    }

    /// Push an already stored record live
    pub async fn push(&self, notification: &Notification) -> DeliveryReport {
        self.hub.publish(&notification.user_id, notification).await
    }

    pub async fn list(&self, user_id: &Uuid) -> ApiResult<Vec<Notification>> {
        self.repo.list_notifications(user_id).await
    }

    pub async fn mark_read(&self, user_id: &Uuid, notification_id: &Uuid) -> ApiResult<()> {
        if !self
            .repo
            .mark_notification_as_read(user_id, notification_id)
            .await?
        {
            return Err(ApiError::NotFound("Notification not found".to_string()));
        }
        Ok(())
    }

    pub async fn delete(&self, user_id: &Uuid, notification_id: &Uuid) -> ApiResult<()> {
        if !self.repo.delete_notification(user_id, notification_id).await? {
            return Err(ApiError::NotFound("Notification not found".to_string()));
        }
        Ok(())
    }

    pub async fn unread_count(&self, user_id: &Uuid) -> ApiResult<i64> {
        self.repo.get_unread_count(user_id).await
    }

    pub async fn mark_all_read(&self, user_id: &Uuid) -> ApiResult<i64> {
        self.repo.mark_all_notifications_as_read(user_id).await
    }
}
