use crate::domain::entities::Notification;
use crate::infrastructure::http::middleware::error::ApiResult;
use uuid::Uuid;

/// Durable store for notification records. Every lookup is scoped by owner.
#[async_trait::async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create_notification(&self, notification: &Notification) -> ApiResult<()>;

    /// All-or-nothing insert of several records
    async fn create_notifications(&self, notifications: &[Notification]) -> ApiResult<()>;

    /// Notifications for a user, most recent first
    async fn list_notifications(&self, user_id: &Uuid) -> ApiResult<Vec<Notification>>;

    /// Returns false when no record with that id belongs to the user
    async fn mark_notification_as_read(&self, user_id: &Uuid, id: &Uuid) -> ApiResult<bool>;

    /// Returns false when no record with that id belongs to the user
    async fn delete_notification(&self, user_id: &Uuid, id: &Uuid) -> ApiResult<bool>;

    async fn get_unread_count(&self, user_id: &Uuid) -> ApiResult<i64>;

    async fn mark_all_notifications_as_read(&self, user_id: &Uuid) -> ApiResult<i64>;
}
