use super::{parse_timestamp, parse_uuid};
use crate::domain::entities::{Notification, NotificationType};
use crate::domain::ports::notification_repository::NotificationRepository;
use crate::infrastructure::http::middleware::error::ApiResult;
use crate::infrastructure::persistence::Database;
use async_trait::async_trait;
use sqlx::{
    any::{AnyArguments, AnyRow},
    query::Query,
    Any, Row,
};
use uuid::Uuid;

fn notification_from_row(row: &AnyRow) -> ApiResult<Notification> {
    let id: String = row.try_get("id")?;
    let user_id: String = row.try_get("user_id")?;
    let notification_type: String = row.try_get("type")?;
    let is_read: i64 = row.try_get("is_read")?;
    let created_at: String = row.try_get("created_at")?;

    Ok(Notification {
        id: parse_uuid(&id)?,
        user_id: parse_uuid(&user_id)?,
        notification_type: NotificationType::from(notification_type),
        message: row.try_get("message")?,
        link: row.try_get("link").ok(),
        is_read: is_read != 0,
        created_at: parse_timestamp(&created_at)?,
    })
}

fn insert_notification(notification: &Notification) -> Query<'static, Any, AnyArguments<'static>> {
    sqlx::query(
        "INSERT INTO notifications (id, user_id, type, message, link, is_read, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(notification.id.to_string())
    .bind(notification.user_id.to_string())
    .bind(notification.notification_type.as_str())
    .bind(notification.message.clone())
    .bind(notification.link.clone())
    .bind(if notification.is_read { 1_i64 } else { 0_i64 })
    .bind(notification.created_at_rfc3339())
}

#[async_trait]
impl NotificationRepository for Database {
    async fn create_notification(&self, notification: &Notification) -> ApiResult<()> {
        insert_notification(notification)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn create_notifications(&self, notifications: &[Notification]) -> ApiResult<()> {
        let mut tx = self.pool.begin().await?;
        for notification in notifications {
            insert_notification(notification).execute(&mut *tx).await?;
        }
        tx.commit().await?;

        Ok(())
    }

    async fn list_notifications(&self, user_id: &Uuid) -> ApiResult<Vec<Notification>> {
        let rows = sqlx::query(
            "SELECT id, user_id, type, message, link, is_read, created_at
             FROM notifications
             WHERE user_id = ?
             ORDER BY created_at DESC, rowid DESC",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(notification_from_row).collect()
    }

    async fn mark_notification_as_read(&self, user_id: &Uuid, id: &Uuid) -> ApiResult<bool> {
        let result = sqlx::query(
            "UPDATE notifications
             SET is_read = 1
             WHERE id = ? AND user_id = ?",
        )
        .bind(id.to_string())
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_notification(&self, user_id: &Uuid, id: &Uuid) -> ApiResult<bool> {
        let result = sqlx::query(
            "DELETE FROM notifications
             WHERE id = ? AND user_id = ?",
        )
        .bind(id.to_string())
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_unread_count(&self, user_id: &Uuid) -> ApiResult<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) as count
             FROM notifications
             WHERE user_id = ? AND is_read = 0",
        )
        .bind(user_id.to_string())
        .fetch_one(&self.pool)
        .await?;

        let count: i64 = row.try_get("count")?;
        Ok(count)
    }

    async fn mark_all_notifications_as_read(&self, user_id: &Uuid) -> ApiResult<i64> {
        let result = sqlx::query(
            "UPDATE notifications
             SET is_read = 1
             WHERE user_id = ? AND is_read = 0",
        )
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() as i64)
    }
}
