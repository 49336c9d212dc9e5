use super::{parse_timestamp, parse_uuid};
use crate::domain::entities::User;
use crate::domain::ports::user_repository::UserRepository;
use crate::infrastructure::http::middleware::error::ApiResult;
use crate::infrastructure::persistence::Database;
use async_trait::async_trait;
use chrono::SecondsFormat;
use sqlx::Row;
use uuid::Uuid;

#[async_trait]
impl UserRepository for Database {
    async fn create_user(&self, user: &User) -> ApiResult<()> {
        sqlx::query(
            "INSERT INTO users (id, name, email, created_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(user.id.to_string())
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.created_at.to_rfc3339_opts(SecondsFormat::Micros, true))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_user_by_id(&self, id: &Uuid) -> ApiResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, name, email, created_at
             FROM users
             WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let id: String = row.try_get("id")?;
        let created_at: String = row.try_get("created_at")?;

        Ok(Some(User {
            id: parse_uuid(&id)?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            created_at: parse_timestamp(&created_at)?,
        }))
    }
}
