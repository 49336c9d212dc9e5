use crate::domain::entities::User;
use crate::infrastructure::http::middleware::error::ApiResult;
use uuid::Uuid;

#[async_trait::async_trait]
pub trait UserRepository: Send + Sync {
    async fn create_user(&self, user: &User) -> ApiResult<()>;
    async fn get_user_by_id(&self, id: &Uuid) -> ApiResult<Option<User>>;
}
