use crate::domain::errors::AuthError;
use uuid::Uuid;

/// Resolves a bearer token to the user it was issued for.
#[async_trait::async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Uuid, AuthError>;
}
