use crate::application::services::NotificationService;
use crate::domain::ports::token_verifier::TokenVerifier;
use crate::infrastructure::http::middleware::error::ApiError;
use crate::infrastructure::realtime::NotificationHub;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub notification_service: NotificationService,
    pub hub: NotificationHub,
    pub token_verifier: Arc<dyn TokenVerifier>,
}

/// Identity resolved from the bearer token, available to handlers as an extension
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
}

/// Extract and validate the bearer token from the Authorization header
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(ApiError::Unauthorized)?;

    let user_id = state.token_verifier.verify(token).await.map_err(|e| {
        tracing::debug!(reason = %e, "Rejected bearer token");
        ApiError::from(e)
    })?;

    request
        .extensions_mut()
        .insert(AuthenticatedUser { user_id });

    Ok(next.run(request).await)
}
