use crate::application::services::NotificationService;
use crate::config::Config;
use crate::domain::ports::notification_repository::NotificationRepository;
use crate::domain::ports::token_verifier::TokenVerifier;
use crate::domain::ports::user_repository::UserRepository;
use crate::infrastructure::auth::JwtTokenVerifier;
use crate::infrastructure::http::middleware::AppState;
use crate::infrastructure::persistence::Database;
use crate::infrastructure::realtime::{InMemoryConnectionRegistry, NotificationHub};
use std::sync::Arc;

/// Wire the repositories, the token verifier and the notification hub
pub fn build_app_state(db: Database, config: &Config) -> AppState {
    let users: Arc<dyn UserRepository> = Arc::new(db.clone());
    let token_verifier: Arc<dyn TokenVerifier> = Arc::new(JwtTokenVerifier::new(
        config.jwt_secret.as_bytes(),
        config.jwt_algorithm,
        users,
    ));

    let hub = NotificationHub::new(
        Arc::new(InMemoryConnectionRegistry::new()),
        token_verifier.clone(),
    )
    .with_outbound_buffer(config.ws_outbound_buffer);
    tracing::info!(
        outbound_buffer = config.ws_outbound_buffer,
        "Notification hub initialized"
    );

    let notification_repo: Arc<dyn NotificationRepository> = Arc::new(db);
    let notification_service =
        NotificationService::new(notification_repo, hub.clone(), config.frontend_url.clone());

    AppState {
        notification_service,
        hub,
        token_verifier,
    }
}
