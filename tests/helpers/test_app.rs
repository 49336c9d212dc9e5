use super::test_db::{setup_test_db, teardown_test_db, TestDatabase};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::net::SocketAddr;
use std::time::Duration;
use taskhub::{
    bootstrap::build_app_state,
    config::Config,
    domain::entities::{NewNotification, Notification, NotificationTarget, NotificationType, User},
    domain::ports::user_repository::UserRepository,
    infrastructure::{
        auth::issue_token, http::middleware::AppState, http::router::build_router,
    },
};
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_SECRET: &str = "test-secret";
pub const TEST_FRONTEND_URL: &str = "http://localhost:3000";

pub struct TestApp {
    pub test_db: TestDatabase,
    pub config: Config,
    pub state: AppState,
    pub router: Router,
}

impl TestApp {
    pub async fn new() -> Self {
        let test_db = setup_test_db().await;
        let config = Config::from_lookup(|key| match key {
            "JWT_SECRET" => Some(TEST_SECRET.to_string()),
            "FRONTEND_URL" => Some(TEST_FRONTEND_URL.to_string()),
            _ => None,
        })
        .expect("Failed to build test config");

        let state = build_app_state(test_db.db().clone(), &config);
        let router = build_router(state.clone(), &config.frontend_url);

        Self {
            test_db,
            config,
            state,
            router,
        }
    }

    pub async fn create_user(&self, name: &str) -> Uuid {
        let user = User::new(name, format!("{}-{}@example.com", name, Uuid::new_v4()));
        self.test_db
            .db()
            .create_user(&user)
            .await
            .expect("Failed to create test user");
        user.id
    }

    pub fn token_for(&self, user_id: &Uuid) -> String {
        issue_token(
            TEST_SECRET.as_bytes(),
            self.config.jwt_algorithm,
            user_id,
            chrono::Duration::hours(1),
        )
        .expect("Failed to issue test token")
    }

    /// Create a notification the way a mutation handler would
    pub async fn notify(&self, user_id: Uuid, message: &str) -> Notification {
        self.state
            .notification_service
            .notify(NewNotification::new(
                user_id,
                NotificationType::TaskAssigned,
                message,
                NotificationTarget::None,
            ))
            .await
            .expect("Failed to create notification")
    }

    pub async fn request(&self, method: Method, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = builder.body(Body::empty()).unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, body)
    }

    /// Serve the router on an ephemeral port for WebSocket clients
    pub async fn spawn_server(&self) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = self.router.clone();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    /// Poll until the user has exactly `expected` open connections
    pub async fn wait_for_connections(&self, user_id: &Uuid, expected: usize) {
        let registry = self.state.hub.registry();
        tokio::time::timeout(Duration::from_secs(5), async {
            while registry.connections_for(user_id).await.len() != expected {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("user never reached {} open connections", expected));
    }

    pub async fn teardown(self) {
        self.state.hub.shutdown().await;
        teardown_test_db(self.test_db).await;
    }
}
