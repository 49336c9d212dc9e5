use crate::infrastructure::http::controllers::{notification_socket, notifications};
use crate::infrastructure::http::middleware::{require_auth, AppState};
use axum::{
    body::Body,
    http::{header, HeaderValue, Method, Request},
    middleware,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::Span;

pub fn build_router(state: AppState, frontend_url: &str) -> Router {
    // Bearer-token routes
    let protected = Router::new()
        .route("/notifications", get(notifications::list_notifications))
        .route("/notifications/", get(notifications::list_notifications))
        .route(
            "/notifications/unread-count",
            get(notifications::get_unread_count),
        )
        .route(
            "/notifications/mark-all-read",
            post(notifications::mark_all_notifications_as_read),
        )
        .route(
            "/notifications/:id/mark-read",
            post(notifications::mark_notification_as_read),
        )
        .route(
            "/notifications/:id",
            delete(notifications::delete_notification),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    // The socket authenticates itself from the query string
    let public = Router::new().route(
        "/notifications/ws",
        get(notification_socket::notification_socket),
    );

    Router::new()
        .route("/", get(root))
        .nest("/api-v1", protected.merge(public))
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(cors_layer(frontend_url))
        .with_state(state)
}

// Path only: the socket route carries the bearer token in its query string
fn request_span(request: &Request<Body>) -> Span {
    tracing::debug_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path()
    )
}

async fn root() -> Json<Value> {
    Json(json!({
        "status": 200,
        "message": "Hello World!"
    }))
}

fn cors_layer(frontend_url: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true);

    match HeaderValue::from_str(frontend_url.trim_end_matches('/')) {
        Ok(origin) => cors.allow_origin(origin),
        Err(_) => {
            tracing::warn!("FRONTEND_URL is not a valid origin, cross-origin requests disabled");
            cors
        }
    }
}
