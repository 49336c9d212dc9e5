use crate::{
    domain::entities::Notification,
    infrastructure::http::middleware::{ApiError, ApiResult, AppState, AuthenticatedUser},
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct MarkAllReadResponse {
    pub message: String,
    pub count: i64,
}

// Ids that do not parse can't name a notification the caller owns
fn parse_notification_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound("Notification not found".to_string()))
}

/// GET /notifications - List the caller's notifications, most recent first
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> ApiResult<Json<Vec<Notification>>> {
    let notifications = state.notification_service.list(&user.user_id).await?;
    Ok(Json(notifications))
}

/// GET /notifications/unread-count
pub async fn get_unread_count(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> ApiResult<Json<UnreadCountResponse>> {
    let count = state.notification_service.unread_count(&user.user_id).await?;
    Ok(Json(UnreadCountResponse { count }))
}

/// POST /notifications/:id/mark-read
pub async fn mark_notification_as_read(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<SuccessResponse>> {
    let id = parse_notification_id(&id)?;
    state.notification_service.mark_read(&user.user_id, &id).await?;

    Ok(Json(SuccessResponse {
        message: "Notification marked as read".to_string(),
    }))
}

/// POST /notifications/mark-all-read
pub async fn mark_all_notifications_as_read(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> ApiResult<Json<MarkAllReadResponse>> {
    let count = state.notification_service.mark_all_read(&user.user_id).await?;

    Ok(Json(MarkAllReadResponse {
        message: "All notifications marked as read".to_string(),
        count,
    }))
}

/// DELETE /notifications/:id
pub async fn delete_notification(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<SuccessResponse>> {
    let id = parse_notification_id(&id)?;
    state.notification_service.delete(&user.user_id, &id).await?;

    Ok(Json(SuccessResponse {
        message: "Notification deleted".to_string(),
    }))
}
