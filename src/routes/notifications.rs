use crate::{
    error::Result,
    models::{notification::Notification, response::ApiResponse},
    routes::LimitQuery,
    state::AppState,
    utils::middleware::AuthUser,
};
use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{delete, get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_notifications))
        .route("/unread-count", get(unread_count))
        .route("/read-all", post(mark_all_as_read))
        .route("/:notification_id/read", post(mark_as_read))
        .route("/:notification_id", delete(delete_notification))
}

async fn list_notifications(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Query(query): Query<LimitQuery>,
) -> Result<Json<ApiResponse<Vec<Notification>>>> {
    let limit = state.page_limit(query.limit);
    let notifications = state
        .notification_service
        .list_for_user(&identity.user_id, limit)
        .await?;
    Ok(Json(ApiResponse::list(notifications)))
}

async fn unread_count(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
) -> Result<Json<Value>> {
    let count = state
        .notification_service
        .unread_count(&identity.user_id)
        .await?;
    Ok(Json(json!({
        "success": true,
        "data": { "unread_count": count }
    })))
}

async fn mark_as_read(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(notification_id): Path<String>,
) -> Result<Json<ApiResponse<()>>> {
    state
        .notification_service
        .mark_as_read(&notification_id, &identity.user_id)
        .await?;
    Ok(Json(ApiResponse::ok("Notification marked as read")))
}

async fn mark_all_as_read(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
) -> Result<Json<Value>> {
    let updated = state
        .notification_service
        .mark_all_as_read(&identity.user_id)
        .await?;
    Ok(Json(json!({
        "success": true,
        "data": { "updated": updated }
    })))
}

async fn delete_notification(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(notification_id): Path<String>,
) -> Result<Json<ApiResponse<()>>> {
    state
        .notification_service
        .delete_notification(&notification_id, &identity.user_id)
        .await?;
    Ok(Json(ApiResponse::ok("Notification deleted")))
}
