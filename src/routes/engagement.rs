use crate::{
    error::{AppError, Result},
    models::{
        engagement::{EngagementKind, EngagementStatus, ToggleResponse},
        post::Post,
        response::ApiResponse,
    },
    state::AppState,
    utils::middleware::AuthUser,
};
use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/posts/:post_id/toggle/:kind", post(toggle))
        .route("/posts/:post_id/status", get(status))
        .route("/posts/:post_id/members/:kind", get(members))
        .route("/posts/:post_id/reconcile", post(reconcile))
        .route("/posts/:post_id/comment-count", post(adjust_comment_count))
        .route("/likes", get(liked_posts))
        .route("/bookmarks", get(bookmarked_posts))
        .route("/reading-list", get(reading_list))
        .route(
            "/reading-list/:post_id",
            post(toggle_reading_list).delete(remove_from_reading_list),
        )
}

fn parse_kind(kind: &str) -> Result<EngagementKind> {
    kind.parse::<EngagementKind>().map_err(AppError::BadRequest)
}

/// 切换点赞/收藏
/// POST /api/inkwell/engagement/posts/:post_id/toggle/:kind
async fn toggle(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path((post_id, kind)): Path<(String, String)>,
) -> Result<Json<ApiResponse<ToggleResponse>>> {
    let kind = parse_kind(&kind)?;
    let active = state
        .engagement_service
        .toggle(kind, &post_id, &identity.user_id)
        .await?;

    Ok(Json(ApiResponse::success(ToggleResponse {
        kind,
        post_id,
        active,
    })))
}

/// 当前用户对文章的互动状态
async fn status(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(post_id): Path<String>,
) -> Result<Json<ApiResponse<EngagementStatus>>> {
    let user_id = identity.user_id.as_str();
    let engagement = &state.engagement_service;

    let status = EngagementStatus {
        liked: engagement.has_membership(EngagementKind::Like, &post_id, user_id).await?,
        bookmarked: engagement
            .has_membership(EngagementKind::Bookmark, &post_id, user_id)
            .await?,
        in_reading_list: state.reading_list_service.contains(user_id, &post_id).await?,
    };
    Ok(Json(ApiResponse::success(status)))
}

async fn members(
    State(state): State<Arc<AppState>>,
    Path((post_id, kind)): Path<(String, String)>,
) -> Result<Json<Value>> {
    let kind = parse_kind(&kind)?;
    let user_ids = state.engagement_service.members(kind, &post_id).await?;
    Ok(Json(json!({
        "success": true,
        "data": { "count": user_ids.len(), "user_ids": user_ids }
    })))
}

/// 根据账本修复计数（仅作者）
async fn reconcile(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(post_id): Path<String>,
) -> Result<Json<ApiResponse<Post>>> {
    let post = state
        .post_service
        .get_post(&post_id)
        .await?
        .ok_or_else(|| AppError::not_found("Post"))?;
    if post.author_id != identity.user_id {
        return Err(AppError::forbidden("Only the author can reconcile counters"));
    }

    debug!("Reconciling counters for post {}", post_id);
    let post = state.engagement_service.reconcile_counters(&post_id).await?;
    Ok(Json(ApiResponse::success(post)))
}

#[derive(Debug, Deserialize)]
pub struct CommentCountRequest {
    pub delta: i64,
}

/// 评论创建/删除后调整评论计数，每次只能 ±1
/// POST /api/inkwell/engagement/posts/:post_id/comment-count
async fn adjust_comment_count(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(post_id): Path<String>,
    Json(request): Json<CommentCountRequest>,
) -> Result<Json<Value>> {
    if request.delta != 1 && request.delta != -1 {
        return Err(AppError::bad_request("delta must be 1 or -1"));
    }
    debug!(
        "User {} adjusting comment count of {} by {}",
        identity.user_id, post_id, request.delta
    );
    let comment_count = state
        .engagement_service
        .adjust_comment_count(&post_id, request.delta)
        .await?;
    Ok(Json(json!({
        "success": true,
        "data": { "post_id": post_id, "comment_count": comment_count }
    })))
}

async fn liked_posts(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
) -> Result<Json<ApiResponse<Vec<String>>>> {
    let post_ids = state
        .engagement_service
        .member_posts(EngagementKind::Like, &identity.user_id)
        .await?;
    Ok(Json(ApiResponse::list(post_ids)))
}

async fn bookmarked_posts(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
) -> Result<Json<ApiResponse<Vec<Post>>>> {
    let posts = state
        .engagement_service
        .bookmarked_posts(&identity.user_id)
        .await?;
    Ok(Json(ApiResponse::list(posts)))
}

async fn reading_list(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
) -> Result<Json<ApiResponse<Vec<Post>>>> {
    let posts = state.reading_list_service.list(&identity.user_id).await?;
    Ok(Json(ApiResponse::list(posts)))
}

async fn toggle_reading_list(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(post_id): Path<String>,
) -> Result<Json<Value>> {
    let saved = state
        .reading_list_service
        .toggle(&identity.user_id, &post_id)
        .await?;
    Ok(Json(json!({
        "success": true,
        "data": { "post_id": post_id, "in_reading_list": saved }
    })))
}

async fn remove_from_reading_list(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(post_id): Path<String>,
) -> Result<Json<ApiResponse<()>>> {
    state
        .reading_list_service
        .remove(&identity.user_id, &post_id)
        .await?;
    Ok(Json(ApiResponse::ok("Removed from reading list")))
}
