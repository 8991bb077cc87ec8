use crate::{
    error::{AppError, Result},
    models::{post::*, response::ApiResponse},
    state::AppState,
    utils::middleware::{AuthUser, OptionalAuth},
};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
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
        .route("/", post(create_post))
        .route("/slug/:slug", get(get_post_by_slug))
        .route(
            "/:post_id",
            get(get_post).put(update_post).delete(delete_post),
        )
        .route("/:post_id/publish", post(publish_post))
        .route("/:post_id/unpublish", post(unpublish_post))
        .route("/:post_id/view", post(record_view))
        .route("/:post_id/image", post(upload_image))
}

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub filename: String,
}

/// 创建文章
/// POST /api/inkwell/posts
async fn create_post(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Json(request): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Post>>)> {
    let post = state
        .post_service
        .create_post(&identity.user_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(post))))
}

/// 草稿只对作者可见
fn visible_to(post: Post, viewer: Option<&str>) -> Result<Post> {
    if post.is_published() || viewer == Some(post.author_id.as_str()) {
        Ok(post)
    } else {
        Err(AppError::not_found("Post"))
    }
}

async fn get_post(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<String>,
    OptionalAuth(identity): OptionalAuth,
) -> Result<Json<ApiResponse<Post>>> {
    let post = state
        .post_service
        .get_post(&post_id)
        .await?
        .ok_or_else(|| AppError::not_found("Post"))?;
    let viewer = identity.as_ref().map(|i| i.user_id.as_str());
    Ok(Json(ApiResponse::success(visible_to(post, viewer)?)))
}

async fn get_post_by_slug(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    OptionalAuth(identity): OptionalAuth,
) -> Result<Json<ApiResponse<Post>>> {
    let post = state
        .post_service
        .get_post_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::not_found("Post"))?;
    let viewer = identity.as_ref().map(|i| i.user_id.as_str());
    Ok(Json(ApiResponse::success(visible_to(post, viewer)?)))
}

async fn update_post(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(post_id): Path<String>,
    Json(request): Json<UpdatePostRequest>,
) -> Result<Json<ApiResponse<Post>>> {
    let post = state
        .post_service
        .update_post(&post_id, &identity.user_id, request)
        .await?;
    Ok(Json(ApiResponse::success(post)))
}

/// 删除文章
/// DELETE /api/inkwell/posts/:post_id
async fn delete_post(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(post_id): Path<String>,
) -> Result<Json<ApiResponse<()>>> {
    state
        .post_service
        .delete_post(&post_id, &identity.user_id)
        .await?;
    Ok(Json(ApiResponse::ok("Post deleted")))
}

async fn publish_post(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(post_id): Path<String>,
) -> Result<Json<ApiResponse<Post>>> {
    let post = state
        .post_service
        .publish_post(&post_id, &identity.user_id)
        .await?;
    Ok(Json(ApiResponse::success(post)))
}

async fn unpublish_post(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(post_id): Path<String>,
) -> Result<Json<ApiResponse<Post>>> {
    let post = state
        .post_service
        .unpublish_post(&post_id, &identity.user_id)
        .await?;
    Ok(Json(ApiResponse::success(post)))
}

/// 记录一次阅读
/// POST /api/inkwell/posts/:post_id/view
async fn record_view(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<String>,
) -> Result<Json<Value>> {
    let views = state.engagement_service.record_view(&post_id).await?;
    Ok(Json(json!({
        "success": true,
        "data": { "view_count": views }
    })))
}

/// 上传文章配图，请求体为原始文件内容
/// POST /api/inkwell/posts/:post_id/image?filename=cover.png
async fn upload_image(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(post_id): Path<String>,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> Result<Json<ApiResponse<Post>>> {
    debug!("Uploading image {} for post {}", query.filename, post_id);

    let post = state
        .post_service
        .get_post(&post_id)
        .await?
        .ok_or_else(|| AppError::not_found("Post"))?;
    if post.author_id != identity.user_id {
        return Err(AppError::forbidden("Only the author can modify this post"));
    }

    let url = state
        .media_service
        .upload_post_image(&post_id, &query.filename, body.to_vec())
        .await?;

    let previous = post.image_url.clone();
    let post = state
        .post_service
        .update_post(
            &post_id,
            &identity.user_id,
            UpdatePostRequest {
                image_url: Some(url),
                ..Default::default()
            },
        )
        .await?;

    if let Some(previous) = previous {
        state.media_service.delete_best_effort(&previous).await;
    }

    Ok(Json(ApiResponse::success(post)))
}
