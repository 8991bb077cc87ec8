use crate::{
    error::{AppError, Result},
    models::{response::ApiResponse, user::*},
    routes::LimitQuery,
    state::AppState,
    utils::{middleware::AuthUser, validation::validate_username},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        // 公开路由
        .route("/", get(list_users).post(create_user))
        .route("/username-availability", get(check_username))
        .route("/by-username/:username", get(get_user_by_username))
        .route("/:user_id", get(get_user))
        .route("/:user_id/posts", get(get_user_posts))
        // 需要认证的路由
        .route("/me", get(get_current_user).put(update_current_user))
        .route("/me/posts", get(get_current_user_posts))
}

#[derive(Debug, Deserialize)]
pub struct UsernameQuery {
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct UsernameAvailability {
    pub username: String,
    pub valid: bool,
    pub available: bool,
    pub reason: Option<String>,
    pub suggestions: Vec<String>,
}

/// 用户列表
/// GET /api/inkwell/users
async fn list_users(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<ApiResponse<Vec<UserSummary>>>> {
    let limit = app_state.page_limit(query.limit);
    let users = app_state.user_service.list_users(limit).await?;
    Ok(Json(ApiResponse::list(users.iter().map(User::summary).collect())))
}

/// 注册后创建用户资料
/// POST /api/inkwell/users
async fn create_user(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<User>>)> {
    let user = app_state.user_service.create_user(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(user))))
}

/// GET /api/inkwell/users/username-availability?username=
async fn check_username(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<UsernameQuery>,
) -> Result<Json<ApiResponse<UsernameAvailability>>> {
    let username = query.username.trim().to_lowercase();
    debug!("Checking availability of username `{}`", username);

    let (valid, reason) = match validate_username(&username) {
        Ok(()) => (true, None),
        Err(e) => (false, Some(e.to_string())),
    };
    let available = valid && app_state.username_service.is_available(&username).await?;
    let suggestions = if available {
        Vec::new()
    } else {
        app_state.username_service.suggest_alternatives(&username).await?
    };

    Ok(Json(ApiResponse::success(UsernameAvailability {
        username,
        valid,
        available,
        reason,
        suggestions,
    })))
}

async fn get_user(
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<User>>> {
    let user = app_state.user_service.require_user(&user_id).await?;
    Ok(Json(ApiResponse::success(user)))
}

async fn get_user_by_username(
    State(app_state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<User>>> {
    let user = app_state
        .user_service
        .get_user_by_username(&username)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    Ok(Json(ApiResponse::success(user)))
}

/// 用户已发布的文章
/// GET /api/inkwell/users/:user_id/posts
async fn get_user_posts(
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Value>> {
    let limit = app_state.page_limit(query.limit);
    let posts = app_state
        .post_service
        .posts_by_author(&user_id, false, limit)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": posts
    })))
}

async fn get_current_user(
    State(app_state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
) -> Result<Json<ApiResponse<User>>> {
    let user = app_state.user_service.require_user(&identity.user_id).await?;
    Ok(Json(ApiResponse::success(user)))
}

/// 更新当前用户资料
/// PUT /api/inkwell/users/me
async fn update_current_user(
    State(app_state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<User>>> {
    let user = app_state
        .user_service
        .update_profile(&identity.user_id, request)
        .await?;
    Ok(Json(ApiResponse::with_message(user, "Profile updated")))
}

/// 当前用户的全部文章（包括草稿）
async fn get_current_user_posts(
    State(app_state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Value>> {
    let limit = app_state.page_limit(query.limit);
    let posts = app_state
        .post_service
        .posts_by_author(&identity.user_id, true, limit)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": posts
    })))
}
