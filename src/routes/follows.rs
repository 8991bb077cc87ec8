use crate::{
    error::Result,
    models::{follow::FollowStats, response::ApiResponse, user::UserSummary},
    state::AppState,
    utils::middleware::{AuthUser, OptionalAuth},
};
use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/user/:user_id/follow", post(follow_user).delete(unfollow_user))
        .route("/user/:user_id/followers", get(get_followers))
        .route("/user/:user_id/following", get(get_following))
        .route("/user/:user_id/stats", get(get_follow_stats))
        .route("/user/:user_id/is-following", get(check_following))
        .route("/mutual/:target_user_id", get(get_mutual_following))
}

/// 关注用户
/// POST /api/inkwell/follows/user/:user_id/follow
async fn follow_user(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<()>>> {
    debug!("User {} following user {}", identity.user_id, user_id);

    let actor = state.user_service.require_user(&identity.user_id).await?;
    state
        .follow_service
        .follow(
            &actor.id,
            &user_id,
            &actor.profile.name,
            actor.profile.photo_url.as_deref(),
        )
        .await?;

    Ok(Json(ApiResponse::ok("User followed successfully")))
}

/// 取消关注用户
/// DELETE /api/inkwell/follows/user/:user_id/follow
async fn unfollow_user(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<()>>> {
    debug!("User {} unfollowing user {}", identity.user_id, user_id);

    state
        .follow_service
        .unfollow(&identity.user_id, &user_id)
        .await?;

    Ok(Json(ApiResponse::ok("User unfollowed successfully")))
}

/// 获取用户的关注者列表
/// GET /api/inkwell/follows/user/:user_id/followers
async fn get_followers(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<UserSummary>>>> {
    let ids: Vec<String> = state.follow_service.followers(&user_id).await?.into_iter().collect();
    let users = state.user_service.get_users(&ids).await?;
    Ok(Json(ApiResponse::list(users.iter().map(|u| u.summary()).collect())))
}

/// 获取用户关注的人列表
/// GET /api/inkwell/follows/user/:user_id/following
async fn get_following(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<UserSummary>>>> {
    let ids: Vec<String> = state.follow_service.following(&user_id).await?.into_iter().collect();
    let users = state.user_service.get_users(&ids).await?;
    Ok(Json(ApiResponse::list(users.iter().map(|u| u.summary()).collect())))
}

/// 获取用户的关注统计
/// GET /api/inkwell/follows/user/:user_id/stats
async fn get_follow_stats(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    OptionalAuth(identity): OptionalAuth,
) -> Result<Json<ApiResponse<FollowStats>>> {
    let viewer = identity.as_ref().map(|i| i.user_id.as_str());
    let stats = state.follow_service.relationship(viewer, &user_id).await?;
    Ok(Json(ApiResponse::success(stats)))
}

async fn check_following(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(user_id): Path<String>,
) -> Result<Json<Value>> {
    let is_following = state
        .follow_service
        .is_following(&identity.user_id, &user_id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": { "is_following": is_following }
    })))
}

/// 共同关注
/// GET /api/inkwell/follows/mutual/:target_user_id
async fn get_mutual_following(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(target_user_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<UserSummary>>>> {
    let ids = state
        .follow_service
        .mutual_following(&identity.user_id, &target_user_id)
        .await?;
    let users = state.user_service.get_users(&ids).await?;
    Ok(Json(ApiResponse::list(users.iter().map(|u| u.summary()).collect())))
}
