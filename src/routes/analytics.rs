use crate::{
    error::Result,
    models::{
        analytics::{ArticleStats, ReadingStats, UserAnalytics},
        response::ApiResponse,
    },
    state::AppState,
    utils::middleware::{AuthUser, OptionalAuth},
};
use axum::{
    extract::{Path, State},
    response::Json,
    routing::get,
    Router,
};
use std::sync::Arc;
use tracing::debug;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/overview", get(get_overview))
        .route("/reading", get(get_reading_stats))
        .route("/articles/:post_id", get(get_article_stats))
}

/// 当前作者的统计概览
/// GET /api/inkwell/analytics/overview
async fn get_overview(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
) -> Result<Json<ApiResponse<UserAnalytics>>> {
    let analytics = state
        .analytics_service
        .user_analytics(&identity.user_id)
        .await?;
    Ok(Json(ApiResponse::success(analytics)))
}

/// GET /api/inkwell/analytics/reading
async fn get_reading_stats(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
) -> Result<Json<ApiResponse<ReadingStats>>> {
    let stats = state
        .analytics_service
        .reading_stats(&identity.user_id)
        .await?;
    Ok(Json(ApiResponse::success(stats)))
}

/// GET /api/inkwell/analytics/articles/:post_id
async fn get_article_stats(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<String>,
    OptionalAuth(identity): OptionalAuth,
) -> Result<Json<ApiResponse<ArticleStats>>> {
    debug!("Getting stats for post {}", post_id);
    let viewer = identity.as_ref().map(|i| i.user_id.as_str());
    let stats = state
        .analytics_service
        .article_stats(&post_id, viewer)
        .await?;
    Ok(Json(ApiResponse::success(stats)))
}
