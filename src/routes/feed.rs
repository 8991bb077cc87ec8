use crate::{
    error::Result,
    models::{post::Post, response::ApiResponse},
    routes::LimitQuery,
    state::AppState,
    utils::middleware::{AuthUser, OptionalAuth},
};
use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use std::sync::Arc;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(home_feed))
        .route("/for-you", get(personalized_feed))
        .route("/featured", get(featured_feed))
        .route("/latest", get(latest_feed))
}

/// 首页：登录用户看个性化流，否则看精选
/// GET /api/inkwell/feed
async fn home_feed(
    State(state): State<Arc<AppState>>,
    OptionalAuth(identity): OptionalAuth,
    Query(query): Query<LimitQuery>,
) -> Result<Json<ApiResponse<Vec<Post>>>> {
    let limit = state.page_limit(query.limit);
    let posts = match identity {
        Some(identity) => {
            state
                .feed_service
                .personalized_feed_for(&identity.user_id, limit)
                .await?
        }
        None => state.feed_service.featured_feed(limit).await?,
    };
    Ok(Json(ApiResponse::list(posts)))
}

async fn personalized_feed(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Query(query): Query<LimitQuery>,
) -> Result<Json<ApiResponse<Vec<Post>>>> {
    let limit = state.page_limit(query.limit);
    let posts = state
        .feed_service
        .personalized_feed_for(&identity.user_id, limit)
        .await?;
    Ok(Json(ApiResponse::list(posts)))
}

async fn featured_feed(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<ApiResponse<Vec<Post>>>> {
    let limit = state.page_limit(query.limit);
    let posts = state.feed_service.featured_feed(limit).await?;
    Ok(Json(ApiResponse::list(posts)))
}

async fn latest_feed(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<ApiResponse<Vec<Post>>>> {
    let limit = state.page_limit(query.limit);
    let posts = state.feed_service.latest(limit).await?;
    Ok(Json(ApiResponse::list(posts)))
}
