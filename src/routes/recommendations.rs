use crate::{
    error::{AppError, Result},
    models::{recommendation::SimilarArticle, response::ApiResponse},
    routes::LimitQuery,
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;

const DEFAULT_RECOMMENDATIONS: usize = 5;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/similar/:post_id", get(similar_to_post))
        .route("/by-content", post(similar_to_content))
}

#[derive(Debug, Deserialize)]
pub struct ContentQuery {
    pub content: String,
    pub limit: Option<usize>,
}

/// 与文章相似的其他文章；推荐服务不可用时返回空列表
/// GET /api/inkwell/recommendations/similar/:post_id
async fn similar_to_post(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<ApiResponse<Vec<SimilarArticle>>>> {
    let post = state
        .post_service
        .get_post(&post_id)
        .await?
        .filter(|post| post.is_published())
        .ok_or_else(|| AppError::not_found("Post"))?;

    let text = format!("{}\n\n{}", post.title, post.content);
    let limit = query.limit.unwrap_or(DEFAULT_RECOMMENDATIONS).min(crate::state::MAX_PAGE_SIZE);
    let articles = state.recommendation_service.similar_articles(&text, limit).await;
    Ok(Json(ApiResponse::list(articles)))
}

async fn similar_to_content(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ContentQuery>,
) -> Result<Json<ApiResponse<Vec<SimilarArticle>>>> {
    let limit = request
        .limit
        .unwrap_or(DEFAULT_RECOMMENDATIONS)
        .min(crate::state::MAX_PAGE_SIZE);
    let articles = state
        .recommendation_service
        .similar_articles(&request.content, limit)
        .await;
    Ok(Json(ApiResponse::list(articles)))
}
