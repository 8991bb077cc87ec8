use crate::{
    error::Result,
    models::{
        category::{CategoryInfo, CATEGORIES},
        post::Post,
        response::ApiResponse,
        search::{SearchQuery, SearchResults},
    },
    routes::LimitQuery,
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::get,
    Router,
};
use std::sync::Arc;
use tracing::debug;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(search))
        .route("/categories", get(list_categories))
        .route("/category/:category", get(by_category))
        .route("/author/:author_id", get(by_author))
}

/// 搜索作者与文章
/// GET /api/inkwell/search?q=rust&limit=10
async fn search(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<SearchResults>>> {
    debug!("Search request: {:?}", query);
    let limit = state.page_limit(query.limit);
    let results = state.search_service.search_all(&query.q, limit).await?;
    Ok(Json(ApiResponse::success(results)))
}

async fn list_categories() -> Json<ApiResponse<&'static [CategoryInfo]>> {
    Json(ApiResponse::success(CATEGORIES))
}

async fn by_category(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<ApiResponse<Vec<Post>>>> {
    let limit = state.page_limit(query.limit);
    let posts = state.search_service.by_category(&category, limit).await?;
    Ok(Json(ApiResponse::list(posts)))
}

async fn by_author(
    State(state): State<Arc<AppState>>,
    Path(author_id): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<ApiResponse<Vec<Post>>>> {
    let limit = state.page_limit(query.limit);
    let posts = state.search_service.by_author(&author_id, limit).await?;
    Ok(Json(ApiResponse::list(posts)))
}
