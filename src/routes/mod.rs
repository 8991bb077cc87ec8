pub mod analytics;
pub mod engagement;
pub mod feed;
pub mod follows;
pub mod notifications;
pub mod posts;
pub mod recommendations;
pub mod search;
pub mod users;

use crate::{
    state::AppState,
    utils::middleware::{auth_middleware, request_id_middleware, request_logging_middleware},
};
use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::get,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

/// 通用的 `?limit=` 查询参数
#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

/// 构建应用路由，统一使用 /api/inkwell/ 前缀
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.cors_allowed_origins);

    Router::new()
        .route("/", get(health_check))
        .route("/health", get(health_check))
        .nest("/api/inkwell/users", users::router())
        .nest("/api/inkwell/posts", posts::router())
        .nest("/api/inkwell/engagement", engagement::router())
        .nest("/api/inkwell/follows", follows::router())
        .nest("/api/inkwell/feed", feed::router())
        .nest("/api/inkwell/notifications", notifications::router())
        .nest("/api/inkwell/search", search::router())
        .nest("/api/inkwell/recommendations", recommendations::router())
        .nest("/api/inkwell/analytics", analytics::router())
        .layer(middleware::from_fn(auth_middleware))
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(allowed_origins: &str) -> CorsLayer {
    let origins = allowed_origins
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
        .allow_origin(origins)
}

async fn health_check() -> &'static str {
    "Inkwell is running!"
}
