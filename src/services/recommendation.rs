use crate::{
    config::Config,
    error::{AppError, Result},
    models::recommendation::*,
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Upper bound on text sent to the similarity service.
const MAX_CONTENT_CHARS: usize = 5000;

/// 外部相似文章推荐服务
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Recommender: Send + Sync {
    async fn recommend_similar(&self, text: &str, limit: usize) -> Result<Vec<SimilarArticle>>;
}

/// 调用 `{base}/recommendations/by-content` 的 HTTP 客户端
#[derive(Clone)]
pub struct HttpRecommender {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRecommender {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/recommendations/by-content", base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl Recommender for HttpRecommender {
    async fn recommend_similar(&self, text: &str, limit: usize) -> Result<Vec<SimilarArticle>> {
        let body = ContentRecommendationRequest {
            content: text.chars().take(MAX_CONTENT_CHARS).collect(),
            n_recommendations: limit,
        };

        let response = self.client.post(&self.endpoint).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(AppError::CollaboratorUnavailable(format!(
                "recommendation service returned {}",
                response.status()
            )));
        }

        let payload: RecommendationResponse = response.json().await?;
        Ok(payload
            .recommendations
            .into_iter()
            .take(limit)
            .map(SimilarArticle::from)
            .collect())
    }
}

/// 未配置推荐服务时使用
#[derive(Debug, Clone, Default)]
pub struct DisabledRecommender;

#[async_trait]
impl Recommender for DisabledRecommender {
    async fn recommend_similar(&self, _text: &str, _limit: usize) -> Result<Vec<SimilarArticle>> {
        Err(AppError::CollaboratorUnavailable(
            "recommendation service is not configured".to_string(),
        ))
    }
}

#[derive(Clone)]
pub struct RecommendationService {
    recommender: Arc<dyn Recommender>,
}

impl RecommendationService {
    pub async fn new(config: &Config) -> Result<Self> {
        let recommender: Arc<dyn Recommender> = match &config.recommendation_service_url {
            Some(url) => Arc::new(HttpRecommender::new(
                url,
                Duration::from_millis(config.recommendation_timeout_ms),
            )?),
            None => Arc::new(DisabledRecommender),
        };
        Ok(Self::with_recommender(recommender))
    }

    pub fn with_recommender(recommender: Arc<dyn Recommender>) -> Self {
        Self { recommender }
    }

    /// 获取相似文章；服务不可用时返回空列表
    pub async fn similar_articles(&self, text: &str, limit: usize) -> Vec<SimilarArticle> {
        if text.trim().is_empty() || limit == 0 {
            return Vec::new();
        }

        match self.recommender.recommend_similar(text, limit).await {
            Ok(articles) => {
                debug!("Recommendation service returned {} articles", articles.len());
                articles
            }
            Err(e) => {
                warn!(error = %e, "Recommendation service unavailable, returning no recommendations");
                Vec::new()
            }
        }
    }
}
