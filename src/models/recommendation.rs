use serde::{Deserialize, Serialize};

/// 推荐服务返回的相似文章
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarArticle {
    pub title: String,
    pub author: String,
    pub reading_time: u32,
    pub score: f64,
}

/// Body of `POST /recommendations/by-content`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentRecommendationRequest {
    pub content: String,
    pub n_recommendations: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub recommendations: Vec<ArticleRecommendation>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleRecommendation {
    pub index: i64,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub claps: i64,
    pub reading_time: u32,
    pub similarity_score: f64,
}

impl From<ArticleRecommendation> for SimilarArticle {
    fn from(rec: ArticleRecommendation) -> Self {
        Self {
            title: rec.title,
            author: rec.author,
            reading_time: rec.reading_time,
            score: rec.similarity_score,
        }
    }
}
