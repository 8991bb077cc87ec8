use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// 阅读速度（词/分钟）
const WORDS_PER_MINUTE: usize = 200;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
        }
    }
}

/// `posts` 集合中的文档
///
/// The four counters are owned by the engagement ledger. Nothing outside
/// `services::engagement` writes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub byline: String,
    pub content: String,
    pub image_url: Option<String>,
    pub author_id: String,
    /// Snapshot taken when the post was created, not kept in sync.
    pub author_name: String,
    pub author_photo_url: Option<String>,
    pub slug: String,
    pub category: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub status: PostStatus,
    #[serde(default)]
    pub reading_time: u32,
    #[serde(default)]
    pub like_count: i64,
    #[serde(default)]
    pub bookmark_count: i64,
    #[serde(default)]
    pub comment_count: i64,
    #[serde(default)]
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// 精选排序使用的互动分数：浏览 + 2×点赞
    pub fn engagement_score(&self) -> i64 {
        self.view_count + 2 * self.like_count
    }

    pub fn is_published(&self) -> bool {
        self.status == PostStatus::Published
    }

    pub fn estimate_reading_time(content: &str) -> u32 {
        let words = content.split_whitespace().count();
        ((words + WORDS_PER_MINUTE - 1) / WORDS_PER_MINUTE).max(1) as u32
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePostRequest {
    #[validate(length(min = 1, max = 150))]
    pub title: String,

    #[validate(length(min = 1, max = 50000))]
    pub content: String,

    #[validate(url)]
    pub image_url: Option<String>,

    pub category: Option<String>,

    #[validate(length(max = 20))]
    pub keywords: Option<Vec<String>>,

    #[validate(length(max = 10))]
    pub tags: Option<Vec<String>>,

    pub save_as_draft: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdatePostRequest {
    #[validate(length(min = 1, max = 150))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 50000))]
    pub content: Option<String>,

    #[validate(url)]
    pub image_url: Option<String>,

    pub category: Option<String>,

    #[validate(length(max = 20))]
    pub keywords: Option<Vec<String>>,

    #[validate(length(max = 10))]
    pub tags: Option<Vec<String>>,
}
