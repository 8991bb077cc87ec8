use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::post::Post;

/// 单篇文章的统计数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleStats {
    pub post_id: String,
    pub title: String,
    pub slug: String,
    pub views: i64,
    pub likes: i64,
    pub bookmarks: i64,
    pub comments: i64,
    pub reading_time: u32,
    pub published_at: DateTime<Utc>,
}

impl From<&Post> for ArticleStats {
    fn from(post: &Post) -> Self {
        Self {
            post_id: post.id.clone(),
            title: post.title.clone(),
            slug: post.slug.clone(),
            views: post.view_count,
            likes: post.like_count,
            bookmarks: post.bookmark_count,
            comments: post.comment_count,
            reading_time: post.reading_time,
            published_at: post.created_at,
        }
    }
}

/// 作者统计概览
///
/// Totals cover published posts only. The weekly and monthly figures sum the
/// counters of posts published inside the window, since views and likes are
/// not bucketed by time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAnalytics {
    pub user_id: String,
    pub total_articles: usize,
    pub total_views: i64,
    pub total_likes: i64,
    pub total_bookmarks: i64,
    pub total_comments: i64,
    pub total_followers: i64,
    pub total_following: i64,
    pub views_this_week: i64,
    pub views_this_month: i64,
    pub likes_this_week: i64,
    pub likes_this_month: i64,
    /// (likes + comments + bookmarks) / views × 100
    pub engagement_rate: f64,
    pub top_articles: Vec<ArticleStats>,
    pub last_updated: DateTime<Utc>,
}

/// 读者侧统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingStats {
    pub reading_list_count: usize,
    pub following_count: i64,
    pub liked_count: usize,
    pub bookmarked_count: usize,
}
