//! 作者与读者统计
//!
//! Read-only aggregation over the post counters and the engagement ledger.

use crate::{
    error::{AppError, Result},
    models::{
        analytics::*,
        engagement::EngagementKind,
        post::{Post, PostStatus},
        user::User,
    },
    services::{
        database::{collections, Database},
        engagement::EngagementService,
    },
    storage::Query,
};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::debug;

pub const TOP_ARTICLES: usize = 10;
const WEEK_DAYS: i64 = 7;
const MONTH_DAYS: i64 = 30;

#[derive(Clone)]
pub struct AnalyticsService {
    db: Arc<Database>,
    engagement: EngagementService,
}

impl AnalyticsService {
    pub async fn new(db: Arc<Database>, engagement: EngagementService) -> Result<Self> {
        Ok(Self { db, engagement })
    }

    /// 获取作者统计概览
    pub async fn user_analytics(&self, user_id: &str) -> Result<UserAnalytics> {
        debug!("Getting analytics overview for user: {}", user_id);

        let user = self.user(user_id).await?;
        let query = Query::new()
            .filter_eq("author_id", user_id)
            .filter_eq("status", PostStatus::Published.as_str());
        let posts: Vec<Post> = self.db.query(collections::POSTS, &query).await?;

        Ok(summarize(&user, &posts, Utc::now()))
    }

    /// 单篇文章统计；草稿只对作者可见
    pub async fn article_stats(&self, post_id: &str, viewer_id: Option<&str>) -> Result<ArticleStats> {
        let post: Post = self
            .db
            .get_by_id(collections::POSTS, post_id)
            .await?
            .filter(|post: &Post| post.is_published() || viewer_id == Some(post.author_id.as_str()))
            .ok_or_else(|| AppError::not_found("Post"))?;
        Ok(ArticleStats::from(&post))
    }

    /// 读者统计：阅读列表、关注数以及账本中的点赞/收藏数
    pub async fn reading_stats(&self, user_id: &str) -> Result<ReadingStats> {
        let user = self.user(user_id).await?;
        let (liked, bookmarked) = tokio::try_join!(
            self.engagement.member_posts(EngagementKind::Like, user_id),
            self.engagement.member_posts(EngagementKind::Bookmark, user_id),
        )?;

        Ok(ReadingStats {
            reading_list_count: user.reading_list.len(),
            following_count: user.following_count,
            liked_count: liked.len(),
            bookmarked_count: bookmarked.len(),
        })
    }

    async fn user(&self, user_id: &str) -> Result<User> {
        self.db
            .get_by_id(collections::USERS, user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }
}

/// 汇总已发布文章的计数器
pub fn summarize(user: &User, posts: &[Post], now: DateTime<Utc>) -> UserAnalytics {
    let week_ago = now - Duration::days(WEEK_DAYS);
    let month_ago = now - Duration::days(MONTH_DAYS);

    let sum = |since: Option<DateTime<Utc>>, counter: fn(&Post) -> i64| -> i64 {
        posts
            .iter()
            .filter(|post| since.map_or(true, |since| post.created_at >= since))
            .map(counter)
            .sum()
    };

    let total_views = sum(None, |p| p.view_count);
    let total_likes = sum(None, |p| p.like_count);
    let total_bookmarks = sum(None, |p| p.bookmark_count);
    let total_comments = sum(None, |p| p.comment_count);

    // 计算参与率
    let engagement_rate = if total_views > 0 {
        (total_likes + total_comments + total_bookmarks) as f64 / total_views as f64 * 100.0
    } else {
        0.0
    };

    let mut ranked: Vec<&Post> = posts.iter().collect();
    ranked.sort_by(|a, b| {
        b.view_count
            .cmp(&a.view_count)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    let top_articles = ranked
        .into_iter()
        .take(TOP_ARTICLES)
        .map(ArticleStats::from)
        .collect();

    UserAnalytics {
        user_id: user.id.clone(),
        total_articles: posts.len(),
        total_views,
        total_likes,
        total_bookmarks,
        total_comments,
        total_followers: user.follower_count,
        total_following: user.following_count,
        views_this_week: sum(Some(week_ago), |p| p.view_count),
        views_this_month: sum(Some(month_ago), |p| p.view_count),
        likes_this_week: sum(Some(week_ago), |p| p.like_count),
        likes_this_month: sum(Some(month_ago), |p| p.like_count),
        engagement_rate,
        top_articles,
        last_updated: now,
    }
}
