//! 首页信息流
//!
//! Read-only: assembles posts from the follow graph and the global
//! popularity ordering without writing anything back.

use crate::{
    error::Result,
    models::post::{Post, PostStatus},
    services::{
        database::{collections, Database},
        follow::FollowService,
    },
    storage::{Direction, Query, MAX_IN_VALUES},
};
use futures::future::try_join_all;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_SOURCE_SIZE: usize = 10;

#[derive(Clone)]
pub struct FeedService {
    db: Arc<Database>,
    follows: FollowService,
    source_size: usize,
}

impl FeedService {
    pub async fn new(db: Arc<Database>, follows: FollowService, source_size: usize) -> Result<Self> {
        Ok(Self {
            db,
            follows,
            source_size: source_size.max(1),
        })
    }

    /// 个性化信息流：关注作者的最新文章，不足时用热门文章补齐
    pub async fn personalized_feed(
        &self,
        user_id: &str,
        following: &BTreeSet<String>,
        limit: usize,
    ) -> Result<Vec<Post>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        debug!(
            "Building personalized feed for {} from {} followed authors",
            user_id,
            following.len()
        );

        let authors: Vec<&String> = following.iter().collect();
        let batches = authors.chunks(MAX_IN_VALUES).map(|batch| {
            let query = Self::published()
                .filter_in("author_id", batch.iter().map(|id| id.as_str()))
                .order_by("created_at", Direction::Desc)
                .limit(limit);
            async move { self.db.query::<Post>(collections::POSTS, &query).await }
        });
        let batches = try_join_all(batches).await?;

        let mut seen = HashSet::new();
        let mut posts: Vec<Post> = batches
            .into_iter()
            .flatten()
            .filter(|post| seen.insert(post.id.clone()))
            .collect();
        sort_newest_first(&mut posts);
        posts.truncate(limit);

        if posts.len() < limit {
            let query = Self::published()
                .order_by("view_count", Direction::Desc)
                .limit(limit + posts.len());
            let popular: Vec<Post> = self.db.query(collections::POSTS, &query).await?;

            let before = posts.len();
            for post in popular {
                if posts.len() >= limit {
                    break;
                }
                if seen.insert(post.id.clone()) {
                    posts.push(post);
                }
            }
            debug!("Backfilled {} popular posts for {}", posts.len() - before, user_id);
        }

        sort_newest_first(&mut posts);
        posts.truncate(limit);
        Ok(posts)
    }

    /// 读取关注列表后构建个性化信息流
    pub async fn personalized_feed_for(&self, user_id: &str, limit: usize) -> Result<Vec<Post>> {
        let following = self.follows.following(user_id).await?;
        self.personalized_feed(user_id, &following, limit).await
    }

    /// 精选：最新与最热的并集，按互动分数排序
    pub async fn featured_feed(&self, limit: usize) -> Result<Vec<Post>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let n = limit.max(self.source_size);
        let recent_query = Self::published()
            .order_by("created_at", Direction::Desc)
            .limit(n);
        let popular_query = Self::published()
            .order_by("view_count", Direction::Desc)
            .limit(n);

        let (recent, popular) = tokio::try_join!(
            self.db.query::<Post>(collections::POSTS, &recent_query),
            self.db.query::<Post>(collections::POSTS, &popular_query),
        )?;

        let mut seen = HashSet::new();
        let mut posts: Vec<Post> = recent
            .into_iter()
            .chain(popular)
            .filter(|post| seen.insert(post.id.clone()))
            .collect();

        posts.sort_by(|a, b| {
            b.engagement_score()
                .cmp(&a.engagement_score())
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        posts.truncate(limit);
        Ok(posts)
    }

    pub async fn latest(&self, limit: usize) -> Result<Vec<Post>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let query = Self::published()
            .order_by("created_at", Direction::Desc)
            .limit(limit);
        self.db.query(collections::POSTS, &query).await
    }

    fn published() -> Query {
        Query::new().filter_eq("status", PostStatus::Published.as_str())
    }
}

fn sort_newest_first(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
