//! 点赞/收藏账本
//!
//! The ledger records are the source of truth; the counters on the post
//! document are caches of their cardinality. Every counter write in the
//! crate goes through this module.

use crate::{
    error::{AppError, Result},
    models::{
        engagement::{EngagementKind, EngagementRecord},
        post::Post,
    },
    services::database::{collections, Database},
    storage::{Direction, Query, StoreError},
};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

const VIEW_COUNT: &str = "view_count";
const COMMENT_COUNT: &str = "comment_count";

#[derive(Clone)]
pub struct EngagementService {
    db: Arc<Database>,
}

impl EngagementService {
    pub async fn new(db: Arc<Database>) -> Result<Self> {
        Ok(Self { db })
    }

    /// 切换点赞/收藏状态，返回切换后的成员状态
    pub async fn toggle(&self, kind: EngagementKind, post_id: &str, user_id: &str) -> Result<bool> {
        debug!("Toggling {} on post {} for user {}", kind, post_id, user_id);

        if !self.db.exists(collections::POSTS, post_id).await? {
            return Err(AppError::not_found("Post"));
        }

        let store = self.db.raw();
        let collection = kind.collection();
        let key = EngagementRecord::key(user_id, post_id);

        match store.get(collection, &key).await? {
            Some(existing) => {
                if !store.delete(collection, &key).await? {
                    // 并发请求已经删除
                    return Ok(false);
                }

                if let Err(e) = self.bump(post_id, kind.counter_field(), -1).await {
                    error!(
                        kind = %kind, post_id, user_id, error = %e,
                        "Counter update failed after removing ledger entry, restoring it"
                    );
                    if let Err(restore) = store.create(collection, &key, existing).await {
                        error!(kind = %kind, post_id, user_id, error = %restore, "Failed to restore ledger entry");
                    }
                    return Err(e);
                }

                info!("User {} removed {} from post {}", user_id, kind, post_id);
                Ok(false)
            }
            None => {
                let record = EngagementRecord::new(user_id, post_id);
                if !store.create(collection, &key, serde_json::to_value(&record)?).await? {
                    // 并发请求已经插入，不重复计数
                    return Ok(true);
                }

                if let Err(e) = self.bump(post_id, kind.counter_field(), 1).await {
                    error!(
                        kind = %kind, post_id, user_id, error = %e,
                        "Counter update failed after adding ledger entry, removing it"
                    );
                    if let Err(cleanup) = store.delete(collection, &key).await {
                        error!(kind = %kind, post_id, user_id, error = %cleanup, "Failed to remove ledger entry");
                    }
                    return Err(e);
                }

                info!("User {} added {} to post {}", user_id, kind, post_id);
                Ok(true)
            }
        }
    }

    /// 只查询账本，不读取计数器
    pub async fn has_membership(&self, kind: EngagementKind, post_id: &str, user_id: &str) -> Result<bool> {
        let key = EngagementRecord::key(user_id, post_id);
        Ok(self.db.raw().get(kind.collection(), &key).await?.is_some())
    }

    pub async fn record_view(&self, post_id: &str) -> Result<i64> {
        self.bump(post_id, VIEW_COUNT, 1).await
    }

    pub async fn adjust_comment_count(&self, post_id: &str, delta: i64) -> Result<i64> {
        self.bump(post_id, COMMENT_COUNT, delta).await
    }

    /// 用户点赞/收藏过的文章 ID，最新在前
    pub async fn member_posts(&self, kind: EngagementKind, user_id: &str) -> Result<Vec<String>> {
        let query = Query::new()
            .filter_eq("user_id", user_id)
            .order_by("created_at", Direction::Desc);
        let records: Vec<EngagementRecord> = self.db.query(kind.collection(), &query).await?;
        Ok(records.into_iter().map(|r| r.post_id).collect())
    }

    /// 收藏的文章，已删除的文章会被跳过
    pub async fn bookmarked_posts(&self, user_id: &str) -> Result<Vec<Post>> {
        let ids = self.member_posts(EngagementKind::Bookmark, user_id).await?;
        let mut posts = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(post) = self.db.get_by_id::<Post>(collections::POSTS, &id).await? {
                posts.push(post);
            }
        }
        Ok(posts)
    }

    pub async fn members(&self, kind: EngagementKind, post_id: &str) -> Result<Vec<String>> {
        let records = self.records_for_post(kind, post_id).await?;
        Ok(records.into_iter().map(|r| r.user_id).collect())
    }

    /// 根据账本重写点赞/收藏计数
    pub async fn reconcile_counters(&self, post_id: &str) -> Result<Post> {
        let post: Post = self
            .db
            .get_by_id(collections::POSTS, post_id)
            .await?
            .ok_or_else(|| AppError::not_found("Post"))?;

        let likes = self.records_for_post(EngagementKind::Like, post_id).await?.len() as i64;
        let bookmarks = self.records_for_post(EngagementKind::Bookmark, post_id).await?.len() as i64;

        if likes != post.like_count || bookmarks != post.bookmark_count {
            warn!(
                post_id,
                cached_likes = post.like_count,
                ledger_likes = likes,
                cached_bookmarks = post.bookmark_count,
                ledger_bookmarks = bookmarks,
                "Engagement counters drifted from ledger, rewriting"
            );
        }

        self.db
            .update_by_id_with_json(
                collections::POSTS,
                post_id,
                json!({"like_count": likes, "bookmark_count": bookmarks}),
            )
            .await?
            .ok_or_else(|| AppError::not_found("Post"))
    }

    /// 删除文章的全部账本记录
    pub async fn purge_post(&self, post_id: &str) -> Result<usize> {
        let store = self.db.raw();
        let mut removed = 0;
        for kind in EngagementKind::ALL {
            for record in self.records_for_post(kind, post_id).await? {
                if store.delete(kind.collection(), &record.id).await? {
                    removed += 1;
                }
            }
        }
        debug!("Purged {} ledger entries for post {}", removed, post_id);
        Ok(removed)
    }

    async fn records_for_post(&self, kind: EngagementKind, post_id: &str) -> Result<Vec<EngagementRecord>> {
        let query = Query::new().filter_eq("post_id", post_id);
        self.db.query(kind.collection(), &query).await
    }

    /// Clamped at zero; a clamp means the cache had drifted.
    async fn bump(&self, post_id: &str, field: &str, delta: i64) -> Result<i64> {
        let update = match self
            .db
            .raw()
            .increment(collections::POSTS, post_id, field, delta, Some(0))
            .await
        {
            Ok(update) => update,
            Err(StoreError::NotFound { .. }) => return Err(AppError::not_found("Post")),
            Err(e) => return Err(e.into()),
        };

        if update.was_clamped(delta) {
            warn!(
                post_id,
                field,
                before = update.before,
                delta,
                "Counter would go negative, clamped at 0"
            );
        }
        Ok(update.after)
    }
}
