use crate::{
    error::Result,
    models::{
        category,
        post::{Post, PostStatus},
        search::SearchResults,
        user::User,
    },
    services::database::{collections, Database},
    storage::{Direction, Query},
};
use std::sync::Arc;
use tracing::debug;

const MAX_AUTHOR_RESULTS: usize = 5;

#[derive(Clone)]
pub struct SearchService {
    db: Arc<Database>,
    max_results: usize,
}

impl SearchService {
    pub async fn new(db: Arc<Database>, max_results: usize) -> Result<Self> {
        Ok(Self { db, max_results })
    }

    /// 全文搜索作者与文章（不区分大小写的子串匹配）
    pub async fn search_all(&self, query: &str, limit: usize) -> Result<SearchResults> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() || limit == 0 {
            return Ok(SearchResults::default());
        }
        let limit = limit.min(self.max_results);
        debug!("Searching for `{}` (limit {})", needle, limit);

        let users: Vec<User> = self.db.query(collections::USERS, &Query::new()).await?;
        let authors = users
            .iter()
            .filter(|user| {
                contains(&user.profile.name, &needle)
                    || user
                        .profile
                        .username
                        .as_deref()
                        .map_or(false, |u| contains(u, &needle))
            })
            .take(MAX_AUTHOR_RESULTS)
            .map(User::summary)
            .collect();

        let query = Query::new()
            .filter_eq("status", PostStatus::Published.as_str())
            .order_by("created_at", Direction::Desc);
        let posts: Vec<Post> = self.db.query(collections::POSTS, &query).await?;
        let articles = posts
            .into_iter()
            .filter(|post| post_matches(post, &needle))
            .take(limit)
            .collect();

        Ok(SearchResults { authors, articles })
    }

    /// 分类下已发布的文章，最新在前；未知分类返回空
    pub async fn by_category(&self, category: &str, limit: usize) -> Result<Vec<Post>> {
        let Some(info) = category::find(category) else {
            return Ok(Vec::new());
        };
        let query = Query::new()
            .filter_eq("status", PostStatus::Published.as_str())
            .filter_eq("category", info.name)
            .order_by("created_at", Direction::Desc)
            .limit(limit.min(self.max_results));
        self.db.query(collections::POSTS, &query).await
    }

    pub async fn by_author(&self, author_id: &str, limit: usize) -> Result<Vec<Post>> {
        let query = Query::new()
            .filter_eq("status", PostStatus::Published.as_str())
            .filter_eq("author_id", author_id)
            .order_by("created_at", Direction::Desc)
            .limit(limit.min(self.max_results));
        self.db.query(collections::POSTS, &query).await
    }
}

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

fn post_matches(post: &Post, needle: &str) -> bool {
    contains(&post.title, needle)
        || contains(&post.content, needle)
        || contains(&post.author_name, needle)
        || post.keywords.iter().any(|k| contains(k, needle))
        || post.category.as_deref().map_or(false, |c| contains(c, needle))
}
