use crate::{
    error::{AppError, Result},
    models::{category, post::*},
    services::{
        database::{collections, Database},
        engagement::EngagementService,
        media::MediaService,
        user::UserService,
    },
    storage::{Direction, Query},
    utils::slug::{post_slug, with_random_suffix},
};
use chrono::Utc;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

#[derive(Clone)]
pub struct PostService {
    db: Arc<Database>,
    users: UserService,
    engagement: EngagementService,
    media: MediaService,
}

impl PostService {
    pub async fn new(
        db: Arc<Database>,
        users: UserService,
        engagement: EngagementService,
        media: MediaService,
    ) -> Result<Self> {
        Ok(Self {
            db,
            users,
            engagement,
            media,
        })
    }

    /// 创建文章，作者信息在此时快照
    pub async fn create_post(&self, author_id: &str, request: CreatePostRequest) -> Result<Post> {
        request.validate()?;
        debug!("Creating post `{}` for author {}", request.title, author_id);

        let author = self.users.require_user(author_id).await?;
        let category = canonical_category(request.category.as_deref())?;

        let now = Utc::now();
        let mut slug = post_slug(&request.title, now);
        if self.get_post_by_slug(&slug).await?.is_some() {
            slug = with_random_suffix(&slug);
        }

        let status = if request.save_as_draft.unwrap_or(false) {
            PostStatus::Draft
        } else {
            PostStatus::Published
        };

        let post = Post {
            id: Uuid::new_v4().to_string(),
            title: request.title.trim().to_string(),
            byline: format!("By {}", author.profile.name),
            reading_time: Post::estimate_reading_time(&request.content),
            content: request.content,
            image_url: request.image_url,
            author_id: author.id.clone(),
            author_name: author.profile.name.clone(),
            author_photo_url: author.profile.photo_url.clone(),
            slug,
            category,
            keywords: clean_terms(request.keywords.unwrap_or_default()),
            tags: clean_terms(request.tags.unwrap_or_default()),
            status,
            like_count: 0,
            bookmark_count: 0,
            comment_count: 0,
            view_count: 0,
            created_at: now,
            updated_at: now,
        };

        if !self.db.create(collections::POSTS, &post.id, &post).await? {
            return Err(AppError::Conflict(format!("Post {} already exists", post.id)));
        }

        info!("Created {} post {} ({})", post.status.as_str(), post.id, post.slug);
        Ok(post)
    }

    pub async fn get_post(&self, post_id: &str) -> Result<Option<Post>> {
        self.db.get_by_id(collections::POSTS, post_id).await
    }

    pub async fn get_post_by_slug(&self, slug: &str) -> Result<Option<Post>> {
        self.db.find_one(collections::POSTS, "slug", slug).await
    }

    /// 作者的文章，最新在前
    pub async fn posts_by_author(&self, author_id: &str, include_drafts: bool, limit: usize) -> Result<Vec<Post>> {
        let mut query = Query::new().filter_eq("author_id", author_id);
        if !include_drafts {
            query = query.filter_eq("status", PostStatus::Published.as_str());
        }
        let query = query.order_by("created_at", Direction::Desc).limit(limit);
        self.db.query(collections::POSTS, &query).await
    }

    /// 更新文章内容；计数器与 slug 不会被修改
    pub async fn update_post(&self, post_id: &str, author_id: &str, request: UpdatePostRequest) -> Result<Post> {
        request.validate()?;
        self.require_owned(post_id, author_id).await?;

        let mut patch = Map::new();
        if let Some(title) = request.title {
            patch.insert("title".into(), json!(title.trim()));
        }
        if let Some(content) = request.content {
            patch.insert("reading_time".into(), json!(Post::estimate_reading_time(&content)));
            patch.insert("content".into(), json!(content));
        }
        if let Some(image_url) = request.image_url {
            patch.insert("image_url".into(), json!(image_url));
        }
        if request.category.is_some() {
            let category = canonical_category(request.category.as_deref())?;
            patch.insert("category".into(), json!(category));
        }
        if let Some(keywords) = request.keywords {
            patch.insert("keywords".into(), json!(clean_terms(keywords)));
        }
        if let Some(tags) = request.tags {
            patch.insert("tags".into(), json!(clean_terms(tags)));
        }
        patch.insert("updated_at".into(), json!(Utc::now()));

        let post = self.merge(post_id, Value::Object(patch)).await?;
        info!("Updated post {}", post_id);
        Ok(post)
    }

    pub async fn publish_post(&self, post_id: &str, author_id: &str) -> Result<Post> {
        self.set_status(post_id, author_id, PostStatus::Published).await
    }

    pub async fn unpublish_post(&self, post_id: &str, author_id: &str) -> Result<Post> {
        self.set_status(post_id, author_id, PostStatus::Draft).await
    }

    /// 删除文章并清理账本记录；配图删除失败不影响结果
    pub async fn delete_post(&self, post_id: &str, author_id: &str) -> Result<()> {
        let post = self.require_owned(post_id, author_id).await?;

        self.db.delete_by_id(collections::POSTS, post_id).await?;
        let purged = self.engagement.purge_post(post_id).await?;

        if let Some(image_url) = &post.image_url {
            self.media.delete_best_effort(image_url).await;
        }

        info!("Deleted post {} and {} ledger entries", post_id, purged);
        Ok(())
    }

    async fn set_status(&self, post_id: &str, author_id: &str, status: PostStatus) -> Result<Post> {
        let current = self.require_owned(post_id, author_id).await?;
        if current.status == status {
            return Ok(current);
        }

        let post = self
            .merge(post_id, json!({"status": status, "updated_at": Utc::now()}))
            .await?;
        info!("Post {} is now {}", post_id, status.as_str());
        Ok(post)
    }

    async fn require_owned(&self, post_id: &str, author_id: &str) -> Result<Post> {
        let post = self
            .get_post(post_id)
            .await?
            .ok_or_else(|| AppError::not_found("Post"))?;
        if post.author_id != author_id {
            return Err(AppError::forbidden("Only the author can modify this post"));
        }
        Ok(post)
    }

    async fn merge(&self, post_id: &str, patch: Value) -> Result<Post> {
        self.db
            .update_by_id_with_json(collections::POSTS, post_id, patch)
            .await?
            .ok_or_else(|| AppError::not_found("Post"))
    }
}

fn canonical_category(category: Option<&str>) -> Result<Option<String>> {
    match category.map(str::trim).filter(|c| !c.is_empty()) {
        None => Ok(None),
        Some(name) => category::find(name)
            .map(|info| Some(info.name.to_string()))
            .ok_or_else(|| AppError::Validation(format!("Unknown category `{}`", name))),
    }
}

fn clean_terms(terms: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(terms.len());
    for term in terms {
        let term = term.trim().to_string();
        if !term.is_empty() && !cleaned.contains(&term) {
            cleaned.push(term);
        }
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::{engagement::EngagementKind, user::CreateUserRequest};
    use crate::services::{
        media::MockBlobStore,
        username::UsernameService,
    };

    async fn setup(blobs: MockBlobStore) -> (PostService, EngagementService) {
        let db = Arc::new(Database::in_memory());
        let usernames = UsernameService::new(db.clone()).await.unwrap();
        let users = UserService::new(db.clone(), usernames).await.unwrap();
        let engagement = EngagementService::new(db.clone()).await.unwrap();
        let media = MediaService::with_store(Arc::new(blobs), &Config::default());

        users
            .create_user(CreateUserRequest {
                id: Some("ada".into()),
                name: "Ada Lovelace".into(),
                email: "ada@example.com".into(),
                first_name: None,
                last_name: None,
                photo_url: None,
            })
            .await
            .unwrap();

        let posts = PostService::new(db, users, engagement.clone(), media).await.unwrap();
        (posts, engagement)
    }

    fn request(title: &str) -> CreatePostRequest {
        CreatePostRequest {
            title: title.into(),
            content: "An essay on engines. ".repeat(50),
            image_url: Some("https://cdn.example.com/engine.png".into()),
            category: Some("technology".into()),
            keywords: Some(vec!["engines".into(), " engines ".into(), "".into()]),
            tags: None,
            save_as_draft: None,
        }
    }

    #[tokio::test]
    async fn test_create_post_snapshots_author() {
        let (posts, _) = setup(MockBlobStore::new()).await;
        let post = posts.create_post("ada", request("Analytical Engines")).await.unwrap();

        assert_eq!(post.byline, "By Ada Lovelace");
        assert_eq!(post.author_name, "Ada Lovelace");
        assert_eq!(post.category.as_deref(), Some("Technology"));
        assert_eq!(post.keywords, vec!["engines"]);
        assert_eq!(post.reading_time, 1);
        assert!(post.is_published());
        assert!(post.slug.starts_with("analytical-engines-"));
        assert_eq!(
            posts.get_post_by_slug(&post.slug).await.unwrap().map(|p| p.id),
            Some(post.id)
        );
    }

    #[tokio::test]
    async fn test_unknown_category_and_author() {
        let (posts, _) = setup(MockBlobStore::new()).await;
        let mut bad = request("Hi");
        bad.category = Some("Gardening".into());
        assert!(matches!(posts.create_post("ada", bad).await, Err(AppError::Validation(_))));
        assert!(matches!(
            posts.create_post("ghost", request("Hi")).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_only_author_can_update_and_counters_survive() {
        let (posts, engagement) = setup(MockBlobStore::new()).await;
        let post = posts.create_post("ada", request("Notes")).await.unwrap();
        engagement.toggle(EngagementKind::Like, &post.id, "bob").await.unwrap();

        let denied = posts
            .update_post(&post.id, "bob", UpdatePostRequest { title: Some("Hijacked".into()), ..Default::default() })
            .await;
        assert!(matches!(denied, Err(AppError::Authorization(_))));

        let updated = posts
            .update_post(&post.id, "ada", UpdatePostRequest { title: Some("Notes, revised".into()), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(updated.title, "Notes, revised");
        assert_eq!(updated.slug, post.slug);
        assert_eq!(updated.like_count, 1);
    }

    #[tokio::test]
    async fn test_publish_lifecycle() {
        let (posts, _) = setup(MockBlobStore::new()).await;
        let mut draft = request("Draft");
        draft.save_as_draft = Some(true);
        let post = posts.create_post("ada", draft).await.unwrap();

        assert!(posts.posts_by_author("ada", false, 10).await.unwrap().is_empty());
        assert_eq!(posts.posts_by_author("ada", true, 10).await.unwrap().len(), 1);

        let published = posts.publish_post(&post.id, "ada").await.unwrap();
        assert!(published.is_published());
        assert_eq!(posts.posts_by_author("ada", false, 10).await.unwrap().len(), 1);

        let hidden = posts.unpublish_post(&post.id, "ada").await.unwrap();
        assert_eq!(hidden.status, PostStatus::Draft);
    }

    #[tokio::test]
    async fn test_delete_cascades_and_ignores_blob_failure() {
        let mut blobs = MockBlobStore::new();
        blobs
            .expect_delete()
            .times(1)
            .returning(|_| Err(AppError::Internal("offline".into())));
        let (posts, engagement) = setup(blobs).await;

        let post = posts.create_post("ada", request("Ephemeral")).await.unwrap();
        engagement.toggle(EngagementKind::Like, &post.id, "bob").await.unwrap();
        engagement.toggle(EngagementKind::Bookmark, &post.id, "bob").await.unwrap();

        assert!(matches!(
            posts.delete_post(&post.id, "bob").await,
            Err(AppError::Authorization(_))
        ));
        posts.delete_post(&post.id, "ada").await.unwrap();

        assert!(posts.get_post(&post.id).await.unwrap().is_none());
        assert!(engagement.members(EngagementKind::Like, &post.id).await.unwrap().is_empty());
        assert!(engagement.member_posts(EngagementKind::Bookmark, "bob").await.unwrap().is_empty());
    }
}
