use crate::{
    error::{AppError, Result},
    models::{post::Post, user::User},
    services::database::{collections, Database},
    storage::{SetUpdate, StoreError},
};
use std::sync::Arc;
use tracing::{debug, info};

const READING_LIST: &str = "reading_list";

/// 稍后阅读列表，存放在用户文档上
#[derive(Clone)]
pub struct ReadingListService {
    db: Arc<Database>,
}

impl ReadingListService {
    pub async fn new(db: Arc<Database>) -> Result<Self> {
        Ok(Self { db })
    }

    pub async fn add(&self, user_id: &str, post_id: &str) -> Result<bool> {
        if !self.db.exists(collections::POSTS, post_id).await? {
            return Err(AppError::not_found("Post"));
        }

        let update = self.apply(user_id, post_id, true).await?;
        if update.changed {
            info!("User {} saved post {} to reading list", user_id, post_id);
        }
        Ok(update.changed)
    }

    /// 幂等：不在列表中时什么也不做
    pub async fn remove(&self, user_id: &str, post_id: &str) -> Result<bool> {
        let update = self.apply(user_id, post_id, false).await?;
        if update.changed {
            info!("User {} removed post {} from reading list", user_id, post_id);
        }
        Ok(update.changed)
    }

    pub async fn toggle(&self, user_id: &str, post_id: &str) -> Result<bool> {
        if self.contains(user_id, post_id).await? {
            self.remove(user_id, post_id).await?;
            Ok(false)
        } else {
            self.add(user_id, post_id).await?;
            Ok(true)
        }
    }

    pub async fn contains(&self, user_id: &str, post_id: &str) -> Result<bool> {
        Ok(self.user(user_id).await?.reading_list.contains(post_id))
    }

    /// 列表中的文章；已删除的文章会被跳过
    pub async fn list(&self, user_id: &str) -> Result<Vec<Post>> {
        let user = self.user(user_id).await?;
        let mut posts = Vec::with_capacity(user.reading_list.len());
        for post_id in &user.reading_list {
            match self.db.get_by_id::<Post>(collections::POSTS, post_id).await? {
                Some(post) => posts.push(post),
                None => debug!("Reading list of {} references missing post {}", user_id, post_id),
            }
        }
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }

    pub async fn count(&self, user_id: &str) -> Result<usize> {
        Ok(self.user(user_id).await?.reading_list.len())
    }

    async fn user(&self, user_id: &str) -> Result<User> {
        self.db
            .get_by_id(collections::USERS, user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }

    async fn apply(&self, user_id: &str, post_id: &str, add: bool) -> Result<SetUpdate> {
        let store = self.db.raw();
        let result = if add {
            store.set_add(collections::USERS, user_id, READING_LIST, post_id, None).await
        } else {
            store.set_remove(collections::USERS, user_id, READING_LIST, post_id, None).await
        };
        match result {
            Ok(update) => Ok(update),
            Err(StoreError::NotFound { .. }) => Err(AppError::not_found("User")),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{post::PostStatus, user::Profile};
    use chrono::Utc;

    async fn setup() -> ReadingListService {
        let db = Arc::new(Database::in_memory());
        let user = User::new(Some("u1".into()), Profile::default());
        db.create(collections::USERS, "u1", &user).await.unwrap();
        let post = Post {
            id: "p1".into(),
            title: "Saved".into(),
            byline: "By Ada".into(),
            content: "text".into(),
            image_url: None,
            author_id: "ada".into(),
            author_name: "Ada".into(),
            author_photo_url: None,
            slug: "saved-1".into(),
            category: None,
            keywords: vec![],
            tags: vec![],
            status: PostStatus::Published,
            reading_time: 1,
            like_count: 0,
            bookmark_count: 0,
            comment_count: 0,
            view_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        db.create(collections::POSTS, "p1", &post).await.unwrap();
        ReadingListService::new(db).await.unwrap()
    }

    #[tokio::test]
    async fn test_add_remove_toggle() {
        let service = setup().await;

        assert!(service.add("u1", "p1").await.unwrap());
        assert!(!service.add("u1", "p1").await.unwrap());
        assert_eq!(service.count("u1").await.unwrap(), 1);
        assert_eq!(service.list("u1").await.unwrap()[0].id, "p1");

        assert!(!service.toggle("u1", "p1").await.unwrap());
        assert!(!service.contains("u1", "p1").await.unwrap());
        assert!(!service.remove("u1", "p1").await.unwrap());
        assert!(service.toggle("u1", "p1").await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_user_or_post() {
        let service = setup().await;
        assert!(matches!(service.add("u1", "nope").await, Err(AppError::NotFound(_))));
        assert!(matches!(service.add("ghost", "p1").await, Err(AppError::NotFound(_))));
        assert!(matches!(service.count("ghost").await, Err(AppError::NotFound(_))));
    }
}
