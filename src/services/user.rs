use crate::{
    error::{AppError, Result},
    models::user::*,
    services::{
        database::{collections, Database},
        username::UsernameService,
    },
    storage::{Direction, Query},
    utils::{completion, validation::validate_display_name},
};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};
use validator::Validate;

#[derive(Clone)]
pub struct UserService {
    db: Arc<Database>,
    usernames: UsernameService,
}

impl UserService {
    pub async fn new(db: Arc<Database>, usernames: UsernameService) -> Result<Self> {
        Ok(Self { db, usernames })
    }

    /// 注册时创建用户记录，用户名自动分配
    pub async fn create_user(&self, request: CreateUserRequest) -> Result<User> {
        request.validate()?;
        validate_display_name(&request.name)?;

        debug!("Creating user for {}", request.email);

        let username = self.usernames.allocate(&request.email).await?;
        let profile = Profile {
            name: request.name.trim().to_string(),
            first_name: request.first_name,
            last_name: request.last_name,
            username: Some(username),
            email: request.email,
            photo_url: request.photo_url.filter(|url| !url.trim().is_empty()),
            ..Default::default()
        };
        let user = User::new(request.id, profile);

        if !self.db.create(collections::USERS, &user.id, &user).await? {
            return Err(AppError::Conflict(format!("User {} already exists", user.id)));
        }

        info!(
            "Created user {} (@{})",
            user.id,
            user.profile.username.as_deref().unwrap_or_default()
        );
        Ok(user)
    }

    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        self.db.get_by_id(collections::USERS, user_id).await
    }

    pub async fn require_user(&self, user_id: &str) -> Result<User> {
        self.get_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let normalized = username.trim().to_lowercase();
        self.db
            .find_one(collections::USERS, "username", &normalized)
            .await
    }

    /// 更新资料并重新计算完成度
    ///
    /// Only profile and derived fields are written, so follower sets and
    /// the reading list on the same document are left untouched.
    pub async fn update_profile(&self, user_id: &str, mut request: UpdateProfileRequest) -> Result<User> {
        request.validate()?;
        if let Some(name) = &request.name {
            validate_display_name(name)?;
        }

        let user = self.require_user(user_id).await?;

        // a blank username keeps the current one
        if let Some(username) = request.username.take().filter(|u| !u.trim().is_empty()) {
            let normalized = self.usernames.check_claimable(&username, Some(user_id)).await?;
            request.username = Some(normalized);
        }

        let mut profile = user.profile.clone();
        request.apply_to(&mut profile);

        let score = completion::score(&profile);
        let mut patch = serde_json::to_value(&profile)?;
        if let Value::Object(fields) = &mut patch {
            fields.insert("profile_completion_percentage".into(), json!(score));
            fields.insert("profile_complete".into(), json!(completion::is_complete(score)));
            fields.insert("updated_at".into(), json!(Utc::now()));
        }

        let updated: User = self
            .db
            .update_by_id_with_json(collections::USERS, user_id, patch)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        info!(
            "Updated profile for user {} (completion {}%)",
            user_id, updated.profile_completion_percentage
        );
        Ok(updated)
    }

    pub async fn get_users(&self, ids: &[String]) -> Result<Vec<User>> {
        let mut users = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(user) = self.get_user(id).await? {
                users.push(user);
            }
        }
        Ok(users)
    }

    pub async fn list_users(&self, limit: usize) -> Result<Vec<User>> {
        let query = Query::new()
            .order_by("created_at", Direction::Desc)
            .limit(limit);
        self.db.query(collections::USERS, &query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn service() -> UserService {
        let db = Arc::new(Database::in_memory());
        let usernames = UsernameService::new(db.clone()).await.unwrap();
        UserService::new(db, usernames).await.unwrap()
    }

    fn signup(id: &str, email: &str) -> CreateUserRequest {
        CreateUserRequest {
            id: Some(id.to_string()),
            name: "Ada Lovelace".to_string(),
            email: email.to_string(),
            first_name: None,
            last_name: None,
            photo_url: None,
        }
    }

    #[tokio::test]
    async fn test_signup_creates_incomplete_stub() {
        let service = service().await;
        let user = service.create_user(signup("u1", "ada@example.com")).await.unwrap();

        assert!(!user.profile_complete);
        assert!(user.profile.username.as_deref().unwrap().starts_with("ada-"));
        assert!(matches!(
            service.create_user(signup("u1", "other@example.com")).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_update_profile_rescores() {
        let service = service().await;
        service.create_user(signup("u1", "ada@example.com")).await.unwrap();

        let updated = service
            .update_profile(
                "u1",
                UpdateProfileRequest {
                    first_name: Some("Ada".into()),
                    last_name: Some("Lovelace".into()),
                    username: Some("Ada".into()),
                    country: Some("UK".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.profile.username.as_deref(), Some("ada"));
        assert_eq!(
            updated.profile_completion_percentage,
            completion::IDENTITY_WEIGHT + completion::COUNTRY_WEIGHT
        );
        assert_eq!(
            service.get_user_by_username("ADA").await.unwrap().map(|u| u.id),
            Some("u1".to_string())
        );
    }

    #[tokio::test]
    async fn test_update_rejects_reserved_and_taken_usernames() {
        let service = service().await;
        service.create_user(signup("u1", "ada@example.com")).await.unwrap();
        service.create_user(signup("u2", "grace@example.com")).await.unwrap();
        service
            .update_profile("u1", UpdateProfileRequest { username: Some("ada".into()), ..Default::default() })
            .await
            .unwrap();

        let taken = service
            .update_profile("u2", UpdateProfileRequest { username: Some("ada".into()), ..Default::default() })
            .await;
        assert!(matches!(taken, Err(AppError::Conflict(_))));

        let reserved = service
            .update_profile("u2", UpdateProfileRequest { username: Some("admin".into()), ..Default::default() })
            .await;
        assert!(matches!(reserved, Err(AppError::InvalidUsername(_))));
    }

    #[tokio::test]
    async fn test_clearing_fields_lowers_completion() {
        let service = service().await;
        service.create_user(signup("u1", "ada@example.com")).await.unwrap();

        let filled = service
            .update_profile(
                "u1",
                UpdateProfileRequest {
                    website: Some("https://ada.example.com".into()),
                    photo_url: Some(Some("https://cdn.example.com/ada.png".into())),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let before = filled.profile_completion_percentage;
        assert_eq!(before, completion::WEBSITE_WEIGHT + completion::PHOTO_WEIGHT);

        let without_website = service
            .update_profile(
                "u1",
                UpdateProfileRequest {
                    website: Some(String::new()),
                    username: Some(String::new()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(without_website.profile.website, None);
        assert_eq!(
            without_website.profile_completion_percentage,
            before - completion::WEBSITE_WEIGHT
        );
        assert_eq!(without_website.profile.username, filled.profile.username);

        let without_photo = service
            .update_profile(
                "u1",
                UpdateProfileRequest {
                    photo_url: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(without_photo.profile.photo_url, None);
        assert_eq!(without_photo.profile_completion_percentage, 0);
        assert!(matches!(
            service
                .update_profile(
                    "u1",
                    UpdateProfileRequest {
                        website: Some("not a url".into()),
                        ..Default::default()
                    },
                )
                .await,
            Err(AppError::ValidatorError(_))
        ));
    }
}
