use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::utils::completion;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Gender {
    Male,
    Female,
    Other,
    PreferNotToSay,
}

/// 用户可编辑的资料字段
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    /// 显示名称
    pub name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Always stored lowercase.
    pub username: Option<String>,
    pub email: String,
    pub photo_url: Option<String>,
    pub bio: Option<String>,
    pub long_bio: Option<String>,
    pub gender: Option<Gender>,
    /// Legacy free-text location, kept alongside country/state/city.
    pub location: Option<String>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub website: Option<String>,
    pub twitter: Option<String>,
    pub linkedin: Option<String>,
    pub medium: Option<String>,
    pub pronouns: Option<String>,
    pub timezone: Option<String>,
}

/// `users` 集合中的文档
///
/// `follower_count`/`following_count` mirror the cardinality of the two
/// sets and are only written together with them. The completion fields are
/// derived from `profile` and recomputed on every profile write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(flatten)]
    pub profile: Profile,
    #[serde(default)]
    pub followers: BTreeSet<String>,
    #[serde(default)]
    pub following: BTreeSet<String>,
    #[serde(default)]
    pub follower_count: i64,
    #[serde(default)]
    pub following_count: i64,
    #[serde(default)]
    pub reading_list: BTreeSet<String>,
    #[serde(default)]
    pub profile_completion_percentage: u8,
    #[serde(default)]
    pub profile_complete: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// 注册时创建的最小用户记录
    pub fn new(id: Option<String>, profile: Profile) -> Self {
        let now = Utc::now();
        let mut user = Self {
            id: id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            profile,
            followers: BTreeSet::new(),
            following: BTreeSet::new(),
            follower_count: 0,
            following_count: 0,
            reading_list: BTreeSet::new(),
            profile_completion_percentage: 0,
            profile_complete: false,
            created_at: now,
            updated_at: now,
        };
        user.refresh_completion();
        user
    }

    pub fn refresh_completion(&mut self) {
        let score = completion::score(&self.profile);
        self.profile_completion_percentage = score;
        self.profile_complete = completion::is_complete(score);
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id.clone(),
            username: self.profile.username.clone(),
            name: self.profile.name.clone(),
            photo_url: self.profile.photo_url.clone(),
            bio: self.profile.bio.clone(),
            follower_count: self.follower_count,
        }
    }
}

/// 列表/搜索结果中展示的用户摘要
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: String,
    pub username: Option<String>,
    pub name: String,
    pub photo_url: Option<String>,
    pub bio: Option<String>,
    pub follower_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateUserRequest {
    /// Id issued by the auth provider; generated when absent.
    pub id: Option<String>,

    #[validate(length(min = 1, max = 50))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(max = 50))]
    pub first_name: Option<String>,

    #[validate(length(max = 50))]
    pub last_name: Option<String>,

    #[validate(custom = "blank_or_url")]
    pub photo_url: Option<String>,
}

/// 资料的部分更新
///
/// An absent field keeps the stored value and a blank string clears it.
/// `photo_url` also accepts an explicit `null` to remove the photo.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_photo_url"))]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 50))]
    pub name: Option<String>,

    #[validate(length(max = 50))]
    pub first_name: Option<String>,

    #[validate(length(max = 50))]
    pub last_name: Option<String>,

    pub username: Option<String>,

    #[validate(length(max = 160))]
    pub bio: Option<String>,

    #[validate(length(max = 2000))]
    pub long_bio: Option<String>,

    pub gender: Option<Gender>,

    #[validate(length(max = 100))]
    pub location: Option<String>,

    #[validate(length(max = 100))]
    pub country: Option<String>,

    #[validate(length(max = 100))]
    pub state: Option<String>,

    #[validate(length(max = 100))]
    pub city: Option<String>,

    #[validate(custom = "blank_or_url")]
    pub website: Option<String>,

    #[validate(length(max = 100))]
    pub twitter: Option<String>,

    #[validate(length(max = 200))]
    pub linkedin: Option<String>,

    #[validate(length(max = 200))]
    pub medium: Option<String>,

    #[validate(length(max = 30))]
    pub pronouns: Option<String>,

    #[validate(length(max = 50))]
    pub timezone: Option<String>,

    #[serde(default, deserialize_with = "present")]
    pub photo_url: Option<Option<String>>,
}

/// Empty input is accepted so that forms can submit cleared fields.
fn blank_or_url(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    if value.is_empty() || url::Url::parse(value).is_ok() {
        Ok(())
    } else {
        Err(ValidationError::new("url"))
    }
}

fn validate_photo_url(request: &UpdateProfileRequest) -> Result<(), ValidationError> {
    match &request.photo_url {
        Some(Some(url)) => blank_or_url(url),
        _ => Ok(()),
    }
}

/// 区分字段缺失与显式 `null`
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn non_blank(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

impl UpdateProfileRequest {
    /// Overlays the provided fields onto `profile`. The username is expected
    /// to be normalized and validated by the caller.
    pub fn apply_to(&self, profile: &mut Profile) {
        fn overlay(target: &mut Option<String>, value: &Option<String>) {
            if let Some(value) = value {
                *target = non_blank(value);
            }
        }

        if let Some(name) = &self.name {
            profile.name = name.clone();
        }
        overlay(&mut profile.first_name, &self.first_name);
        overlay(&mut profile.last_name, &self.last_name);
        overlay(&mut profile.username, &self.username);
        overlay(&mut profile.bio, &self.bio);
        overlay(&mut profile.long_bio, &self.long_bio);
        if let Some(gender) = self.gender {
            profile.gender = Some(gender);
        }
        overlay(&mut profile.location, &self.location);
        overlay(&mut profile.country, &self.country);
        overlay(&mut profile.state, &self.state);
        overlay(&mut profile.city, &self.city);
        overlay(&mut profile.website, &self.website);
        overlay(&mut profile.twitter, &self.twitter);
        overlay(&mut profile.linkedin, &self.linkedin);
        overlay(&mut profile.medium, &self.medium);
        overlay(&mut profile.pronouns, &self.pronouns);
        overlay(&mut profile.timezone, &self.timezone);
        if let Some(photo_url) = &self.photo_url {
            profile.photo_url = photo_url.as_deref().and_then(non_blank);
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_is_incomplete_stub() {
        let user = User::new(
            None,
            Profile {
                name: "Ada Lovelace".into(),
                email: "ada@example.com".into(),
                ..Default::default()
            },
        );
        assert!(!user.profile_complete);
        assert_eq!(user.profile_completion_percentage, 0);
        assert_eq!(user.follower_count, 0);
        assert!(user.followers.is_empty());
    }

    #[test]
    fn test_apply_keeps_untouched_fields() {
        let mut profile = Profile {
            name: "Ada".into(),
            bio: Some("Mathematician and writer".into()),
            ..Default::default()
        };
        let update = UpdateProfileRequest {
            country: Some("UK".into()),
            ..Default::default()
        };
        update.apply_to(&mut profile);
        assert_eq!(profile.bio.as_deref(), Some("Mathematician and writer"));
        assert_eq!(profile.country.as_deref(), Some("UK"));
        assert_eq!(profile.name, "Ada");
    }

    #[test]
    fn test_apply_clears_blank_fields() {
        let mut profile = Profile {
            name: "Ada".into(),
            website: Some("https://ada.example.com".into()),
            photo_url: Some("https://cdn.example.com/ada.png".into()),
            country: Some("UK".into()),
            ..Default::default()
        };
        let update = UpdateProfileRequest {
            website: Some("  ".into()),
            photo_url: Some(None),
            ..Default::default()
        };
        update.apply_to(&mut profile);
        assert_eq!(profile.website, None);
        assert_eq!(profile.photo_url, None);
        assert_eq!(profile.country.as_deref(), Some("UK"));
    }

    #[test]
    fn test_update_request_distinguishes_null_from_missing() {
        let missing: UpdateProfileRequest = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(missing.photo_url, None);

        let cleared: UpdateProfileRequest =
            serde_json::from_value(serde_json::json!({ "photo_url": null, "website": "" })).unwrap();
        assert_eq!(cleared.photo_url, Some(None));
        assert!(cleared.validate().is_ok());

        let bad: UpdateProfileRequest =
            serde_json::from_value(serde_json::json!({ "website": "not a url" })).unwrap();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_user_document_round_trip_flattens_profile() {
        let user = User::new(
            Some("u1".into()),
            Profile {
                name: "Ada".into(),
                username: Some("ada".into()),
                ..Default::default()
            },
        );
        let doc = serde_json::to_value(&user).unwrap();
        assert_eq!(doc["username"], "ada");
        assert_eq!(doc["follower_count"], 0);

        let back: User = serde_json::from_value(doc).unwrap();
        assert_eq!(back.profile.username.as_deref(), Some("ada"));
    }
}
