use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    Follow,
    Like,
    Comment,
    Bookmark,
    NewArticle,
}

/// 通知记录，除 `read` 与 `deleted` 外不可变
///
/// Deletion only hides the record from its recipient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub recipient_id: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub actor_id: String,
    pub actor_name: String,
    pub actor_photo: Option<String>,
    pub post_id: Option<String>,
    pub post_title: Option<String>,
    pub post_slug: Option<String>,
    pub message: String,
    pub read: bool,
    #[serde(default)]
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNotificationRequest {
    pub recipient_id: String,
    pub notification_type: NotificationType,
    pub actor_id: String,
    pub actor_name: String,
    pub actor_photo: Option<String>,
    pub post_id: Option<String>,
    pub post_title: Option<String>,
    pub post_slug: Option<String>,
    pub message: String,
}

impl CreateNotificationRequest {
    pub fn follow(recipient_id: &str, actor_id: &str, actor_name: &str, actor_photo: Option<&str>) -> Self {
        Self {
            recipient_id: recipient_id.to_string(),
            notification_type: NotificationType::Follow,
            actor_id: actor_id.to_string(),
            actor_name: actor_name.to_string(),
            actor_photo: actor_photo.map(str::to_string),
            post_id: None,
            post_title: None,
            post_slug: None,
            message: format!("{} started following you", actor_name),
        }
    }
}
