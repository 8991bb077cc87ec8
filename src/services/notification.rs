use crate::{
    error::{AppError, Result},
    models::notification::*,
    services::database::{collections, Database},
    storage::{Direction, Query},
};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Clone)]
pub struct NotificationService {
    db: Arc<Database>,
}

impl NotificationService {
    pub async fn new(db: Arc<Database>) -> Result<Self> {
        Ok(Self { db })
    }

    pub async fn create_notification(&self, request: CreateNotificationRequest) -> Result<Notification> {
        debug!(
            "Creating {:?} notification for user {}",
            request.notification_type, request.recipient_id
        );

        let notification = Notification {
            id: Uuid::new_v4().to_string(),
            recipient_id: request.recipient_id,
            notification_type: request.notification_type,
            actor_id: request.actor_id,
            actor_name: request.actor_name,
            actor_photo: request.actor_photo,
            post_id: request.post_id,
            post_title: request.post_title,
            post_slug: request.post_slug,
            message: request.message,
            read: false,
            deleted: false,
            created_at: Utc::now(),
        };

        self.db
            .create(collections::NOTIFICATIONS, &notification.id, &notification)
            .await?;

        Ok(notification)
    }

    /// 用户的通知，按时间倒序
    pub async fn list_for_user(&self, user_id: &str, limit: usize) -> Result<Vec<Notification>> {
        let query = Query::new()
            .filter_eq("recipient_id", user_id)
            .filter_eq("deleted", false)
            .order_by("created_at", Direction::Desc)
            .limit(limit);
        self.db.query(collections::NOTIFICATIONS, &query).await
    }

    pub async fn unread_count(&self, user_id: &str) -> Result<usize> {
        let query = Query::new()
            .filter_eq("recipient_id", user_id)
            .filter_eq("read", false)
            .filter_eq("deleted", false);
        let unread: Vec<Notification> = self.db.query(collections::NOTIFICATIONS, &query).await?;
        Ok(unread.len())
    }

    async fn owned(&self, notification_id: &str, user_id: &str) -> Result<Notification> {
        let notification: Notification = self
            .db
            .get_by_id(collections::NOTIFICATIONS, notification_id)
            .await?
            .filter(|n: &Notification| !n.deleted)
            .ok_or_else(|| AppError::not_found("Notification"))?;

        if notification.recipient_id != user_id {
            return Err(AppError::forbidden("Cannot modify another user's notification"));
        }
        Ok(notification)
    }

    /// 标记为已读；只能由接收者操作
    pub async fn mark_as_read(&self, notification_id: &str, user_id: &str) -> Result<()> {
        let notification = self.owned(notification_id, user_id).await?;

        if !notification.read {
            let _: Option<Notification> = self
                .db
                .update_by_id_with_json(collections::NOTIFICATIONS, notification_id, json!({"read": true}))
                .await?;
        }

        Ok(())
    }

    pub async fn mark_all_as_read(&self, user_id: &str) -> Result<usize> {
        let query = Query::new()
            .filter_eq("recipient_id", user_id)
            .filter_eq("read", false)
            .filter_eq("deleted", false);
        let unread: Vec<Notification> = self.db.query(collections::NOTIFICATIONS, &query).await?;

        for notification in &unread {
            let _: Option<Notification> = self
                .db
                .update_by_id_with_json(collections::NOTIFICATIONS, &notification.id, json!({"read": true}))
                .await?;
        }

        info!("Marked {} notifications as read for user {}", unread.len(), user_id);
        Ok(unread.len())
    }

    /// 删除通知（软删除）
    pub async fn delete_notification(&self, notification_id: &str, user_id: &str) -> Result<()> {
        self.owned(notification_id, user_id).await?;
        let _: Option<Notification> = self
            .db
            .update_by_id_with_json(collections::NOTIFICATIONS, notification_id, json!({"deleted": true}))
            .await?;
        debug!("Deleted notification {} for user {}", notification_id, user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn service() -> NotificationService {
        NotificationService::new(Arc::new(Database::in_memory())).await.unwrap()
    }

    #[tokio::test]
    async fn test_read_flag_lifecycle() {
        let service = service().await;
        let first = service
            .create_notification(CreateNotificationRequest::follow("bob", "ada", "Ada", None))
            .await
            .unwrap();
        service
            .create_notification(CreateNotificationRequest::follow("bob", "eve", "Eve", None))
            .await
            .unwrap();

        assert_eq!(service.unread_count("bob").await.unwrap(), 2);
        assert!(service.mark_as_read(&first.id, "eve").await.is_err());

        service.mark_as_read(&first.id, "bob").await.unwrap();
        assert_eq!(service.unread_count("bob").await.unwrap(), 1);

        assert_eq!(service.mark_all_as_read("bob").await.unwrap(), 1);
        assert_eq!(service.unread_count("bob").await.unwrap(), 0);
        assert_eq!(service.list_for_user("bob", 10).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_deleted_notifications_are_hidden() {
        let service = service().await;
        let first = service
            .create_notification(CreateNotificationRequest::follow("bob", "ada", "Ada", None))
            .await
            .unwrap();
        service
            .create_notification(CreateNotificationRequest::follow("bob", "eve", "Eve", None))
            .await
            .unwrap();

        assert!(matches!(
            service.delete_notification(&first.id, "eve").await,
            Err(AppError::Authorization(_))
        ));
        service.delete_notification(&first.id, "bob").await.unwrap();

        let remaining = service.list_for_user("bob", 10).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_ne!(remaining[0].id, first.id);
        assert_eq!(service.unread_count("bob").await.unwrap(), 1);
        assert!(matches!(
            service.mark_as_read(&first.id, "bob").await,
            Err(AppError::NotFound(_))
        ));
        assert_eq!(service.mark_all_as_read("bob").await.unwrap(), 1);
    }
}
