use crate::{
    error::{AppError, Result},
    models::{follow::FollowStats, notification::CreateNotificationRequest, user::User},
    services::{
        database::{collections, Database},
        notification::NotificationService,
    },
    storage::{SetUpdate, StoreError},
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

const FOLLOWERS: &str = "followers";
const FOLLOWING: &str = "following";
const FOLLOWER_COUNT: &str = "follower_count";
const FOLLOWING_COUNT: &str = "following_count";

/// 关注关系
///
/// An edge `actor -> target` lives on both documents: `actor.following`
/// and `target.followers`. Each side is written with its count in one
/// atomic update; the pair is kept consistent by compensation.
#[derive(Clone)]
pub struct FollowService {
    db: Arc<Database>,
    notification_service: NotificationService,
}

impl FollowService {
    pub async fn new(db: Arc<Database>, notification_service: NotificationService) -> Result<Self> {
        Ok(Self {
            db,
            notification_service,
        })
    }

    pub async fn follow(
        &self,
        actor_id: &str,
        target_id: &str,
        actor_name: &str,
        actor_photo: Option<&str>,
    ) -> Result<()> {
        debug!("User {} following user {}", actor_id, target_id);

        // 防止自己关注自己
        if actor_id == target_id {
            return Err(AppError::SelfFollow);
        }

        let actor = self.require_user(actor_id).await?;
        let target = self.require_user(target_id).await?;

        if actor.following.contains(target_id) {
            if !target.followers.contains(actor_id) {
                warn!(actor_id, target_id, "Follow edge missing on target side");
            }
            return Err(AppError::AlreadyFollowing(target_id.to_string()));
        }

        let first = self.edge(actor_id, FOLLOWING, target_id, FOLLOWING_COUNT, true).await?;
        if !first.changed {
            // 并发请求已经建立关注
            return Err(AppError::AlreadyFollowing(target_id.to_string()));
        }

        if let Err(e) = self.edge(target_id, FOLLOWERS, actor_id, FOLLOWER_COUNT, true).await {
            error!(
                actor_id, target_id, error = %e,
                "Failed to record follower, rolling back following entry"
            );
            if let Err(rollback) = self.edge(actor_id, FOLLOWING, target_id, FOLLOWING_COUNT, false).await {
                error!(actor_id, target_id, error = %rollback, "Failed to roll back following entry");
            }
            return Err(e);
        }

        // 通知失败不影响关注结果
        let notification = CreateNotificationRequest::follow(target_id, actor_id, actor_name, actor_photo);
        if let Err(e) = self.notification_service.create_notification(notification).await {
            warn!(actor_id, target_id, error = %e, "Failed to send follow notification");
        }

        info!("User {} followed user {}", actor_id, target_id);
        Ok(())
    }

    /// 幂等：关系不存在时什么也不做
    pub async fn unfollow(&self, actor_id: &str, target_id: &str) -> Result<()> {
        debug!("User {} unfollowing user {}", actor_id, target_id);

        let first = self.edge(actor_id, FOLLOWING, target_id, FOLLOWING_COUNT, false).await?;

        let second = match self.edge(target_id, FOLLOWERS, actor_id, FOLLOWER_COUNT, false).await {
            Ok(update) => update,
            Err(AppError::NotFound(_)) => {
                warn!(actor_id, target_id, "Unfollowed user no longer exists");
                SetUpdate { changed: false, len: 0 }
            }
            Err(e) => {
                error!(
                    actor_id, target_id, error = %e,
                    "Failed to remove follower, restoring following entry"
                );
                if first.changed {
                    if let Err(restore) = self.edge(actor_id, FOLLOWING, target_id, FOLLOWING_COUNT, true).await {
                        error!(actor_id, target_id, error = %restore, "Failed to restore following entry");
                    }
                }
                return Err(e);
            }
        };

        match (first.changed, second.changed) {
            (true, true) => info!("User {} unfollowed user {}", actor_id, target_id),
            (false, false) => debug!("User {} was not following user {}", actor_id, target_id),
            _ => warn!(
                actor_id,
                target_id,
                following_side = first.changed,
                follower_side = second.changed,
                "Half follow edge removed"
            ),
        }
        Ok(())
    }

    pub async fn is_following(&self, actor_id: &str, target_id: &str) -> Result<bool> {
        Ok(self
            .get_user(actor_id)
            .await?
            .map(|user| user.following.contains(target_id))
            .unwrap_or(false))
    }

    pub async fn followers(&self, user_id: &str) -> Result<BTreeSet<String>> {
        Ok(self.get_user(user_id).await?.map(|u| u.followers).unwrap_or_default())
    }

    pub async fn following(&self, user_id: &str) -> Result<BTreeSet<String>> {
        Ok(self.get_user(user_id).await?.map(|u| u.following).unwrap_or_default())
    }

    /// `viewer` 与 `user_id` 之间的关注概览
    pub async fn relationship(&self, viewer_id: Option<&str>, user_id: &str) -> Result<FollowStats> {
        let user = self.require_user(user_id).await?;
        let (is_following, is_followed_by) = match viewer_id {
            Some(viewer) if viewer != user_id => {
                (user.followers.contains(viewer), user.following.contains(viewer))
            }
            _ => (false, false),
        };

        Ok(FollowStats {
            followers_count: user.follower_count,
            following_count: user.following_count,
            is_following,
            is_followed_by,
        })
    }

    /// 两人都关注的用户
    pub async fn mutual_following(&self, a: &str, b: &str) -> Result<Vec<String>> {
        let a = self.following(a).await?;
        let b = self.following(b).await?;
        Ok(a.intersection(&b).cloned().collect())
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        self.db.get_by_id(collections::USERS, user_id).await
    }

    async fn require_user(&self, user_id: &str) -> Result<User> {
        self.get_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }

    async fn edge(&self, user_id: &str, field: &str, member: &str, count_field: &str, add: bool) -> Result<SetUpdate> {
        let store = self.db.raw();
        let result = if add {
            store.set_add(collections::USERS, user_id, field, member, Some(count_field)).await
        } else {
            store.set_remove(collections::USERS, user_id, field, member, Some(count_field)).await
        };
        match result {
            Ok(update) => Ok(update),
            Err(StoreError::NotFound { .. }) => Err(AppError::not_found("User")),
            Err(e) => Err(e.into()),
        }
    }
}
