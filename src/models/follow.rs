use serde::{Deserialize, Serialize};

/// 两个用户之间的关注关系概览
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowStats {
    pub followers_count: i64,
    pub following_count: i64,
    pub is_following: bool,
    pub is_followed_by: bool,
}
