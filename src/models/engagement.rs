use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::services::database::collections;

/// 可切换的互动类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngagementKind {
    Like,
    Bookmark,
}

impl EngagementKind {
    pub const ALL: [EngagementKind; 2] = [EngagementKind::Like, EngagementKind::Bookmark];

    /// Ledger collection holding the membership records.
    pub fn collection(&self) -> &'static str {
        match self {
            Self::Like => collections::LIKES,
            Self::Bookmark => collections::BOOKMARKS,
        }
    }

    /// Counter on the post document mirroring the ledger.
    pub fn counter_field(&self) -> &'static str {
        match self {
            Self::Like => "like_count",
            Self::Bookmark => "bookmark_count",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Bookmark => "bookmark",
        }
    }
}

impl fmt::Display for EngagementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngagementKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" | "likes" => Ok(Self::Like),
            "bookmark" | "bookmarks" => Ok(Self::Bookmark),
            other => Err(format!("unknown engagement kind `{}`", other)),
        }
    }
}

/// Like / Bookmark 账本记录，每个 (user, post) 至多一条
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngagementRecord {
    /// `{user_id}_{post_id}`
    pub id: String,
    pub user_id: String,
    pub post_id: String,
    pub created_at: DateTime<Utc>,
}

impl EngagementRecord {
    pub fn new(user_id: &str, post_id: &str) -> Self {
        Self {
            id: Self::key(user_id, post_id),
            user_id: user_id.to_string(),
            post_id: post_id.to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn key(user_id: &str, post_id: &str) -> String {
        format!("{}_{}", user_id, post_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleResponse {
    pub kind: EngagementKind,
    pub post_id: String,
    pub active: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngagementStatus {
    pub liked: bool,
    pub bookmarked: bool,
    pub in_reading_list: bool,
}
