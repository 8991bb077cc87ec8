use serde::{Deserialize, Serialize};

use crate::models::{post::Post, user::UserSummary};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResults {
    pub authors: Vec<UserSummary>,
    pub articles: Vec<Post>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    pub limit: Option<usize>,
}
