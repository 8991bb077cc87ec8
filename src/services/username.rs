use crate::{
    error::{AppError, Result},
    models::user::User,
    services::database::{collections, Database},
    utils::validation::{normalize_username, validate_username},
};
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, warn};

const GENERATED_BASE_MAX_LEN: usize = 20;
const SUGGESTION_BASE_MAX_LEN: usize = 20;
const MAX_SUGGESTIONS: usize = 5;
const MAX_ALLOCATION_ATTEMPTS: usize = 10;
const SUGGESTION_WORDS: [&str; 5] = ["writes", "creates", "author", "writer", "blog"];

static DISALLOWED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9\s-]").expect("static pattern is valid"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static pattern is valid"));
static HYPHENS: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+").expect("static pattern is valid"));

/// 用户名分配与可用性检查
#[derive(Clone)]
pub struct UsernameService {
    db: Arc<Database>,
}

impl UsernameService {
    pub async fn new(db: Arc<Database>) -> Result<Self> {
        Ok(Self { db })
    }

    /// 没有任何用户使用该用户名（忽略大小写）
    pub async fn is_available(&self, candidate: &str) -> Result<bool> {
        let normalized = normalize_username(candidate);
        let existing: Option<User> = self
            .db
            .find_one(collections::USERS, "username", &normalized)
            .await?;
        Ok(existing.is_none())
    }

    /// Valid, available, and not already claimed by `owner`.
    pub async fn check_claimable(&self, candidate: &str, owner: Option<&str>) -> Result<String> {
        let normalized = normalize_username(candidate);
        validate_username(&normalized)?;

        let existing: Option<User> = self
            .db
            .find_one(collections::USERS, "username", &normalized)
            .await?;
        match existing {
            Some(user) if Some(user.id.as_str()) != owner => Err(AppError::Conflict(format!(
                "Username `{}` is already taken",
                normalized
            ))),
            _ => Ok(normalized),
        }
    }

    /// 最多 5 个可用的候选用户名
    pub async fn suggest_alternatives(&self, base: &str) -> Result<Vec<String>> {
        let base: String = base
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
            .take(SUGGESTION_BASE_MAX_LEN)
            .collect();

        let candidates = std::iter::once(base.clone())
            .chain((1..=99).map(|n| format!("{}{}", base, n)))
            .chain(SUGGESTION_WORDS.iter().map(|word| format!("{}_{}", base, word)));

        let mut suggestions = Vec::with_capacity(MAX_SUGGESTIONS);
        for candidate in candidates {
            if suggestions.len() >= MAX_SUGGESTIONS {
                break;
            }
            if validate_username(&candidate).is_err() {
                continue;
            }
            if self.is_available(&candidate).await? {
                suggestions.push(candidate);
            }
        }

        debug!("Suggested {} usernames for base `{}`", suggestions.len(), base);
        Ok(suggestions)
    }

    /// 注册时分配用户名
    pub async fn allocate(&self, seed: &str) -> Result<String> {
        for _ in 0..MAX_ALLOCATION_ATTEMPTS {
            let candidate = generate(seed);
            if validate_username(&candidate).is_ok() && self.is_available(&candidate).await? {
                return Ok(candidate);
            }
        }

        warn!("Random username allocation exhausted for seed `{}`", seed);
        self.suggest_alternatives(&generate_base(seed))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::conflict("Unable to allocate a username"))
    }
}

fn generate_base(seed: &str) -> String {
    let local = match seed.split_once('@') {
        Some((local, _)) => local,
        None => seed,
    };
    let lowered = local.to_lowercase();
    let stripped = DISALLOWED.replace_all(&lowered, "");
    let hyphenated = WHITESPACE.replace_all(stripped.trim(), "-");
    let collapsed = HYPHENS.replace_all(&hyphenated, "-");

    let base: String = collapsed
        .trim_matches('-')
        .chars()
        .take(GENERATED_BASE_MAX_LEN)
        .collect();
    let base = base.trim_end_matches('-');

    if base.is_empty() {
        "user".to_string()
    } else {
        base.to_string()
    }
}

/// 由名称或邮箱生成用户名，不保证唯一
pub fn generate(seed: &str) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..10000);
    format!("{}-{}", generate_base(seed), suffix)
}
