use crate::error::{AppError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use thiserror::Error;

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 30;

static USERNAME_CHARSET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9_-]+$").expect("username charset pattern is valid")
});

/// 保留用户名，不可注册
pub static RESERVED_USERNAMES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "admin", "api", "settings", "profile", "login", "signup", "write", "search", "about",
        "contact", "privacy", "terms", "post", "posts", "help", "support", "faq", "blog", "news",
        "home", "index", "account", "user", "users", "auth", "signin", "signout", "register",
        "logout", "password", "reset", "verify", "confirm", "app", "www", "mail", "email",
        "static", "assets", "cdn", "img", "images", "uploads", "files", "download", "downloads",
        "legal", "tos", "dmca", "copyright", "trademark", "community", "forum", "discuss",
        "feedback", "report", "explore", "trending", "popular", "latest", "featured",
        "categories", "tags", "topics", "authors", "inkwell", "official", "staff", "team",
        "moderator", "mod", "administrator", "root", "system", "null", "undefined", "test",
        "demo",
    ]
    .into_iter()
    .collect()
});

/// 用户名校验失败的原因
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsernameError {
    #[error("username must be at least 3 characters")]
    TooShort,

    #[error("username must be at most 30 characters")]
    TooLong,

    #[error("username may only contain lowercase letters, digits, `_` and `-`")]
    InvalidCharacters,

    #[error("username cannot start or end with `_` or `-`")]
    EdgeSeparator,

    #[error("username is reserved")]
    Reserved,
}

pub fn is_reserved(candidate: &str) -> bool {
    RESERVED_USERNAMES.contains(candidate)
}

/// 校验用户名格式，调用方负责先转小写
pub fn validate_username(candidate: &str) -> std::result::Result<(), UsernameError> {
    let len = candidate.chars().count();
    if len < USERNAME_MIN_LEN {
        return Err(UsernameError::TooShort);
    }
    if len > USERNAME_MAX_LEN {
        return Err(UsernameError::TooLong);
    }
    if !USERNAME_CHARSET.is_match(candidate) {
        return Err(UsernameError::InvalidCharacters);
    }
    if candidate.starts_with(['-', '_']) || candidate.ends_with(['-', '_']) {
        return Err(UsernameError::EdgeSeparator);
    }
    if is_reserved(candidate) {
        return Err(UsernameError::Reserved);
    }
    Ok(())
}

pub fn normalize_username(candidate: &str) -> String {
    candidate.trim().to_lowercase()
}

/// 邮箱验证工具函数
pub fn validate_email(email: &str) -> bool {
    validator::validate_email(email)
}

/// 验证邮箱并返回详细错误信息
pub fn validate_email_format(email: &str) -> Result<()> {
    if email.trim().is_empty() {
        return Err(AppError::Validation("Email cannot be empty".to_string()));
    }

    if !validator::validate_email(email) {
        return Err(AppError::Validation("Invalid email format".to_string()));
    }

    if email.len() > 254 {
        return Err(AppError::Validation("Email address is too long".to_string()));
    }

    Ok(())
}

/// 验证显示名称格式
pub fn validate_display_name(display_name: &str) -> Result<()> {
    if display_name.trim().is_empty() {
        return Err(AppError::Validation("Display name cannot be empty".to_string()));
    }

    if display_name.chars().count() > 50 {
        return Err(AppError::Validation(
            "Display name cannot exceed 50 characters".to_string(),
        ));
    }

    Ok(())
}
