use chrono::{DateTime, Utc};
use rand::Rng;

const MAX_SLUG_LEN: usize = 100;

/// 从标题生成 URL 友好的 slug
pub fn generate_slug(title: &str) -> String {
    let mut slug = slug::slugify(title);

    if slug.len() > MAX_SLUG_LEN {
        slug.truncate(MAX_SLUG_LEN);
        // 避免在单词中间截断
        if let Some(last_hyphen) = slug.rfind('-') {
            if last_hyphen > MAX_SLUG_LEN / 2 {
                slug.truncate(last_hyphen);
            }
        }
        slug = slug.trim_end_matches('-').to_string();
    }

    if slug.is_empty() {
        slug = "untitled".to_string();
    }

    slug
}

/// 文章 slug: `{slugified title}-{创建时间毫秒}`
pub fn post_slug(title: &str, created_at: DateTime<Utc>) -> String {
    format!("{}-{}", generate_slug(title), created_at.timestamp_millis())
}

/// Appended when two posts with the same title land in the same millisecond.
pub fn with_random_suffix(slug: &str) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(1000..10000);
    format!("{}-{}", slug, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_generate_slug() {
        assert_eq!(generate_slug("Hello World"), "hello-world");
        assert_eq!(generate_slug("JavaScript: The Good Parts"), "javascript-the-good-parts");
        assert_eq!(generate_slug("Hello, World! How are you?"), "hello-world-how-are-you");
        assert_eq!(generate_slug(""), "untitled");
        assert_eq!(generate_slug("---"), "untitled");
    }

    #[test]
    fn test_long_titles_are_capped() {
        let title = "word ".repeat(60);
        let slug = generate_slug(&title);
        assert!(slug.len() <= MAX_SLUG_LEN);
        assert!(!slug.ends_with('-'));
    }

    #[test]
    fn test_post_slug_carries_millis() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(post_slug("Rust & Friends", at), "rust-friends-1700000000123");
    }

    #[test]
    fn test_random_suffix() {
        let slug = with_random_suffix("a-1");
        assert!(slug.starts_with("a-1-"));
        assert_eq!(slug.len(), "a-1-".len() + 4);
    }
}
