use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
}

/// 文章分类表
pub static CATEGORIES: &[CategoryInfo] = &[
    CategoryInfo { name: "Technology", description: "Latest in tech, AI, and innovation", icon: "💻" },
    CategoryInfo { name: "Philosophy", description: "Deep thoughts and philosophical insights", icon: "🤔" },
    CategoryInfo { name: "Startups", description: "Entrepreneurship and startup stories", icon: "🚀" },
    CategoryInfo { name: "Culture", description: "Arts, society, and cultural commentary", icon: "🎨" },
    CategoryInfo { name: "Design", description: "UI/UX, graphics, and design thinking", icon: "✨" },
    CategoryInfo { name: "Science", description: "Scientific discoveries and research", icon: "🔬" },
    CategoryInfo { name: "Business", description: "Business strategy and insights", icon: "💼" },
    CategoryInfo { name: "Health", description: "Wellness, fitness, and health tips", icon: "🏥" },
];

/// Case-insensitive lookup by category name.
pub fn find(name: &str) -> Option<&'static CategoryInfo> {
    CATEGORIES
        .iter()
        .find(|category| category.name.eq_ignore_ascii_case(name.trim()))
}
