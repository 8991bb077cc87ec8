pub mod analytics;
pub mod database;
pub mod engagement;
pub mod feed;
pub mod follow;
pub mod media;
pub mod notification;
pub mod post;
pub mod reading_list;
pub mod recommendation;
pub mod search;
pub mod user;
pub mod username;

// 重新导出常用类型
pub use analytics::AnalyticsService;
pub use database::Database;
pub use engagement::EngagementService;
pub use feed::FeedService;
pub use follow::FollowService;
pub use media::MediaService;
pub use notification::NotificationService;
pub use post::PostService;
pub use reading_list::ReadingListService;
pub use recommendation::RecommendationService;
pub use search::SearchService;
pub use user::UserService;
pub use username::UsernameService;
