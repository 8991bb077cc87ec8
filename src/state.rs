use crate::{
    config::Config,
    error::Result,
    services::{
        database::Database, AnalyticsService, EngagementService, FeedService, FollowService, MediaService,
        NotificationService, PostService, ReadingListService, RecommendationService,
        SearchService, UserService, UsernameService,
    },
};
use std::sync::Arc;

/// 列表接口单次返回的最大条数
pub const MAX_PAGE_SIZE: usize = 100;

/// 应用程序的共享状态
/// 包含所有服务和配置的引用
#[derive(Clone)]
pub struct AppState {
    /// 应用配置
    pub config: Config,

    /// 数据库连接
    pub db: Arc<Database>,

    pub user_service: UserService,
    pub username_service: UsernameService,
    pub post_service: PostService,
    pub engagement_service: EngagementService,
    pub reading_list_service: ReadingListService,
    pub follow_service: FollowService,
    pub feed_service: FeedService,
    pub notification_service: NotificationService,
    pub search_service: SearchService,
    pub media_service: MediaService,
    pub recommendation_service: RecommendationService,
    pub analytics_service: AnalyticsService,
}

impl AppState {
    /// 根据配置连接数据库并初始化所有服务
    pub async fn new(config: Config) -> Result<Self> {
        let db = Arc::new(Database::new(&config).await?);
        let media_service = MediaService::new(&config).await?;
        let recommendation_service = RecommendationService::new(&config).await?;
        Self::assemble(config, db, media_service, recommendation_service).await
    }

    /// Wires the services around already-built collaborators.
    pub async fn assemble(
        config: Config,
        db: Arc<Database>,
        media_service: MediaService,
        recommendation_service: RecommendationService,
    ) -> Result<Self> {
        let username_service = UsernameService::new(db.clone()).await?;
        let user_service = UserService::new(db.clone(), username_service.clone()).await?;
        let notification_service = NotificationService::new(db.clone()).await?;
        let engagement_service = EngagementService::new(db.clone()).await?;
        let reading_list_service = ReadingListService::new(db.clone()).await?;
        let follow_service = FollowService::new(db.clone(), notification_service.clone()).await?;
        let feed_service =
            FeedService::new(db.clone(), follow_service.clone(), config.feed_source_size).await?;
        let analytics_service = AnalyticsService::new(db.clone(), engagement_service.clone()).await?;
        let search_service = SearchService::new(db.clone(), config.search_max_results).await?;
        let post_service = PostService::new(
            db.clone(),
            user_service.clone(),
            engagement_service.clone(),
            media_service.clone(),
        )
        .await?;

        Ok(Self {
            config,
            db,
            user_service,
            username_service,
            post_service,
            engagement_service,
            reading_list_service,
            follow_service,
            feed_service,
            notification_service,
            search_service,
            media_service,
            recommendation_service,
            analytics_service,
        })
    }

    /// 检查是否为生产环境
    pub fn is_production(&self) -> bool {
        self.config.is_production()
    }

    /// 请求未指定数量时使用默认信息流长度
    pub fn page_limit(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.config.feed_default_limit)
            .min(MAX_PAGE_SIZE)
    }
}
