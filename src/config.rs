use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub server_host: String,
    pub server_port: u16,
    pub environment: String,
    pub log_level: String,

    // Database configuration
    /// `memory` or `surrealdb`
    pub storage_backend: String,
    pub database_url: String,
    pub database_namespace: String,
    pub database_name: String,
    pub database_username: String,
    pub database_password: String,

    // Media storage
    pub media_root: String,
    pub media_public_url: String,
    pub max_upload_size: u64,
    pub allowed_image_types: String,

    // Recommendation service
    pub recommendation_service_url: Option<String>,
    pub recommendation_timeout_ms: u64,

    // Feed & search
    pub feed_default_limit: usize,
    pub feed_source_size: usize,
    pub search_max_results: usize,

    // CORS configuration
    pub cors_allowed_origins: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Config {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            log_level: env::var("LOG_LEVEL")
                .unwrap_or_else(|_| "inkwell=debug,tower_http=debug".to_string()),

            storage_backend: env::var("STORAGE_BACKEND").unwrap_or_else(|_| "memory".to_string()),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            database_namespace: env::var("DATABASE_NAMESPACE")
                .unwrap_or_else(|_| "inkwell".to_string()),
            database_name: env::var("DATABASE_NAME").unwrap_or_else(|_| "blog".to_string()),
            database_username: env::var("DATABASE_USERNAME")
                .unwrap_or_else(|_| "root".to_string()),
            database_password: env::var("DATABASE_PASSWORD")
                .unwrap_or_else(|_| "root".to_string()),

            media_root: env::var("MEDIA_ROOT").unwrap_or_else(|_| "./uploads".to_string()),
            media_public_url: env::var("MEDIA_PUBLIC_URL")
                .unwrap_or_else(|_| "http://localhost:3000/media".to_string()),
            max_upload_size: env::var("MAX_UPLOAD_SIZE")
                .unwrap_or_else(|_| "10485760".to_string())
                .parse()?,
            allowed_image_types: env::var("ALLOWED_IMAGE_TYPES")
                .unwrap_or_else(|_| "jpeg,jpg,png,gif,webp".to_string()),

            recommendation_service_url: env::var("RECOMMENDATION_SERVICE_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            recommendation_timeout_ms: env::var("RECOMMENDATION_TIMEOUT_MS")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,

            feed_default_limit: env::var("FEED_DEFAULT_LIMIT")
                .unwrap_or_else(|_| "10".to_string())
                .parse()?,
            feed_source_size: env::var("FEED_SOURCE_SIZE")
                .unwrap_or_else(|_| "10".to_string())
                .parse()?,
            search_max_results: env::var("SEARCH_MAX_RESULTS")
                .unwrap_or_else(|_| "50".to_string())
                .parse()?,

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:3001".to_string()),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn allowed_image_extensions(&self) -> Vec<String> {
        self.allowed_image_types
            .split(',')
            .map(|ext| ext.trim().to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: "127.0.0.1".to_string(),
            server_port: 3000,
            environment: "test".to_string(),
            log_level: "inkwell=debug".to_string(),
            storage_backend: "memory".to_string(),
            database_url: "http://localhost:8000".to_string(),
            database_namespace: "inkwell".to_string(),
            database_name: "blog".to_string(),
            database_username: "root".to_string(),
            database_password: "root".to_string(),
            media_root: "./uploads".to_string(),
            media_public_url: "http://localhost:3000/media".to_string(),
            max_upload_size: 10 * 1024 * 1024,
            allowed_image_types: "jpeg,jpg,png,gif,webp".to_string(),
            recommendation_service_url: None,
            recommendation_timeout_ms: 3000,
            feed_default_limit: 10,
            feed_source_size: 10,
            search_max_results: 50,
            cors_allowed_origins: "http://localhost:3001".to_string(),
        }
    }
}
