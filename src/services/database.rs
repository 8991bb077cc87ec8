use crate::config::Config;
use crate::error::{AppError, Result};
use crate::storage::{memory::MemoryStore, DocumentStore, Query};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info};

/// 集合名称
pub mod collections {
    pub const USERS: &str = "users";
    pub const POSTS: &str = "posts";
    pub const LIKES: &str = "likes";
    pub const BOOKMARKS: &str = "bookmarks";
    pub const NOTIFICATIONS: &str = "notifications";
}

/// 数据库服务
///
/// Typed access on top of a [`DocumentStore`]. Counter and set primitives
/// are only reachable through [`Database::raw`] so that the services owning
/// those invariants stay the only writers.
#[derive(Clone)]
pub struct Database {
    store: Arc<dyn DocumentStore>,
}

impl Database {
    /// 根据配置创建数据库实例
    pub async fn new(config: &Config) -> Result<Self> {
        match config.storage_backend.as_str() {
            "memory" => {
                info!("Using in-memory document store");
                Ok(Self::in_memory())
            }
            #[cfg(feature = "surrealdb-store")]
            "surrealdb" => {
                info!("Initializing database connection to {}", config.database_url);
                let store = crate::storage::surreal::SurrealStore::connect(
                    &config.database_url,
                    &config.database_namespace,
                    &config.database_name,
                    &config.database_username,
                    &config.database_password,
                )
                .await?;
                Ok(Self::with_store(Arc::new(store)))
            }
            other => Err(AppError::Internal(format!(
                "Unsupported storage backend `{}`",
                other
            ))),
        }
    }

    pub fn in_memory() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    pub fn with_store(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// 验证数据库连接
    pub async fn verify_connection(&self) -> Result<()> {
        match self.store.ping().await {
            Ok(()) => {
                info!("Database connection verified successfully");
                Ok(())
            }
            Err(e) => {
                error!("Failed to verify database connection: {}", e);
                Err(e.into())
            }
        }
    }

    pub(crate) fn raw(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    /// 通过ID获取单个记录
    pub async fn get_by_id<T>(&self, collection: &str, id: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        match self.store.get(collection, id).await? {
            Some(doc) => Ok(Some(serde_json::from_value(doc)?)),
            None => Ok(None),
        }
    }

    /// 创建记录，ID 已存在时返回 false
    pub async fn create<T>(&self, collection: &str, id: &str, data: &T) -> Result<bool>
    where
        T: Serialize,
    {
        let doc = serde_json::to_value(data)?;
        Ok(self.store.create(collection, id, doc).await?)
    }

    pub async fn put<T>(&self, collection: &str, id: &str, data: &T) -> Result<()>
    where
        T: Serialize,
    {
        let doc = serde_json::to_value(data)?;
        Ok(self.store.put(collection, id, doc).await?)
    }

    /// 通过ID使用JSON数据更新记录并返回指定类型
    pub async fn update_by_id_with_json<T>(
        &self,
        collection: &str,
        id: &str,
        updates: serde_json::Value,
    ) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        debug!("Merging update into {}:{}", collection, id);
        match self.store.merge(collection, id, updates).await? {
            Some(doc) => Ok(Some(serde_json::from_value(doc)?)),
            None => Ok(None),
        }
    }

    /// 通过ID删除记录
    pub async fn delete_by_id(&self, collection: &str, id: &str) -> Result<bool> {
        Ok(self.store.delete(collection, id).await?)
    }

    pub async fn exists(&self, collection: &str, id: &str) -> Result<bool> {
        Ok(self.store.get(collection, id).await?.is_some())
    }

    /// 查找单个记录
    pub async fn find_one<T>(&self, collection: &str, field: &str, value: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let query = Query::new().filter_eq(field, value).limit(1);
        let mut results = self.query::<T>(collection, &query).await?;
        Ok(results.pop())
    }

    pub async fn query<T>(&self, collection: &str, query: &Query) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let docs = self.store.query(collection, query).await?;
        docs.into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(AppError::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Note {
        id: String,
        title: String,
    }

    #[tokio::test]
    async fn test_database_connection() {
        let config = Config::default();
        let db = Database::new(&config).await.unwrap();
        assert!(db.verify_connection().await.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_backend_is_rejected() {
        let config = Config {
            storage_backend: "cassandra".to_string(),
            ..Config::default()
        };
        assert!(Database::new(&config).await.is_err());
    }

    #[tokio::test]
    async fn test_typed_round_trip() {
        let db = Database::in_memory();
        let note = Note {
            id: "n1".into(),
            title: "hello".into(),
        };
        assert!(db.create("notes", "n1", &note).await.unwrap());
        assert!(!db.create("notes", "n1", &note).await.unwrap());

        let found: Option<Note> = db.find_one("notes", "title", "hello").await.unwrap();
        assert_eq!(found, Some(note));

        let updated: Option<Note> = db
            .update_by_id_with_json("notes", "n1", json!({"title": "bye"}))
            .await
            .unwrap();
        assert_eq!(updated.unwrap().title, "bye");

        assert!(db.delete_by_id("notes", "n1").await.unwrap());
        assert!(!db.exists("notes", "n1").await.unwrap());
    }
}
