#![allow(dead_code)]

use async_trait::async_trait;
use inkwell::{
    config::Config,
    models::{
        post::{CreatePostRequest, Post},
        user::{CreateUserRequest, User},
    },
    services::{
        database::Database,
        media::LocalBlobStore,
        recommendation::DisabledRecommender,
        MediaService, RecommendationService,
    },
    state::AppState,
    storage::{
        CounterUpdate, DocumentStore, MemoryStore, Query, SetUpdate, StoreError, StoreResult,
    },
};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tempfile::TempDir;

/// Memory store that can be told to fail writes on chosen documents.
#[derive(Default)]
pub struct FaultyStore {
    inner: MemoryStore,
    failing_increments: Mutex<HashSet<String>>,
    failing_set_writes: Mutex<HashSet<String>>,
}

impl FaultyStore {
    pub fn fail_increments_on(&self, id: &str) {
        self.failing_increments.lock().insert(id.to_string());
    }

    pub fn fail_set_writes_on(&self, id: &str) {
        self.failing_set_writes.lock().insert(id.to_string());
    }

    pub fn heal(&self) {
        self.failing_increments.lock().clear();
        self.failing_set_writes.lock().clear();
    }

    fn injected(id: &str) -> StoreError {
        StoreError::Backend(format!("injected failure on {}", id))
    }
}

#[async_trait]
impl DocumentStore for FaultyStore {
    async fn ping(&self) -> StoreResult<()> {
        self.inner.ping().await
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Value>> {
        self.inner.get(collection, id).await
    }

    async fn create(&self, collection: &str, id: &str, doc: Value) -> StoreResult<bool> {
        self.inner.create(collection, id, doc).await
    }

    async fn put(&self, collection: &str, id: &str, doc: Value) -> StoreResult<()> {
        self.inner.put(collection, id, doc).await
    }

    async fn merge(&self, collection: &str, id: &str, patch: Value) -> StoreResult<Option<Value>> {
        self.inner.merge(collection, id, patch).await
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<bool> {
        self.inner.delete(collection, id).await
    }

    async fn query(&self, collection: &str, query: &Query) -> StoreResult<Vec<Value>> {
        self.inner.query(collection, query).await
    }

    async fn increment(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        delta: i64,
        floor: Option<i64>,
    ) -> StoreResult<CounterUpdate> {
        if self.failing_increments.lock().contains(id) {
            return Err(Self::injected(id));
        }
        self.inner.increment(collection, id, field, delta, floor).await
    }

    async fn set_add(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        member: &str,
        count_field: Option<&str>,
    ) -> StoreResult<SetUpdate> {
        if self.failing_set_writes.lock().contains(id) {
            return Err(Self::injected(id));
        }
        self.inner.set_add(collection, id, field, member, count_field).await
    }

    async fn set_remove(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        member: &str,
        count_field: Option<&str>,
    ) -> StoreResult<SetUpdate> {
        if self.failing_set_writes.lock().contains(id) {
            return Err(Self::injected(id));
        }
        self.inner.set_remove(collection, id, field, member, count_field).await
    }
}

pub struct TestApp {
    pub state: Arc<AppState>,
    pub store: Arc<FaultyStore>,
    _media_dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let media_dir = TempDir::new().unwrap();
        let config = Config {
            media_root: media_dir.path().to_string_lossy().into_owned(),
            ..Config::default()
        };

        let store = Arc::new(FaultyStore::default());
        let db = Arc::new(Database::with_store(store.clone()));
        let blobs = LocalBlobStore::new(media_dir.path(), &config.media_public_url).unwrap();
        let media = MediaService::with_store(Arc::new(blobs), &config);
        let recommendations = RecommendationService::with_recommender(Arc::new(DisabledRecommender));

        let state = AppState::assemble(config, db, media, recommendations).await.unwrap();
        Self {
            state: Arc::new(state),
            store,
            _media_dir: media_dir,
        }
    }

    pub async fn user(&self, id: &str, name: &str) -> User {
        self.state
            .user_service
            .create_user(CreateUserRequest {
                id: Some(id.to_string()),
                name: name.to_string(),
                email: format!("{}@example.com", id),
                first_name: None,
                last_name: None,
                photo_url: None,
            })
            .await
            .unwrap()
    }

    pub async fn publish(&self, author_id: &str, title: &str) -> Post {
        self.state
            .post_service
            .create_post(author_id, post_request(title))
            .await
            .unwrap()
    }

    pub async fn reload_user(&self, id: &str) -> User {
        self.state.user_service.require_user(id).await.unwrap()
    }

    pub async fn reload_post(&self, id: &str) -> Post {
        self.state.post_service.get_post(id).await.unwrap().unwrap()
    }
}

pub fn post_request(title: &str) -> CreatePostRequest {
    CreatePostRequest {
        title: title.to_string(),
        content: format!("{} body text", title),
        image_url: None,
        category: None,
        keywords: None,
        tags: None,
        save_as_draft: None,
    }
}
