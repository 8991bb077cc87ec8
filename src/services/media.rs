use crate::{
    config::Config,
    error::{AppError, Result},
};
use async_trait::async_trait;
use chrono::Utc;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

/// 二进制对象存储
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `bytes` at `path` and returns the public URL.
    async fn store(&self, bytes: Vec<u8>, path: &str) -> Result<String>;

    async fn delete(&self, url: &str) -> Result<()>;
}

/// 本地文件系统存储，通过 `public_url` 对外提供
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
    public_url: Url,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, public_url: &str) -> Result<Self> {
        let mut public_url = Url::parse(public_url)
            .map_err(|e| AppError::Internal(format!("Invalid media public URL: {}", e)))?;
        if !public_url.path().ends_with('/') {
            let path = format!("{}/", public_url.path());
            public_url.set_path(&path);
        }
        Ok(Self {
            root: root.into(),
            public_url,
        })
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(AppError::FileUpload(format!("Invalid blob path `{}`", path)));
        }
        Ok(self.root.join(relative))
    }

    fn path_for_url(&self, url: &str) -> Result<String> {
        let url = Url::parse(url).map_err(|e| AppError::BadRequest(e.to_string()))?;
        url.path()
            .strip_prefix(self.public_url.path())
            .filter(|_| url.origin() == self.public_url.origin())
            .map(str::to_string)
            .ok_or_else(|| AppError::BadRequest(format!("{} is not a local media URL", url)))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn store(&self, bytes: Vec<u8>, path: &str) -> Result<String> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, bytes).await?;

        let url = self
            .public_url
            .join(path)
            .map_err(|e| AppError::Internal(e.to_string()))?;
        debug!("Stored blob at {}", target.display());
        Ok(url.to_string())
    }

    async fn delete(&self, url: &str) -> Result<()> {
        let path = self.path_for_url(url)?;
        let target = self.resolve(&path)?;
        tokio::fs::remove_file(&target).await?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct MediaService {
    blobs: Arc<dyn BlobStore>,
    max_upload_size: u64,
    allowed_extensions: Vec<String>,
}

impl MediaService {
    pub async fn new(config: &Config) -> Result<Self> {
        let blobs = LocalBlobStore::new(&config.media_root, &config.media_public_url)?;
        Ok(Self::with_store(Arc::new(blobs), config))
    }

    pub fn with_store(blobs: Arc<dyn BlobStore>, config: &Config) -> Self {
        Self {
            blobs,
            max_upload_size: config.max_upload_size,
            allowed_extensions: config.allowed_image_extensions(),
        }
    }

    /// 上传文章配图，路径为 `posts/{post_id}/{毫秒时间戳}-{文件名}`
    pub async fn upload_post_image(&self, post_id: &str, filename: &str, bytes: Vec<u8>) -> Result<String> {
        if bytes.is_empty() {
            return Err(AppError::FileUpload("File is empty".to_string()));
        }
        if bytes.len() as u64 > self.max_upload_size {
            return Err(AppError::FileUpload(format!(
                "File exceeds the {} byte limit",
                self.max_upload_size
            )));
        }

        let filename = sanitize_filename(filename);
        let extension = Path::new(&filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        if !self.allowed_extensions.contains(&extension) {
            return Err(AppError::FileUpload(format!(
                "File type `{}` is not allowed",
                extension
            )));
        }

        let path = format!(
            "posts/{}/{}-{}",
            post_id,
            Utc::now().timestamp_millis(),
            filename
        );
        let url = self.blobs.store(bytes, &path).await?;
        info!("Uploaded image for post {} to {}", post_id, url);
        Ok(url)
    }

    /// 删除失败只记录日志
    pub async fn delete_best_effort(&self, url: &str) {
        if let Err(e) = self.blobs.delete(url).await {
            warn!(url = %url, error = %e, "Failed to delete blob");
        }
    }
}

fn sanitize_filename(filename: &str) -> String {
    let name = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload");
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path(), "http://localhost:3000/media").unwrap();

        let url = store.store(b"png".to_vec(), "posts/p1/1-a.png").await.unwrap();
        assert_eq!(url, "http://localhost:3000/media/posts/p1/1-a.png");
        assert!(dir.path().join("posts/p1/1-a.png").exists());

        store.delete(&url).await.unwrap();
        assert!(!dir.path().join("posts/p1/1-a.png").exists());
        assert!(store.delete(&url).await.is_err());
    }

    #[tokio::test]
    async fn test_local_store_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path(), "http://localhost:3000/media").unwrap();
        assert!(store.store(vec![1], "../escape.png").await.is_err());
        assert!(store.delete("http://elsewhere.com/media/x.png").await.is_err());
    }

    #[tokio::test]
    async fn test_upload_path_and_validation() {
        let mut blobs = MockBlobStore::new();
        blobs
            .expect_store()
            .withf(|_, path| path.starts_with("posts/p1/") && path.ends_with("-my_photo.png"))
            .times(1)
            .returning(|_, path| Ok(format!("https://cdn.example.com/{}", path)));

        let service = MediaService::with_store(Arc::new(blobs), &Config::default());
        let url = service
            .upload_post_image("p1", "my photo.png", vec![1, 2, 3])
            .await
            .unwrap();
        assert!(url.starts_with("https://cdn.example.com/posts/p1/"));

        assert!(service.upload_post_image("p1", "script.exe", vec![1]).await.is_err());
        assert!(service.upload_post_image("p1", "a.png", vec![]).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_failures_are_swallowed() {
        let mut blobs = MockBlobStore::new();
        blobs
            .expect_delete()
            .withf(|url| url == "https://cdn.example.com/x.png")
            .times(1)
            .returning(|_| Err(AppError::Internal("bucket offline".into())));

        let service = MediaService::with_store(Arc::new(blobs), &Config::default());
        service.delete_best_effort("https://cdn.example.com/x.png").await;
    }
}
