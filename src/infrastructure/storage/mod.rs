//! Object Storage
//!
//! Local filesystem implementation of the `ObjectStore` port. Objects are
//! written under `root_dir/<key>` and served from `public_base_url/<key>`.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

use crate::config::StorageSettings;
use crate::domain::ports::ObjectStore;
use crate::shared::error::AppError;

#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_settings(settings: &StorageSettings) -> Self {
        Self::new(&settings.root_dir, &settings.public_base_url)
    }

    /// Resolve `key` under the root, refusing anything that could escape it.
    fn path_for(&self, key: &str) -> Result<PathBuf, AppError> {
        let relative = Path::new(key);
        let safe = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(AppError::server_error(format!("Invalid object key: {}", key)));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<(), AppError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Temporary sibling, then rename into place.
        let tmp = path.with_extension("part");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&tmp, &path).await?;

        debug!(key, content_type, "Object stored");
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root() -> PathBuf {
        std::env::temp_dir().join(format!("social-server-store-{}", uuid::Uuid::new_v4().simple()))
    }

    #[tokio::test]
    async fn test_put_writes_under_root() {
        let root = temp_root();
        let store = LocalObjectStore::new(&root, "https://cdn.example.com/media/");

        store.put("avatar/1/2.png", b"png-bytes", "image/png").await.unwrap();

        let written = tokio::fs::read(root.join("avatar/1/2.png")).await.unwrap();
        assert_eq!(written, b"png-bytes");
        let _ = tokio::fs::remove_dir_all(&root).await;
    }

    #[test]
    fn test_public_url_is_derived_from_key() {
        let store = LocalObjectStore::new("/tmp", "https://cdn.example.com/media/");
        assert_eq!(
            store.public_url("post/7/99.mp4"),
            "https://cdn.example.com/media/post/7/99.mp4"
        );
    }

    #[tokio::test]
    async fn test_traversal_keys_are_rejected() {
        let store = LocalObjectStore::new(temp_root(), "http://x");
        assert!(store.put("../etc/passwd", b"x", "text/plain").await.is_err());
        assert!(store.put("/abs", b"x", "text/plain").await.is_err());
    }
}
