//! Upload Service
//!
//! Checks an uploaded file against the policy of its kind and stores it
//! under a generated key. Nothing is written when the check fails.

use std::sync::Arc;

use axum::body::Bytes;

use crate::domain::ports::ObjectStore;
use crate::domain::{object_key, UploadKind};
use crate::infrastructure::metrics::record_upload;
use crate::shared::error::AppError;
use crate::shared::snowflake::SnowflakeGenerator;

/// The `file` part of an upload form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub content_type: String,
    pub bytes: Bytes,
}

/// Where a stored upload can be fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUpload {
    pub url: String,
    pub key: String,
    pub content_type: String,
    pub size: u64,
}

pub struct UploadService {
    store: Arc<dyn ObjectStore>,
    id_generator: Arc<SnowflakeGenerator>,
}

impl UploadService {
    pub fn new(store: Arc<dyn ObjectStore>, id_generator: Arc<SnowflakeGenerator>) -> Self {
        Self {
            store,
            id_generator,
        }
    }

    pub async fn upload(
        &self,
        user_id: i64,
        kind: Option<&str>,
        file: Option<UploadedFile>,
    ) -> Result<StoredUpload, AppError> {
        let kind = match kind {
            None => return Err(AppError::invalid_field("type", "Upload type is required")),
            Some(raw) => UploadKind::parse(raw).ok_or_else(|| {
                AppError::invalid_field("type", "Type must be avatar, cover, post or message")
            })?,
        };
        let file = file.ok_or_else(|| AppError::invalid_field("file", "File is required"))?;

        let size = file.bytes.len() as u64;
        let ext = kind.check(&file.content_type, size)?;

        let key = object_key(kind, user_id, self.id_generator.generate(), ext);
        self.store.put(&key, &file.bytes, &file.content_type).await?;
        record_upload(kind.as_str(), size);

        tracing::info!(user_id, key = %key, size, "Upload stored");

        Ok(StoredUpload {
            url: self.store.public_url(&key),
            key,
            content_type: file.content_type,
            size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::MockObjectStore;

    fn png(size: usize) -> UploadedFile {
        UploadedFile {
            content_type: "image/png".into(),
            bytes: Bytes::from(vec![0u8; size]),
        }
    }

    #[tokio::test]
    async fn disallowed_type_never_reaches_store() {
        let mut store = MockObjectStore::new();
        store.expect_put().never();
        let service = UploadService::new(Arc::new(store), Arc::new(SnowflakeGenerator::default()));

        let file = UploadedFile {
            content_type: "application/pdf".into(),
            bytes: Bytes::from_static(b"%PDF"),
        };
        let err = service.upload(1, Some("avatar"), Some(file)).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidFileType(_)));
    }

    #[tokio::test]
    async fn url_is_derived_from_key() {
        let mut store = MockObjectStore::new();
        store
            .expect_put()
            .withf(|key, bytes, ct| key.starts_with("post/7/") && key.ends_with(".png") && bytes.len() == 3 && ct == "image/png")
            .returning(|_, _, _| Ok(()));
        store
            .expect_public_url()
            .returning(|key| format!("https://cdn.example.com/{}", key));
        let service = UploadService::new(Arc::new(store), Arc::new(SnowflakeGenerator::default()));

        let stored = service.upload(7, Some("post"), Some(png(3))).await.unwrap();

        assert_eq!(stored.url, format!("https://cdn.example.com/{}", stored.key));
        assert_eq!(stored.size, 3);
    }

    #[tokio::test]
    async fn missing_file_is_a_field_error() {
        let mut store = MockObjectStore::new();
        store.expect_put().never();
        let service = UploadService::new(Arc::new(store), Arc::new(SnowflakeGenerator::default()));

        let err = service.upload(1, Some("post"), None).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ref d) if d[0].field == "file"));
    }
}
