use async_trait::async_trait;
use bytes::Bytes;

use crate::error::CatalogResult;

/// Bytes of a stored object together with the content type it was written with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub bytes: Bytes,
    pub content_type: String,
}

/// Flat key/value object storage for item images and thumbnails.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Create or overwrite the object at `key`.
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> CatalogResult<()>;

    /// `NotFound` when the key does not exist.
    async fn get(&self, key: &str) -> CatalogResult<StoredBlob>;

    /// Succeeds whether or not the object existed.
    async fn delete_if_exists(&self, key: &str) -> CatalogResult<()>;

    async fn exists(&self, key: &str) -> CatalogResult<bool>;
}
