use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use super::{BlobStore, StoredBlob};
use crate::error::{CatalogError, CatalogResult};

/// Process-local [`BlobStore`] for development and tests.
#[derive(Default)]
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<String, StoredBlob>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }

    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.blobs.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> CatalogResult<()> {
        self.blobs.write().await.insert(
            key.to_string(),
            StoredBlob {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> CatalogResult<StoredBlob> {
        self.blobs
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| CatalogError::blob_not_found(key))
    }

    async fn delete_if_exists(&self, key: &str) -> CatalogResult<()> {
        self.blobs.write().await.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> CatalogResult<bool> {
        Ok(self.blobs.read().await.contains_key(key))
    }
}
