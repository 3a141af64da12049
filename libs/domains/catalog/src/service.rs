//! Catalog Service - ingestion, owner edits, deletion and browsing

use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use database::retry_if;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::blob::{BlobStore, StoredBlob};
use crate::bounded::{gateway_call, store_call};
use crate::config::CatalogConfig;
use crate::embedding::EmbeddingGateway;
use crate::error::{CatalogError, CatalogResult};
use crate::models::{
    DEFAULT_ITEM_TYPE, Embedding, INITIAL_VERSION, Item, ItemSummary, UpdateItemFields, full_text,
};
use crate::repository::CatalogRepository;
use crate::thumbnail::{make_thumbnail, new_blob_id, resolve_content_type, thumbnail_key};

/// Key probed by the blob readiness check; it never has to exist.
const READINESS_PROBE_KEY: &str = "readiness-probe";

/// Orchestrates the blob store, the embedding gateway and the catalog store.
///
/// Every collaborator call is bounded by `CatalogConfig::call_timeout`.
/// Single-item reads are retried on transient failures; writes never are.
pub struct CatalogService<R: CatalogRepository> {
    repository: Arc<R>,
    blobs: Arc<dyn BlobStore>,
    gateway: Arc<dyn EmbeddingGateway>,
    config: CatalogConfig,
}

impl<R: CatalogRepository> CatalogService<R> {
    pub fn new(
        repository: Arc<R>,
        blobs: Arc<dyn BlobStore>,
        gateway: Arc<dyn EmbeddingGateway>,
        config: CatalogConfig,
    ) -> Self {
        Self {
            repository,
            blobs,
            gateway,
            config,
        }
    }

    async fn read_item(&self, id: Uuid) -> CatalogResult<Item> {
        retry_if(
            || store_call("get", self.config.call_timeout, self.repository.get(id)),
            self.config.read_retry(),
            CatalogError::is_transient,
        )
        .await
    }

    /// Store a new photo and catalog what the vision model sees in it.
    ///
    /// The original and its thumbnail are written while the image is being
    /// described; the record is inserted only once both have succeeded. A
    /// failure after the blobs are written leaves them orphaned.
    #[instrument(skip(self, image, content_type), fields(size = image.len()))]
    pub async fn ingest(
        &self,
        image: Bytes,
        content_type: Option<&str>,
        box_id: &str,
    ) -> CatalogResult<ItemSummary> {
        if image.is_empty() {
            return Err(CatalogError::InvalidInput("image is empty".to_string()));
        }
        let box_id = box_id.trim();
        if box_id.is_empty() {
            return Err(CatalogError::InvalidInput("boxId is required".to_string()));
        }

        let limit = self.config.call_timeout;
        let content_type = resolve_content_type(content_type, &image);
        let blob_id = new_blob_id(&content_type);
        let thumb_key = thumbnail_key(&blob_id, self.config.thumb_percent);

        let store_images = async {
            store_call(
                "put_image",
                limit,
                self.blobs.put(&blob_id, image.clone(), &content_type),
            )
            .await?;

            let thumbnail =
                make_thumbnail(image.clone(), content_type.clone(), self.config.thumb_percent)
                    .await;
            store_call(
                "put_thumbnail",
                limit,
                self.blobs
                    .put(&thumb_key, thumbnail.bytes, &thumbnail.content_type),
            )
            .await?;
            Ok::<_, CatalogError>(())
        };
        let describe = gateway_call(
            "describe_image",
            limit,
            self.gateway.describe_image(&image, &content_type),
        );

        let ((), description) = tokio::try_join!(store_images, describe)?;

        let inputs = vec![
            description.title.clone(),
            description.category.clone(),
            description.detailed_description.clone(),
            full_text(
                &description.title,
                &description.detailed_description,
                &description.colors,
            ),
        ];
        let vectors = gateway_call("embed", limit, self.gateway.embed(&inputs)).await?;
        let [
            title_embedding,
            category_embedding,
            detailed_description_embedding,
            full_text_embedding,
        ] = exactly::<4>(vectors)?;

        let item = Item {
            id: Uuid::new_v4(),
            item_type: DEFAULT_ITEM_TYPE.to_string(),
            partition_key: self.config.partition_key.clone(),
            blob_id: Some(blob_id.clone()),
            box_id: Some(box_id.to_string()),
            title: description.title,
            category: description.category,
            detailed_description: description.detailed_description,
            colors: description.colors,
            title_embedding,
            category_embedding,
            detailed_description_embedding,
            full_text_embedding,
            user_description: None,
            user_description_embedding: None,
            count: 1.0,
            created_at: Utc::now(),
            updated_at: None,
            version: INITIAL_VERSION,
        };

        store_call("insert", limit, self.repository.insert(&item))
            .await
            .inspect_err(|e| {
                warn!(blob_id = %blob_id, error = %e, "Insert failed, image blobs are orphaned")
            })?;

        info!(item_id = %item.id, blob_id = %blob_id, box_id, "Item ingested");
        Ok(ItemSummary::from(&item))
    }

    #[instrument(skip(self))]
    pub async fn get_item(&self, id: Uuid) -> CatalogResult<ItemSummary> {
        self.read_item(id).await.map(|item| ItemSummary::from(&item))
    }

    /// Apply owner edits.
    ///
    /// Embeddings are only recomputed when the user description actually
    /// changes. An empty description clears it and restores the model text in
    /// the full-text embedding.
    #[instrument(skip(self, input))]
    pub async fn update_user_fields(
        &self,
        id: Uuid,
        input: UpdateItemFields,
    ) -> CatalogResult<ItemSummary> {
        input
            .validate()
            .map_err(|e| CatalogError::InvalidInput(e.to_string()))?;

        let mut item = self.read_item(id).await?;
        if let Some(expected) = input.expected_version {
            if expected != item.version {
                return Err(CatalogError::Conflict(format!(
                    "Item {} is at version {}, expected {}",
                    id, item.version, expected
                )));
            }
        }

        let limit = self.config.call_timeout;
        let desired = input
            .user_description
            .map(|d| d.trim().to_string())
            .map(|d| (!d.is_empty()).then_some(d));

        if let Some(desired) = desired.filter(|d| *d != item.user_description) {
            match desired {
                Some(description) => {
                    let full = full_text(&item.title, &description, &item.colors);
                    let vectors = gateway_call(
                        "embed",
                        limit,
                        self.gateway.embed(&[description.clone(), full]),
                    )
                    .await?;
                    let [user_vector, full_vector] = exactly::<2>(vectors)?;
                    item.user_description = Some(description);
                    item.user_description_embedding = Some(user_vector);
                    item.full_text_embedding = full_vector;
                }
                None => {
                    let full = full_text(&item.title, &item.detailed_description, &item.colors);
                    item.full_text_embedding =
                        gateway_call("embed_one", limit, self.gateway.embed_one(&full)).await?;
                    item.user_description = None;
                    item.user_description_embedding = None;
                }
            }
        }

        item.count = input.count;
        item.updated_at = Some(Utc::now());

        let stored = store_call(
            "replace",
            limit,
            self.repository.replace(&item, input.expected_version),
        )
        .await?;

        info!(item_id = %id, version = stored.version, "Item updated");
        Ok(ItemSummary::from(&stored))
    }

    /// Remove an item with its image and thumbnail.
    ///
    /// Blob deletions that fail are logged and do not stop the catalog delete;
    /// the record is the source of truth and a leftover blob is unreachable.
    #[instrument(skip(self))]
    pub async fn delete_item(&self, id: Uuid) -> CatalogResult<bool> {
        let item = self.read_item(id).await?;
        let blob_id = item
            .blob_id
            .as_deref()
            .filter(|b| !b.is_empty())
            .ok_or_else(|| CatalogError::NotFound(format!("Image of item {}", id)))?;

        let limit = self.config.call_timeout;
        let thumb_key = thumbnail_key(blob_id, self.config.thumb_percent);
        let (original, thumbnail) = tokio::join!(
            store_call("delete_image", limit, self.blobs.delete_if_exists(blob_id)),
            store_call(
                "delete_thumbnail",
                limit,
                self.blobs.delete_if_exists(&thumb_key)
            ),
        );
        for (key, result) in [(blob_id, original), (thumb_key.as_str(), thumbnail)] {
            if let Err(e) = result {
                warn!(item_id = %id, key, error = %e, "Blob delete failed, deleting record anyway");
            }
        }

        store_call("delete", limit, self.repository.delete(id)).await?;
        info!(item_id = %id, blob_id, "Item deleted");
        Ok(true)
    }

    #[instrument(skip(self))]
    pub async fn list_boxes(&self) -> CatalogResult<Vec<String>> {
        let boxes = store_call(
            "distinct_box_ids",
            self.config.call_timeout,
            self.repository.distinct_box_ids(),
        )
        .await?;
        Ok(boxes.into_iter().collect())
    }

    #[instrument(skip(self))]
    pub async fn list_box_contents(&self, box_id: &str) -> CatalogResult<Vec<ItemSummary>> {
        let items = store_call(
            "find_by_box_id",
            self.config.call_timeout,
            self.repository.find_by_box_id(box_id),
        )
        .await?;
        Ok(items.iter().map(ItemSummary::from).collect())
    }

    /// Original image, or its thumbnail when `thumb` is set.
    #[instrument(skip(self))]
    pub async fn fetch_image(&self, blob_id: &str, thumb: bool) -> CatalogResult<StoredBlob> {
        if blob_id.is_empty() || blob_id.contains('/') || blob_id.contains("..") {
            return Err(CatalogError::InvalidInput(format!(
                "invalid blob id '{}'",
                blob_id
            )));
        }

        let key = if thumb {
            thumbnail_key(blob_id, self.config.thumb_percent)
        } else {
            blob_id.to_string()
        };
        store_call("get_image", self.config.call_timeout, self.blobs.get(&key)).await
    }

    pub async fn check_catalog(&self) -> CatalogResult<()> {
        store_call("ping", self.config.call_timeout, self.repository.ping()).await
    }

    pub async fn check_blobs(&self) -> CatalogResult<()> {
        store_call(
            "blob_probe",
            self.config.call_timeout,
            self.blobs.exists(READINESS_PROBE_KEY),
        )
        .await
        .map(|_| ())
    }
}

impl<R: CatalogRepository> Clone for CatalogService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            blobs: Arc::clone(&self.blobs),
            gateway: Arc::clone(&self.gateway),
            config: self.config.clone(),
        }
    }
}

/// Exactly `N` vectors, or a permanent upstream error.
fn exactly<const N: usize>(vectors: Vec<Embedding>) -> CatalogResult<[Embedding; N]> {
    vectors.try_into().map_err(|v: Vec<Embedding>| {
        CatalogError::permanent(format!("expected {} embeddings, got {}", N, v.len()))
    })
}
