//! MongoDB implementation of CatalogRepository
//!
//! Similarity search relies on an Atlas `vectorSearch` index over
//! `fullTextEmbedding`; [`MongoCatalogRepository::ensure_indexes`] creates it.

use std::collections::BTreeSet;

use async_trait::async_trait;
use core_config::{ConfigError, FromEnv, env_or_default};
use database::mongodb::check_health_detailed;
use futures_util::TryStreamExt;
use mongodb::{
    Collection, Database, IndexModel,
    bson::{Bson, Document, doc, from_document, to_document},
    error::{ErrorKind, WriteFailure},
    options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument},
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::{CatalogError, CatalogResult};
use crate::models::{EMBEDDING_DIMENSION, Embedding, Item};
use crate::repository::CatalogRepository;

const DUPLICATE_KEY: i32 = 11000;

pub const DEFAULT_COLLECTION: &str = "items";
pub const DEFAULT_VECTOR_INDEX: &str = "fullTextEmbedding_index";

#[derive(Debug, Clone)]
pub struct MongoCatalogOptions {
    pub collection: String,
    pub vector_index: String,
}

impl Default for MongoCatalogOptions {
    fn default() -> Self {
        Self {
            collection: DEFAULT_COLLECTION.to_string(),
            vector_index: DEFAULT_VECTOR_INDEX.to_string(),
        }
    }
}

impl FromEnv for MongoCatalogOptions {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            collection: env_or_default("CATALOG_COLLECTION", DEFAULT_COLLECTION),
            vector_index: env_or_default("CATALOG_VECTOR_INDEX", DEFAULT_VECTOR_INDEX),
        })
    }
}

pub struct MongoCatalogRepository {
    db: Database,
    collection: Collection<Item>,
    partition_key: String,
    vector_index: String,
}

impl MongoCatalogRepository {
    /// ```ignore
    /// let client = connect_from_config(&MongoConfig::from_env()?).await?;
    /// let repo = MongoCatalogRepository::new(client.database("snapbox"), "item");
    /// repo.ensure_indexes().await?;
    /// ```
    pub fn new(db: Database, partition_key: impl Into<String>) -> Self {
        Self::with_options(db, partition_key, MongoCatalogOptions::default())
    }

    pub fn with_options(
        db: Database,
        partition_key: impl Into<String>,
        options: MongoCatalogOptions,
    ) -> Self {
        let collection = db.collection::<Item>(&options.collection);
        Self {
            db,
            collection,
            partition_key: partition_key.into(),
            vector_index: options.vector_index,
        }
    }

    /// Restrict `filter` to this repository's partition.
    fn scoped(&self, filter: Document) -> Document {
        let mut scoped = doc! { "partitionKey": &self.partition_key };
        for (key, value) in filter {
            scoped.insert(key, value);
        }
        scoped
    }

    fn by_id(&self, id: Uuid) -> Document {
        self.scoped(doc! { "_id": id.to_string() })
    }

    fn vector_search_pipeline(&self, vector: &Embedding, k: usize) -> Vec<Document> {
        let query_vector: Vec<Bson> = vector
            .as_slice()
            .iter()
            .map(|v| Bson::Double(f64::from(*v)))
            .collect();
        let limit = k as i64;

        vec![doc! {
            "$vectorSearch": {
                "index": &self.vector_index,
                "path": "fullTextEmbedding",
                "queryVector": query_vector,
                "numCandidates": (limit * 10).max(100),
                "limit": limit,
                "filter": { "partitionKey": &self.partition_key },
            }
        }]
    }

    /// Create the `boxId` index and the vector search index.
    ///
    /// The vector index needs Atlas (or a local Atlas deployment); elsewhere the
    /// failure is logged and search will report an upstream error at query time.
    #[instrument(skip(self))]
    pub async fn ensure_indexes(&self) -> CatalogResult<()> {
        let box_index = IndexModel::builder()
            .keys(doc! { "partitionKey": 1, "boxId": 1 })
            .build();
        self.collection
            .create_index(box_index)
            .await
            .map_err(classify)?;

        let command = doc! {
            "createSearchIndexes": self.collection.name(),
            "indexes": [{
                "name": &self.vector_index,
                "type": "vectorSearch",
                "definition": {
                    "fields": [
                        {
                            "type": "vector",
                            "path": "fullTextEmbedding",
                            "numDimensions": EMBEDDING_DIMENSION as i32,
                            "similarity": "cosine",
                        },
                        { "type": "filter", "path": "partitionKey" },
                    ]
                }
            }]
        };

        match self.db.run_command(command).await {
            Ok(_) => info!(index = %self.vector_index, "Vector search index created"),
            Err(e) if e.to_string().contains("already exists") => {
                info!(index = %self.vector_index, "Vector search index already exists")
            }
            Err(e) => warn!(error = %e, "Could not create vector search index"),
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogRepository for MongoCatalogRepository {
    #[instrument(skip(self, item), fields(item_id = %item.id))]
    async fn insert(&self, item: &Item) -> CatalogResult<()> {
        if item.partition_key != self.partition_key {
            return Err(CatalogError::InvalidInput(format!(
                "item partition '{}' does not match store partition '{}'",
                item.partition_key, self.partition_key
            )));
        }

        self.collection.insert_one(item).await.map_err(classify)?;
        info!(item_id = %item.id, "Item inserted");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get(&self, id: Uuid) -> CatalogResult<Item> {
        self.collection
            .find_one(self.by_id(id))
            .await
            .map_err(classify)?
            .ok_or_else(|| CatalogError::item_not_found(id))
    }

    #[instrument(skip(self, item), fields(item_id = %item.id))]
    async fn replace(&self, item: &Item, expected_version: Option<u64>) -> CatalogResult<Item> {
        let mut fields = to_document(item)
            .map_err(|e| CatalogError::permanent(format!("failed to encode item: {}", e)))?;
        fields.remove("_id");
        fields.remove("version");

        let mut filter = self.by_id(item.id);
        if let Some(expected) = expected_version {
            filter.insert("version", expected as i64);
        }

        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        let updated = self
            .collection
            .find_one_and_update(filter, doc! { "$set": fields, "$inc": { "version": 1_i64 } })
            .with_options(options)
            .await
            .map_err(classify)?;

        match updated {
            Some(updated) => {
                info!(item_id = %item.id, version = updated.version, "Item replaced");
                Ok(updated)
            }
            None if expected_version.is_some() => {
                let exists = self
                    .collection
                    .count_documents(self.by_id(item.id))
                    .await
                    .map_err(classify)?
                    > 0;
                if exists {
                    Err(CatalogError::Conflict(format!(
                        "Item {} was modified concurrently",
                        item.id
                    )))
                } else {
                    Err(CatalogError::item_not_found(item.id))
                }
            }
            None => Err(CatalogError::item_not_found(item.id)),
        }
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> CatalogResult<()> {
        let result = self
            .collection
            .delete_one(self.by_id(id))
            .await
            .map_err(classify)?;

        if result.deleted_count == 0 {
            return Err(CatalogError::item_not_found(id));
        }

        info!(item_id = %id, "Item deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn distinct_box_ids(&self) -> CatalogResult<BTreeSet<String>> {
        let values = self
            .collection
            .distinct("boxId", self.scoped(doc! {}))
            .await
            .map_err(classify)?;

        Ok(values
            .into_iter()
            .filter_map(|value| match value {
                Bson::String(box_id) if !box_id.is_empty() => Some(box_id),
                _ => None,
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn find_by_box_id(&self, box_id: &str) -> CatalogResult<Vec<Item>> {
        let options = FindOptions::builder().sort(doc! { "createdAt": 1 }).build();
        let cursor = self
            .collection
            .find(self.scoped(doc! { "boxId": box_id }))
            .with_options(options)
            .await
            .map_err(classify)?;

        cursor.try_collect().await.map_err(classify)
    }

    #[instrument(skip(self, vector))]
    async fn top_k_by_similarity(&self, vector: &Embedding, k: usize) -> CatalogResult<Vec<Item>> {
        if k == 0 {
            return Err(CatalogError::InvalidInput("k must be positive".to_string()));
        }

        let cursor = self
            .collection
            .aggregate(self.vector_search_pipeline(vector, k))
            .await
            .map_err(classify)?;
        let documents: Vec<Document> = cursor.try_collect().await.map_err(classify)?;

        documents
            .into_iter()
            .map(|document| {
                from_document::<Item>(document).map_err(|e| {
                    CatalogError::permanent(format!("failed to decode item: {}", e))
                })
            })
            .collect()
    }

    async fn ping(&self) -> CatalogResult<()> {
        let status = check_health_detailed(&self.db).await;
        if status.healthy {
            Ok(())
        } else {
            Err(CatalogError::StoreUnavailable(
                status.message.unwrap_or_else(|| "ping failed".to_string()),
            ))
        }
    }
}

/// Map driver errors onto catalog error kinds.
fn classify(err: mongodb::error::Error) -> CatalogError {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error))
            if write_error.code == DUPLICATE_KEY =>
        {
            CatalogError::Conflict("Item already exists".to_string())
        }
        ErrorKind::ServerSelection { .. }
        | ErrorKind::Io(_)
        | ErrorKind::ConnectionPoolCleared { .. }
        | ErrorKind::DnsResolve { .. } => {
            CatalogError::StoreUnavailable(format!("catalog store unreachable: {}", err))
        }
        _ => CatalogError::permanent(format!("catalog store error: {}", err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn repository() -> MongoCatalogRepository {
        // Client construction is lazy; nothing connects until an operation runs.
        let client = mongodb::Client::with_uri_str("mongodb://localhost:27017")
            .await
            .unwrap();
        MongoCatalogRepository::new(client.database("snapbox_test"), "item")
    }

    #[tokio::test]
    async fn test_filters_are_scoped_to_partition() {
        let repo = repository().await;
        let id = Uuid::new_v4();
        let filter = repo.by_id(id);
        assert_eq!(filter.get_str("partitionKey").unwrap(), "item");
        assert_eq!(filter.get_str("_id").unwrap(), id.to_string());
    }

    #[tokio::test]
    async fn test_vector_search_pipeline() {
        let repo = repository().await;
        let vector = Embedding::new(vec![0.5; EMBEDDING_DIMENSION]).unwrap();

        let pipeline = repo.vector_search_pipeline(&vector, 3);
        let stage = pipeline[0].get_document("$vectorSearch").unwrap();
        assert_eq!(stage.get_str("index").unwrap(), DEFAULT_VECTOR_INDEX);
        assert_eq!(stage.get_str("path").unwrap(), "fullTextEmbedding");
        assert_eq!(stage.get_i64("limit").unwrap(), 3);
        assert_eq!(stage.get_i64("numCandidates").unwrap(), 100);
        assert_eq!(
            stage.get_array("queryVector").unwrap().len(),
            EMBEDDING_DIMENSION
        );
        assert_eq!(
            stage
                .get_document("filter")
                .unwrap()
                .get_str("partitionKey")
                .unwrap(),
            "item"
        );
    }

    #[test]
    fn test_options_from_env() {
        temp_env::with_vars(
            [
                ("CATALOG_COLLECTION", Some("photos")),
                ("CATALOG_VECTOR_INDEX", None),
            ],
            || {
                let options = MongoCatalogOptions::from_env().unwrap();
                assert_eq!(options.collection, "photos");
                assert_eq!(options.vector_index, DEFAULT_VECTOR_INDEX);
            },
        );
    }

    #[tokio::test]
    #[ignore = "requires a MongoDB Atlas deployment at MONGODB_URL"]
    async fn test_live_round_trip() {
        let url = std::env::var("MONGODB_URL").unwrap();
        let client = mongodb::Client::with_uri_str(&url).await.unwrap();
        let repo = MongoCatalogRepository::new(client.database("snapbox_test"), "item");
        repo.ensure_indexes().await.unwrap();
        repo.ping().await.unwrap();
        assert!(repo.distinct_box_ids().await.is_ok());
    }
}
