use std::collections::BTreeSet;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::CatalogResult;
use crate::models::{Embedding, Item};

/// Persistence for catalog records.
///
/// Every operation is scoped to the partition key the implementation was
/// built with. Implementations do not retry; the services decide.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// `Conflict` when an item with the same id already exists.
    async fn insert(&self, item: &Item) -> CatalogResult<()>;

    /// `NotFound` when absent.
    async fn get(&self, id: Uuid) -> CatalogResult<Item>;

    /// Overwrite the stored record with `item` and bump its version.
    ///
    /// With `expected_version` set, the write only happens if the stored
    /// version still equals it (`Conflict` otherwise). Returns the record as
    /// written.
    async fn replace(&self, item: &Item, expected_version: Option<u64>) -> CatalogResult<Item>;

    /// `NotFound` when absent.
    async fn delete(&self, id: Uuid) -> CatalogResult<()>;

    /// Distinct non-empty box ids, sorted.
    async fn distinct_box_ids(&self) -> CatalogResult<BTreeSet<String>>;

    async fn find_by_box_id(&self, box_id: &str) -> CatalogResult<Vec<Item>>;

    /// Up to `k` items ordered by ascending cosine distance between
    /// `full_text_embedding` and `vector`. `k` must be positive.
    async fn top_k_by_similarity(&self, vector: &Embedding, k: usize) -> CatalogResult<Vec<Item>>;

    /// Cheap round trip used by the readiness probe.
    async fn ping(&self) -> CatalogResult<()>;
}
