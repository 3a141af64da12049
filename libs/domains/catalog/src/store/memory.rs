use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{CatalogError, CatalogResult};
use crate::models::{Embedding, Item};
use crate::repository::CatalogRepository;
use crate::similarity::rank_top_k;

/// Process-local [`CatalogRepository`] with brute-force similarity search.
#[derive(Default)]
pub struct InMemoryCatalogRepository {
    items: RwLock<HashMap<Uuid, Item>>,
}

impl InMemoryCatalogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }
}

#[async_trait]
impl CatalogRepository for InMemoryCatalogRepository {
    #[instrument(skip(self, item), fields(item_id = %item.id))]
    async fn insert(&self, item: &Item) -> CatalogResult<()> {
        let mut items = self.items.write().await;
        if items.contains_key(&item.id) {
            return Err(CatalogError::Conflict(format!(
                "Item {} already exists",
                item.id
            )));
        }
        items.insert(item.id, item.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> CatalogResult<Item> {
        self.items
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| CatalogError::item_not_found(id))
    }

    #[instrument(skip(self, item), fields(item_id = %item.id))]
    async fn replace(&self, item: &Item, expected_version: Option<u64>) -> CatalogResult<Item> {
        let mut items = self.items.write().await;
        let stored = items
            .get_mut(&item.id)
            .ok_or_else(|| CatalogError::item_not_found(item.id))?;

        if let Some(expected) = expected_version {
            if stored.version != expected {
                return Err(CatalogError::Conflict(format!(
                    "Item {} is at version {}, expected {}",
                    item.id, stored.version, expected
                )));
            }
        }

        let next_version = stored.version + 1;
        *stored = Item {
            version: next_version,
            ..item.clone()
        };
        Ok(stored.clone())
    }

    async fn delete(&self, id: Uuid) -> CatalogResult<()> {
        self.items
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| CatalogError::item_not_found(id))
    }

    async fn distinct_box_ids(&self) -> CatalogResult<BTreeSet<String>> {
        Ok(self
            .items
            .read()
            .await
            .values()
            .filter_map(|item| item.box_id.clone())
            .filter(|box_id| !box_id.is_empty())
            .collect())
    }

    async fn find_by_box_id(&self, box_id: &str) -> CatalogResult<Vec<Item>> {
        let mut found: Vec<Item> = self
            .items
            .read()
            .await
            .values()
            .filter(|item| item.box_id.as_deref() == Some(box_id))
            .cloned()
            .collect();
        found.sort_by_key(|item| item.created_at);
        Ok(found)
    }

    #[instrument(skip(self, vector))]
    async fn top_k_by_similarity(&self, vector: &Embedding, k: usize) -> CatalogResult<Vec<Item>> {
        if k == 0 {
            return Err(CatalogError::InvalidInput("k must be positive".to_string()));
        }
        Ok(rank_top_k(self.items.read().await.values(), vector, k))
    }

    async fn ping(&self) -> CatalogResult<()> {
        Ok(())
    }
}
