use std::sync::Arc;

use database::retry_if;
use tracing::{debug, instrument};

use crate::bounded::{gateway_call, store_call};
use crate::config::CatalogConfig;
use crate::embedding::EmbeddingGateway;
use crate::error::{CatalogError, CatalogResult};
use crate::models::{DEFAULT_SEARCH_RESULTS, ItemSummary, MAX_SEARCH_RESULTS};
use crate::repository::CatalogRepository;

/// Natural-language lookup over the catalog.
pub struct SearchService<R: CatalogRepository> {
    repository: Arc<R>,
    gateway: Arc<dyn EmbeddingGateway>,
    config: CatalogConfig,
}

/// Number of results to return: the default when unset, capped at
/// [`MAX_SEARCH_RESULTS`]. Zero is rejected.
pub fn effective_count(requested: Option<u32>) -> CatalogResult<usize> {
    match requested.unwrap_or(DEFAULT_SEARCH_RESULTS) {
        0 => Err(CatalogError::InvalidInput(
            "count must be at least 1".to_string(),
        )),
        n => Ok(n.min(MAX_SEARCH_RESULTS) as usize),
    }
}

impl<R: CatalogRepository> SearchService<R> {
    pub fn new(
        repository: Arc<R>,
        gateway: Arc<dyn EmbeddingGateway>,
        config: CatalogConfig,
    ) -> Self {
        Self {
            repository,
            gateway,
            config,
        }
    }

    /// Items closest in meaning to `query`, best match first.
    ///
    /// An empty query is embedded like any other text; it yields an arbitrary
    /// but valid ordering.
    #[instrument(skip(self, query), fields(query_len = query.len()))]
    pub async fn find_items(
        &self,
        query: &str,
        requested: Option<u32>,
    ) -> CatalogResult<Vec<ItemSummary>> {
        let k = effective_count(requested)?;
        if query.trim().is_empty() {
            debug!("Searching with an empty query");
        }

        let limit = self.config.call_timeout;
        let vector = gateway_call("embed_query", limit, self.gateway.embed_one(query)).await?;

        let items = retry_if(
            || store_call("top_k", limit, self.repository.top_k_by_similarity(&vector, k)),
            self.config.read_retry(),
            CatalogError::is_transient,
        )
        .await?;

        debug!(results = items.len(), k, "Search completed");
        Ok(items.iter().take(k).map(ItemSummary::from).collect())
    }
}

impl<R: CatalogRepository> Clone for SearchService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            gateway: Arc::clone(&self.gateway),
            config: self.config.clone(),
        }
    }
}
