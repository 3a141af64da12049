use async_trait::async_trait;

use crate::error::{CatalogError, CatalogResult};
use crate::models::{Embedding, ImageDescription};

/// Vision and embedding provider.
///
/// Implementations perform no retries; the services decide what is worth
/// repeating based on [`CatalogError::is_transient`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmbeddingGateway: Send + Sync {
    /// Ask the vision model for a structured description of the dominant
    /// object in `image`.
    async fn describe_image(
        &self,
        image: &[u8],
        content_type: &str,
    ) -> CatalogResult<ImageDescription>;

    /// One embedding per input, in input order.
    async fn embed(&self, texts: &[String]) -> CatalogResult<Vec<Embedding>>;

    async fn embed_one(&self, text: &str) -> CatalogResult<Embedding> {
        self.embed(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CatalogError::permanent("no embedding returned"))
    }
}
