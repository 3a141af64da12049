//! Deadlines for collaborator calls.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::{CatalogError, CatalogResult};

/// Run a provider call; an expired deadline is a transient upstream error.
pub(crate) async fn gateway_call<T>(
    operation: &'static str,
    limit: Duration,
    call: impl Future<Output = CatalogResult<T>>,
) -> CatalogResult<T> {
    tokio::time::timeout(limit, call).await.unwrap_or_else(|_| {
        warn!(operation, ?limit, "AI provider call timed out");
        Err(CatalogError::transient(format!(
            "{} timed out after {:?}",
            operation, limit
        )))
    })
}

/// Run a store call; an expired deadline means the store is unavailable.
pub(crate) async fn store_call<T>(
    operation: &'static str,
    limit: Duration,
    call: impl Future<Output = CatalogResult<T>>,
) -> CatalogResult<T> {
    tokio::time::timeout(limit, call).await.unwrap_or_else(|_| {
        warn!(operation, ?limit, "Store call timed out");
        Err(CatalogError::StoreUnavailable(format!(
            "{} timed out after {:?}",
            operation, limit
        )))
    })
}
