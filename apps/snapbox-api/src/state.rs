//! Application state management.
//!
//! The catalog store is chosen at startup, so the state is generic over the
//! repository; everything else is behind trait objects inside the services.

use domain_catalog::{CatalogRepository, CatalogService, SearchService};

/// Shared application state.
///
/// Cloning only bumps the reference counts held by the services.
pub struct AppState<R: CatalogRepository> {
    pub catalog: CatalogService<R>,
    pub search: SearchService<R>,
}

impl<R: CatalogRepository> Clone for AppState<R> {
    fn clone(&self) -> Self {
        Self {
            catalog: self.catalog.clone(),
            search: self.search.clone(),
        }
    }
}
