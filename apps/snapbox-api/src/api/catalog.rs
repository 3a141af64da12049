//! Catalog API routes
//!
//! This module wires up the catalog domain to HTTP routes.

use axum::Router;
use domain_catalog::{CatalogRepository, handlers};

use crate::state::AppState;

/// Create catalog router
pub fn router<R: CatalogRepository + 'static>(state: &AppState<R>) -> Router {
    handlers::router(state.catalog.clone(), state.search.clone())
}
