//! API routes module
//!
//! This module defines all HTTP API routes for the SnapBox API.

pub mod catalog;
pub mod health;

use axum::Router;
use domain_catalog::CatalogRepository;

use crate::state::AppState;

/// Create all API routes
/// Note: These are nested under /api by axum_helpers::create_router
pub fn routes<R: CatalogRepository + 'static>(state: &AppState<R>) -> Router {
    Router::new()
        .nest("/catalog", catalog::router(state))
        .merge(health::router(state.clone()))
}
