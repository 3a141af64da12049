//! Readiness endpoint

use axum::{Router, extract::State, response::IntoResponse, routing::get};
use axum_helpers::{HealthCheckFuture, run_health_checks};
use domain_catalog::CatalogRepository;

use crate::state::AppState;

/// Create a readiness router
pub fn router<R: CatalogRepository + 'static>(state: AppState<R>) -> Router {
    Router::new()
        .route("/ready", get(readiness_check::<R>))
        .with_state(state)
}

/// Readiness check - probes the catalog store and the blob store
async fn readiness_check<R: CatalogRepository + 'static>(
    State(state): State<AppState<R>>,
) -> impl IntoResponse {
    let catalog = &state.catalog;
    run_health_checks(vec![
        (
            "catalog",
            Box::pin(async move { catalog.check_catalog().await.map_err(|e| e.to_string()) })
                as HealthCheckFuture<'_>,
        ),
        (
            "blobs",
            Box::pin(async move { catalog.check_blobs().await.map_err(|e| e.to_string()) })
                as HealthCheckFuture<'_>,
        ),
    ])
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use domain_catalog::{
        CatalogConfig, CatalogService, EmbeddingGateway, InMemoryBlobStore,
        InMemoryCatalogRepository, OpenAiConfig, OpenAiGateway, SearchService,
    };
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn memory_state() -> AppState<InMemoryCatalogRepository> {
        let repository = Arc::new(InMemoryCatalogRepository::new());
        let gateway: Arc<dyn EmbeddingGateway> =
            Arc::new(OpenAiGateway::new(OpenAiConfig::new("sk-unused")).unwrap());
        let config = CatalogConfig::default();

        AppState {
            catalog: CatalogService::new(
                repository.clone(),
                Arc::new(InMemoryBlobStore::new()),
                gateway.clone(),
                config.clone(),
            ),
            search: SearchService::new(repository, gateway, config),
        }
    }

    #[tokio::test]
    async fn test_ready_with_memory_backends() {
        let app = router(memory_state());
        let response = app
            .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ready");
        assert_eq!(body["catalog"], "connected");
        assert_eq!(body["blobs"], "connected");
    }
}
