//! # Axum Helpers
//!
//! Shared HTTP plumbing for the SnapBox services.
//!
//! - **[`server`]**: router factory with API docs, health/readiness, graceful shutdown
//! - **[`errors`]**: `AppError` and the `{code, error, message, details}` response body
//! - **[`extractors`]**: `UuidPath`, `ValidatedJson`
//!
//! ```ignore
//! use axum_helpers::server::{create_production_app, create_router, health_router};
//! use core_config::{app_info, server::ServerConfig};
//!
//! let config = ServerConfig::default();
//! let router = create_router::<ApiDoc>(api_routes, &config)?;
//! let app = router.merge(health_router(app_info!()));
//! create_production_app(app, &config, Duration::from_secs(30), async {}).await?;
//! ```

pub mod errors;
pub mod extractors;
pub mod server;

pub use server::{
    HealthCheckFuture, ShutdownCoordinator, create_production_app, create_router, health_router,
    run_health_checks,
};

pub use errors::{AppError, ErrorCode, ErrorResponse};

pub use extractors::{UuidPath, ValidatedJson};
