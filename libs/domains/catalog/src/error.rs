use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;
use uuid::Uuid;

/// Failure kinds shared by every catalog component.
///
/// Collaborator-specific errors (HTTP, Mongo, image decoding) are classified
/// into one of these at the adapter boundary; nothing above the adapters sees
/// a provider error type.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Upstream error: {message}")]
    Upstream { message: String, transient: bool },

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

impl CatalogError {
    pub fn item_not_found(id: Uuid) -> Self {
        CatalogError::NotFound(format!("Item {}", id))
    }

    pub fn blob_not_found(key: &str) -> Self {
        CatalogError::NotFound(format!("Blob '{}'", key))
    }

    /// Upstream failure that a retry could fix (throttling, 5xx, timeouts).
    pub fn transient(message: impl Into<String>) -> Self {
        CatalogError::Upstream {
            message: message.into(),
            transient: true,
        }
    }

    /// Upstream failure that will repeat on retry (bad payload, auth, schema).
    pub fn permanent(message: impl Into<String>) -> Self {
        CatalogError::Upstream {
            message: message.into(),
            transient: false,
        }
    }

    /// Whether a caller may retry the operation unchanged.
    pub fn is_transient(&self) -> bool {
        match self {
            CatalogError::Upstream { transient, .. } => *transient,
            CatalogError::StoreUnavailable(_) => true,
            _ => false,
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::InvalidInput(msg) => AppError::BadRequest(msg),
            err @ CatalogError::NotFound(_) => AppError::NotFound(err.to_string()),
            CatalogError::Conflict(msg) => AppError::Conflict(msg),
            CatalogError::Upstream { message, .. } => AppError::BadGateway(message),
            CatalogError::StoreUnavailable(msg) => AppError::ServiceUnavailable(msg),
        }
    }
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}
