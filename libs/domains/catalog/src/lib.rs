//! Catalog Domain
//!
//! Photographed inventory items: each upload is stored as an image plus a
//! thumbnail, described by a vision model, embedded, and kept in a catalog
//! that can be searched by meaning.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────┐
//! │           Handlers           │  ← HTTP endpoints, multipart upload
//! └──────┬────────────────┬──────┘
//!        │                │
//! ┌──────▼──────┐  ┌──────▼──────┐
//! │   Catalog   │  │   Search    │  ← Orchestration, deadlines, retries
//! │   Service   │  │   Service   │
//! └──┬───┬───┬──┘  └───┬─────┬───┘
//!    │   │   └─────────│──┐  │
//! ┌──▼───▼──┐  ┌───────▼──▼──▼───┐  ┌─────────────┐
//! │  Blob   │  │    Embedding    │  │  Catalog    │
//! │  Store  │  │     Gateway     │  │ Repository  │  ← Mongo or in-memory
//! └─────────┘  └─────────────────┘  └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use domain_catalog::{
//!     CatalogConfig, CatalogService, InMemoryBlobStore, InMemoryCatalogRepository,
//!     OpenAiConfig, OpenAiGateway, SearchService, handlers,
//! };
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let repository = Arc::new(InMemoryCatalogRepository::new());
//! let gateway = Arc::new(OpenAiGateway::new(OpenAiConfig::new("sk-..."))?);
//! let config = CatalogConfig::default();
//!
//! let catalog = CatalogService::new(
//!     repository.clone(),
//!     Arc::new(InMemoryBlobStore::new()),
//!     gateway.clone(),
//!     config.clone(),
//! );
//! let search = SearchService::new(repository, gateway, config);
//!
//! let router = handlers::router(catalog, search);
//! # Ok(())
//! # }
//! ```

mod bounded;

pub mod blob;
pub mod config;
pub mod embedding;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod search;
pub mod service;
pub mod similarity;
pub mod store;
pub mod thumbnail;

// Re-export commonly used types
pub use blob::{AzureBlobConfig, AzureBlobStore, BlobStore, InMemoryBlobStore, StoredBlob};
pub use config::CatalogConfig;
pub use embedding::{ApiFlavor, EmbeddingGateway, OpenAiConfig, OpenAiGateway};
pub use error::{CatalogError, CatalogResult};
pub use handlers::ApiDoc;
pub use models::{
    Embedding, ImageDescription, Item, ItemSummary, SearchRequest, UpdateItemFields,
};
pub use repository::CatalogRepository;
pub use search::SearchService;
pub use service::CatalogService;
pub use store::{InMemoryCatalogRepository, MongoCatalogOptions, MongoCatalogRepository};
