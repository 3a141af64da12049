//! Database connectors and shared utilities.
//!
//! # Features
//!
//! - `mongodb` - MongoDB client construction, health checks
//! - `config` - `core_config::FromEnv` support for connection settings
//!
//! The [`common::retry`] helpers are always available and are used both for
//! connection bootstrap and for retrying idempotent reads.
//!
//! ```ignore
//! use database::mongodb::{MongoConfig, connect_from_config_with_retry};
//!
//! let config = MongoConfig::with_database("mongodb://localhost:27017", "snapbox");
//! let client = connect_from_config_with_retry(&config, None).await?;
//! let items = client.database(config.database()).collection::<Document>("items");
//! ```

pub mod common;

#[cfg(feature = "mongodb")]
pub mod mongodb;

pub use common::{RetryConfig, retry, retry_if, retry_with_backoff};
