//! Utilities shared by every backend

pub mod retry;

pub use retry::{RetryConfig, retry, retry_if, retry_with_backoff};
