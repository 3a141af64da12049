use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use core_config::{ConfigError, FromEnv, env_duration_secs, env_required};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument};

use super::{BlobStore, StoredBlob};
use crate::error::{CatalogError, CatalogResult};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Container-scoped access to Azure Blob Storage through a SAS token.
#[derive(Clone)]
pub struct AzureBlobConfig {
    /// e.g. `https://account.blob.core.windows.net/images`
    pub container_url: String,
    /// SAS query string with read, write and delete permissions
    pub sas_token: String,
    pub timeout: Duration,
}

impl fmt::Debug for AzureBlobConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureBlobConfig")
            .field("container_url", &self.container_url)
            .field("sas_token", &"***")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl AzureBlobConfig {
    pub fn new(container_url: impl Into<String>, sas_token: impl Into<String>) -> Self {
        Self {
            container_url: container_url.into(),
            sas_token: sas_token.into(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn blob_url(&self, key: &str) -> String {
        format!(
            "{}/{}?{}",
            self.container_url.trim_end_matches('/'),
            urlencoding::encode(key),
            self.sas_token.trim_start_matches('?')
        )
    }
}

impl FromEnv for AzureBlobConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            container_url: env_required("AZURE_STORAGE_CONTAINER_URL")?,
            sas_token: env_required("AZURE_STORAGE_SAS_TOKEN")?,
            timeout: env_duration_secs("AZURE_STORAGE_TIMEOUT_SECS", 30)?,
        })
    }
}

/// [`BlobStore`] backed by the Azure Blob REST API.
pub struct AzureBlobStore {
    client: Client,
    config: AzureBlobConfig,
}

impl AzureBlobStore {
    pub fn new(config: AzureBlobConfig) -> CatalogResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CatalogError::permanent(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl BlobStore for AzureBlobStore {
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> CatalogResult<()> {
        let response = self
            .client
            .put(self.config.blob_url(key))
            .header("x-ms-blob-type", "BlockBlob")
            .header(CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(request_error)?;

        match response.status() {
            status if status.is_success() => Ok(()),
            status => Err(status_error("put", key, status)),
        }
    }

    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> CatalogResult<StoredBlob> {
        let response = self
            .client
            .get(self.config.blob_url(key))
            .send()
            .await
            .map_err(request_error)?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(CatalogError::blob_not_found(key)),
            status if !status.is_success() => Err(status_error("get", key, status)),
            _ => {
                let content_type = response
                    .headers()
                    .get(CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or(DEFAULT_CONTENT_TYPE)
                    .to_string();
                let bytes = response.bytes().await.map_err(request_error)?;
                Ok(StoredBlob {
                    bytes,
                    content_type,
                })
            }
        }
    }

    #[instrument(skip(self))]
    async fn delete_if_exists(&self, key: &str) -> CatalogResult<()> {
        let response = self
            .client
            .delete(self.config.blob_url(key))
            .send()
            .await
            .map_err(request_error)?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                debug!(key, "Blob already absent");
                Ok(())
            }
            status if status.is_success() => Ok(()),
            status => Err(status_error("delete", key, status)),
        }
    }

    #[instrument(skip(self))]
    async fn exists(&self, key: &str) -> CatalogResult<bool> {
        let response = self
            .client
            .head(self.config.blob_url(key))
            .send()
            .await
            .map_err(request_error)?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(status_error("head", key, status)),
        }
    }
}

fn request_error(err: reqwest::Error) -> CatalogError {
    // The URL carries the SAS token; never let it reach logs or clients.
    let err = err.without_url();
    if err.is_timeout() || err.is_connect() {
        CatalogError::StoreUnavailable(format!("blob store unreachable: {}", err))
    } else {
        CatalogError::permanent(format!("blob store request failed: {}", err))
    }
}

fn status_error(operation: &str, key: &str, status: StatusCode) -> CatalogError {
    CatalogError::Upstream {
        transient: status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error(),
        message: format!("blob store {} of '{}' returned {}", operation, key, status),
    }
}
