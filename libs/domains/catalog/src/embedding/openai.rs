use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use core_config::{ConfigError, FromEnv, env_duration_secs, env_or_default, env_required};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use strum::{Display, EnumString};
use tracing::{instrument, warn};

use super::EmbeddingGateway;
use super::prompt::{SYSTEM_PROMPT, USER_INSTRUCTION, parse_image_description};
use crate::error::{CatalogError, CatalogResult};
use crate::models::{Embedding, ImageDescription};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_AZURE_API_VERSION: &str = "2024-06-01";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";

/// Which URL and auth scheme the provider expects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ApiFlavor {
    /// `{base}/chat/completions`, bearer token
    #[default]
    OpenAi,
    /// `{endpoint}/openai/deployments/{deployment}/...?api-version=`, `api-key` header
    Azure,
}

#[derive(Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub flavor: ApiFlavor,
    /// Only sent for [`ApiFlavor::Azure`]
    pub api_version: String,
    /// Model name, or deployment name on Azure
    pub chat_model: String,
    pub embedding_model: String,
    pub timeout: Duration,
}

impl fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .field("flavor", &self.flavor)
            .field("api_version", &self.api_version)
            .field("chat_model", &self.chat_model)
            .field("embedding_model", &self.embedding_model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            flavor: ApiFlavor::OpenAi,
            api_version: DEFAULT_AZURE_API_VERSION.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Switch to Azure deployment URLs; `base_url` becomes the resource endpoint.
    pub fn with_azure(mut self, api_version: impl Into<String>) -> Self {
        self.flavor = ApiFlavor::Azure;
        self.api_version = api_version.into();
        self
    }

    fn endpoint(&self, model: &str, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        match self.flavor {
            ApiFlavor::OpenAi => format!("{}/{}", base, path),
            ApiFlavor::Azure => format!(
                "{}/openai/deployments/{}/{}?api-version={}",
                base, model, path, self.api_version
            ),
        }
    }

    pub fn chat_url(&self) -> String {
        self.endpoint(&self.chat_model, "chat/completions")
    }

    pub fn embeddings_url(&self) -> String {
        self.endpoint(&self.embedding_model, "embeddings")
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.flavor {
            ApiFlavor::OpenAi => request.bearer_auth(&self.api_key),
            ApiFlavor::Azure => request.header("api-key", &self.api_key),
        }
    }
}

impl FromEnv for OpenAiConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let flavor_raw = env_or_default("OPENAI_API_FLAVOR", "openai");
        let flavor = flavor_raw
            .trim()
            .parse::<ApiFlavor>()
            .map_err(|_| ConfigError::InvalidValue {
                key: "OPENAI_API_FLAVOR".to_string(),
                details: format!("'{}' is not one of openai, azure", flavor_raw),
            })?;

        Ok(Self {
            api_key: env_required("OPENAI_API_KEY")?,
            base_url: env_or_default("OPENAI_BASE_URL", DEFAULT_BASE_URL),
            flavor,
            api_version: env_or_default("OPENAI_API_VERSION", DEFAULT_AZURE_API_VERSION),
            chat_model: env_or_default("OPENAI_CHAT_MODEL", DEFAULT_CHAT_MODEL),
            embedding_model: env_or_default("OPENAI_EMBEDDING_MODEL", DEFAULT_EMBEDDING_MODEL),
            timeout: env_duration_secs("OPENAI_TIMEOUT_SECS", 60)?,
        })
    }
}

/// [`EmbeddingGateway`] over the OpenAI REST API or an Azure OpenAI resource.
pub struct OpenAiGateway {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiGateway {
    pub fn new(config: OpenAiConfig) -> CatalogResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CatalogError::permanent(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    async fn post<T: DeserializeOwned>(&self, url: String, body: &Value) -> CatalogResult<T> {
        let response = self
            .config
            .authorize(self.client.post(url))
            .json(body)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(status_error(status, &error_text));
        }

        response.json::<T>().await.map_err(request_error)
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[async_trait]
impl EmbeddingGateway for OpenAiGateway {
    #[instrument(skip(self, image), fields(size = image.len()))]
    async fn describe_image(
        &self,
        image: &[u8],
        content_type: &str,
    ) -> CatalogResult<ImageDescription> {
        if image.is_empty() {
            return Err(CatalogError::InvalidInput("image is empty".to_string()));
        }

        let data_url = format!("data:{};base64,{}", content_type, BASE64.encode(image));
        let body = json!({
            "model": self.config.chat_model,
            "temperature": 0,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                {
                    "role": "user",
                    "content": [
                        { "type": "text", "text": USER_INSTRUCTION },
                        { "type": "image_url", "image_url": { "url": data_url } }
                    ]
                }
            ]
        });

        let completion: ChatCompletion = self.post(self.config.chat_url(), &body).await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| CatalogError::permanent("vision reply has no content"))?;

        parse_image_description(&content)
    }

    #[instrument(skip(self, texts), fields(inputs = texts.len()))]
    async fn embed(&self, texts: &[String]) -> CatalogResult<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        // The API rejects empty strings outright.
        let input: Vec<&str> = texts
            .iter()
            .map(|t| if t.is_empty() { " " } else { t.as_str() })
            .collect();

        let body = json!({
            "model": self.config.embedding_model,
            "input": input,
        });

        let response: EmbeddingResponse = self.post(self.config.embeddings_url(), &body).await?;
        collect_embeddings(response.data, texts.len())
    }
}

fn collect_embeddings(
    mut data: Vec<EmbeddingData>,
    expected: usize,
) -> CatalogResult<Vec<Embedding>> {
    if data.len() != expected {
        return Err(CatalogError::permanent(format!(
            "provider returned {} embeddings for {} inputs",
            data.len(),
            expected
        )));
    }

    data.sort_by_key(|d| d.index);
    if data.iter().enumerate().any(|(i, d)| d.index != i) {
        return Err(CatalogError::permanent(
            "provider returned embeddings with inconsistent indices",
        ));
    }

    data.into_iter().map(|d| Embedding::new(d.embedding)).collect()
}

fn request_error(err: reqwest::Error) -> CatalogError {
    CatalogError::Upstream {
        transient: err.is_timeout() || err.is_connect(),
        message: format!("AI provider request failed: {}", err.without_url()),
    }
}

fn status_error(status: StatusCode, body: &str) -> CatalogError {
    let body: String = body.chars().take(500).collect();
    warn!(%status, body = %body, "AI provider returned an error");
    CatalogError::Upstream {
        transient: status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error(),
        message: format!("AI provider returned {}", status),
    }
}
