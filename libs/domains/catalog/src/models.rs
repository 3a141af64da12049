use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::error::{CatalogError, CatalogResult};

/// Dimension of every stored embedding (`text-embedding-ada-002`).
pub const EMBEDDING_DIMENSION: usize = 1536;

/// Upper bound on search results regardless of what the caller asks for.
pub const MAX_SEARCH_RESULTS: u32 = 10;

pub const DEFAULT_SEARCH_RESULTS: u32 = 5;

/// Record type written on ingest; older records may carry other values.
pub const DEFAULT_ITEM_TYPE: &str = "component";

pub const INITIAL_VERSION: u64 = 1;

/// A fixed-dimension semantic vector.
///
/// Serialized as a bare array so stored documents stay compatible with the
/// vector index definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Embedding(Vec<f32>);

impl Embedding {
    /// Accept a provider vector, rejecting anything that is not
    /// [`EMBEDDING_DIMENSION`] long.
    pub fn new(values: Vec<f32>) -> CatalogResult<Self> {
        if values.len() != EMBEDDING_DIMENSION {
            return Err(CatalogError::permanent(format!(
                "embedding has {} dimensions, expected {}",
                values.len(),
                EMBEDDING_DIMENSION
            )));
        }
        Ok(Self(values))
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn dimension(&self) -> usize {
        self.0.len()
    }
}

/// Catalog record for one photographed object.
///
/// Every record lives under the configured partition key; `version` starts at
/// [`INITIAL_VERSION`] and is bumped by the store on each replace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    #[serde(rename = "_id", alias = "id", with = "uuid_as_string")]
    pub id: Uuid,
    #[serde(rename = "type", default = "default_item_type")]
    pub item_type: String,
    pub partition_key: String,
    #[serde(default)]
    pub blob_id: Option<String>,
    #[serde(default)]
    pub box_id: Option<String>,
    pub title: String,
    pub category: String,
    pub detailed_description: String,
    pub colors: Vec<String>,
    #[serde(default)]
    pub title_embedding: Embedding,
    #[serde(default)]
    pub category_embedding: Embedding,
    #[serde(default)]
    pub detailed_description_embedding: Embedding,
    #[serde(default)]
    pub full_text_embedding: Embedding,
    #[serde(default)]
    pub user_description: Option<String>,
    #[serde(default)]
    pub user_description_embedding: Option<Embedding>,
    pub count: f64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default = "initial_version")]
    pub version: u64,
}

fn default_item_type() -> String {
    DEFAULT_ITEM_TYPE.to_string()
}

fn initial_version() -> u64 {
    INITIAL_VERSION
}

impl Item {
    /// The owner's text when present, otherwise the model's description.
    pub fn effective_description(&self) -> &str {
        self.user_description
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or(&self.detailed_description)
    }

    /// Text behind `full_text_embedding`.
    pub fn full_text(&self) -> String {
        full_text(&self.title, self.effective_description(), &self.colors)
    }
}

/// Title, description and colors joined by single spaces, blanks skipped.
///
/// Category is not part of the full text; it has its own embedding.
pub fn full_text(title: &str, description: &str, colors: &[String]) -> String {
    [title, description]
        .into_iter()
        .chain(colors.iter().map(String::as_str))
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Structured description returned by the vision model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDescription {
    pub title: String,
    pub category: String,
    pub detailed_description: String,
    pub colors: Vec<String>,
}

/// Public projection of an [`Item`]; embeddings and the partition key never
/// leave the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemSummary {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub item_type: String,
    pub blob_id: Option<String>,
    pub box_id: Option<String>,
    pub title: String,
    pub category: String,
    pub detailed_description: String,
    /// One to three dominant colors
    pub colors: Vec<String>,
    pub count: f64,
    pub user_description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Pass back as `expectedVersion` to make an update conditional
    pub version: u64,
}

impl From<&Item> for ItemSummary {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id,
            item_type: item.item_type.clone(),
            blob_id: item.blob_id.clone(),
            box_id: item.box_id.clone(),
            title: item.title.clone(),
            category: item.category.clone(),
            detailed_description: item.detailed_description.clone(),
            colors: item.colors.clone(),
            count: item.count,
            user_description: item.user_description.clone(),
            created_at: item.created_at,
            updated_at: item.updated_at,
            version: item.version,
        }
    }
}

/// Body of `POST /search`.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    /// Free-text query; may be empty
    #[serde(default)]
    pub query: String,
    /// Requested result count, defaults to 5 and is capped at 10
    #[serde(default)]
    pub count: Option<u32>,
}

/// Owner-editable fields, applied by `PUT /items/{id}`.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemFields {
    /// New owner description; an empty string clears it, absent leaves it as is
    #[validate(length(max = 4000))]
    #[serde(default)]
    pub user_description: Option<String>,
    #[validate(range(min = 0.0))]
    pub count: f64,
    /// When set, the update only applies if the stored version still matches
    #[serde(default)]
    pub expected_version: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeleteItemResponse {
    pub deleted: bool,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ImageQuery {
    /// Serve the thumbnail instead of the original
    #[serde(default)]
    pub thumb: bool,
}

/// Multipart form accepted by `POST /items`.
#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct UploadItemForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
    pub box_id: String,
}

/// Ids are stored as strings so filters and documents always agree on the
/// BSON representation.
mod uuid_as_string {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};
    use uuid::Uuid;

    pub fn serialize<S: Serializer>(id: &Uuid, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(id)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Uuid, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Uuid::parse_str(&raw).map_err(D::Error::custom)
    }
}
