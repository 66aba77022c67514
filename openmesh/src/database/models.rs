//! Catalog models
//!
//! Rust structs representing catalog records.
//! All models use serde with camelCase field names, matching the
//! JSON bodies exchanged with the remote catalog service.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A record that can be stored in a record table
pub trait Record: Serialize + DeserializeOwned + Send + Sync + Unpin {
    /// Unique identifier within its table
    fn id(&self) -> &str;
}

/// Fixed set of model categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelCategory {
    Monument,
    Building,
    Infrastructure,
    Environment,
    Artifact,
    Other,
}

impl ModelCategory {
    pub const ALL: [ModelCategory; 6] = [
        Self::Monument,
        Self::Building,
        Self::Infrastructure,
        Self::Environment,
        Self::Artifact,
        Self::Other,
    ];
}

/// A 3D asset record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Payload reference. Empty when stored locally; a handle URL after a
    /// single-model fetch; a server URL in remote mode.
    #[serde(default)]
    pub file_url: String,
    #[serde(default)]
    pub file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub license: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    pub category: ModelCategory,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Epoch milliseconds
    pub created_at: i64,
}

impl Model {
    /// Assemble a full record from create metadata.
    /// The payload reference starts empty and is derived on read.
    pub fn from_new(id: String, new: NewModel, file_name: String, created_at: i64) -> Self {
        Self {
            id,
            title: new.title,
            description: new.description,
            file_url: String::new(),
            file_name,
            thumbnail: new.thumbnail,
            license: new.license,
            source_url: new.source_url,
            region: new.region,
            category: new.category,
            tags: new.tags,
            created_at,
        }
    }
}

impl Record for Model {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Create model request: every model field except id, timestamp and payload reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewModel {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub license: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    pub category: ModelCategory,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A named grouping of models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Member model ids. Not checked against the models table.
    #[serde(default)]
    pub model_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    /// Epoch milliseconds
    pub created_at: i64,
}

impl Collection {
    pub fn from_new(id: String, new: NewCollection, created_at: i64) -> Self {
        Self {
            id,
            name: new.name,
            description: new.description,
            model_ids: new.model_ids,
            cover_image: new.cover_image,
            created_at,
        }
    }
}

impl Record for Collection {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Create collection request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCollection {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub model_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
}

/// Listing filter: free-text search plus optional category
#[derive(Debug, Clone, Default)]
pub struct ModelFilter {
    /// Case-insensitive substring matched against title and tags
    pub search: String,
    pub category: Option<ModelCategory>,
}

impl ModelFilter {
    /// Predicate over models. The search text is lowercased once here, not
    /// once per model.
    pub fn matcher(&self) -> impl Fn(&Model) -> bool + '_ {
        let query = self.search.to_lowercase();

        move |model: &Model| {
            let matches_search = model.title.to_lowercase().contains(&query)
                || model
                    .tags
                    .iter()
                    .any(|tag| tag.to_lowercase().contains(&query));

            let matches_category = self
                .category
                .map_or(true, |category| model.category == category);

            matches_search && matches_category
        }
    }
}
