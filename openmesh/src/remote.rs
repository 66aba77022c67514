//! Remote catalog gateway
//!
//! Maps each catalog operation onto one HTTP call against the remote
//! catalog service:
//!
//! | Operation | Request |
//! |---|---|
//! | list models | `GET /models` |
//! | get model | `GET /models/{id}` |
//! | create model | `POST /models` (multipart: `file` + JSON `data`) |
//! | list collections | `GET /collections` |
//! | get collection | `GET /collections/{id}` |
//! | create collection | `POST /collections` (JSON) |
//! | add model to collection | `POST /collections/{id}/models` (JSON) |
//!
//! A non-2xx answer to a by-id lookup means "absent". Adding a model to a
//! collection that does not exist (404) is also "absent". Any other non-2xx
//! answer is an error.

use crate::config::USER_AGENT;
use crate::database::{Collection, Model, NewCollection, NewModel};
use crate::error::{AppError, Result};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;

/// Stateless HTTP client for the remote catalog service
#[derive(Clone, Debug)]
pub struct RemoteGateway {
    client: Client,
    base_url: Url,
}

impl RemoteGateway {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| AppError::Config(format!("invalid API URL {}: {}", base_url, e)))?;

        if base_url.cannot_be_a_base() {
            return Err(AppError::Config(format!(
                "API URL cannot be used as a base: {}",
                base_url
            )));
        }

        let client = Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self { client, base_url })
    }

    pub async fn list_models(&self) -> Result<Vec<Model>> {
        self.get_json(&["models"]).await
    }

    pub async fn get_model(&self, id: &str) -> Result<Option<Model>> {
        self.get_json_optional(&["models", id]).await
    }

    /// Upload a payload with its metadata. The server assigns id and file URL.
    pub async fn create_model(&self, metadata: &NewModel, data: Vec<u8>) -> Result<Model> {
        let url = self.endpoint(&["models"]);

        tracing::debug!("Uploading model {} ({} bytes) to {}", metadata.title, data.len(), url);

        let form = Form::new()
            .part("file", Part::bytes(data).file_name(metadata.file_name.clone()))
            .text("data", serde_json::to_string(metadata)?);

        let response = self.client.post(url.clone()).multipart(form).send().await?;
        read_json(ensure_success(response, &url)?).await
    }

    pub async fn list_collections(&self) -> Result<Vec<Collection>> {
        self.get_json(&["collections"]).await
    }

    pub async fn get_collection(&self, id: &str) -> Result<Option<Collection>> {
        self.get_json_optional(&["collections", id]).await
    }

    pub async fn create_collection(&self, collection: &NewCollection) -> Result<Collection> {
        let url = self.endpoint(&["collections"]);

        let response = self.client.post(url.clone()).json(collection).send().await?;
        read_json(ensure_success(response, &url)?).await
    }

    /// Append a model id to a collection on the server
    pub async fn append_model_id(
        &self,
        collection_id: &str,
        model_id: &str,
    ) -> Result<Option<Collection>> {
        let url = self.endpoint(&["collections", collection_id, "models"]);

        let response = self
            .client
            .post(url.clone())
            .json(&serde_json::json!({ "modelId": model_id }))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!("{} returned 404, collection absent", url);
            return Ok(None);
        }

        read_json(ensure_success(response, &url)?).await.map(Some)
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        let url = self.endpoint(segments);

        let response = self.client.get(url.clone()).send().await?;
        read_json(ensure_success(response, &url)?).await
    }

    async fn get_json_optional<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<Option<T>> {
        let url = self.endpoint(segments);

        let response = self.client.get(url.clone()).send().await?;
        if !response.status().is_success() {
            tracing::debug!("{} returned {}, treating as absent", url, response.status());
            return Ok(None);
        }

        read_json(response).await.map(Some)
    }

    /// Base URL extended with percent-encoded path segments
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

fn ensure_success(response: Response, url: &Url) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    tracing::debug!("{} returned {}", url, status);
    Err(AppError::Remote {
        status: status.as_u16(),
        url: url.to_string(),
    })
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}
