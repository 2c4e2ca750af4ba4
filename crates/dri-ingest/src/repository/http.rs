//! HTTP repository client
//!
//! Talks to the repository server's admin API. Every endpoint answers with a
//! JSON envelope `{ "success": bool, "data": ..., "error": ... }`.

use super::{ObjectAttributes, RepoHandle, Repository};
use crate::error::{IngestError, Result};
use crate::hierarchy::{Model, ParentLookup};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default timeout for repository API requests in seconds.
/// Can be overridden via the DRI_API_TIMEOUT_SECS environment variable.
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 300;

/// Default repository server URL when not specified via environment variable.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";

/// HTTP client for the repository service
pub struct HttpRepository {
    client: Client,
    base_url: String,
}

/// JSON envelope wrapping every API response
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ObjectRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct SavedObject {
    pid: String,
}

#[derive(Debug, Serialize)]
struct CreateRequest<'a> {
    model: &'a str,
    label: Option<&'a str>,
    identifiers: &'a [String],
}

#[derive(Debug, Serialize)]
struct ParentRequest<'a> {
    parent: &'a str,
}

impl HttpRepository {
    /// Create a new client for the given base URL
    pub fn new(base_url: String) -> Result<Self> {
        let timeout_secs = std::env::var("DRI_API_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_API_TIMEOUT_SECS);

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| IngestError::repository(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        let base_url =
            std::env::var("DRI_SERVER_URL").unwrap_or_else(|_| DEFAULT_SERVER_URL.to_string());

        Self::new(base_url)
    }

    fn objects_url(&self) -> String {
        format!("{}/api/v1/objects", self.base_url)
    }

    fn parent_url(&self, id: &str) -> String {
        format!("{}/api/v1/objects/{}/parent", self.base_url, id)
    }

    fn datastream_url(&self, id: &str, name: &str) -> String {
        format!("{}/api/v1/objects/{}/datastreams/{}", self.base_url, id, name)
    }

    fn save_url(&self, id: &str) -> String {
        format!("{}/api/v1/objects/{}/save", self.base_url, id)
    }

    /// Unwrap a data-bearing envelope
    async fn unwrap_envelope<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let response = response
            .error_for_status()
            .map_err(|e| IngestError::repository(e.to_string()))?;

        let envelope: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| IngestError::repository(e.to_string()))?;

        if !envelope.success {
            return Err(IngestError::repository(
                envelope
                    .error
                    .unwrap_or_else(|| "repository reported failure without detail".to_string()),
            ));
        }

        envelope
            .data
            .ok_or_else(|| IngestError::repository("repository response carried no data"))
    }

    /// Check a unit envelope (no data expected)
    async fn check(response: reqwest::Response) -> Result<()> {
        let response = response
            .error_for_status()
            .map_err(|e| IngestError::repository(e.to_string()))?;

        let envelope: ApiResponse<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| IngestError::repository(e.to_string()))?;

        if !envelope.success {
            return Err(IngestError::repository(
                envelope
                    .error
                    .unwrap_or_else(|| "repository reported failure without detail".to_string()),
            ));
        }

        Ok(())
    }
}

#[async_trait]
impl Repository for HttpRepository {
    async fn create(&self, model: Model, attributes: ObjectAttributes) -> Result<RepoHandle> {
        let request = CreateRequest {
            model: model.as_str(),
            label: attributes.label.as_deref(),
            identifiers: &attributes.identifiers,
        };

        let response = self
            .client
            .post(self.objects_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| IngestError::repository(e.to_string()))?;

        let object: ObjectRef = Self::unwrap_envelope(response).await?;
        Ok(RepoHandle { id: object.id })
    }

    async fn find(
        &self,
        model: Model,
        lookup: ParentLookup,
        value: &str,
    ) -> Result<Option<RepoHandle>> {
        let response = self
            .client
            .get(self.objects_url())
            .query(&[("model", model.as_str()), (lookup.as_str(), value)])
            .send()
            .await
            .map_err(|e| IngestError::repository(e.to_string()))?;

        let objects: Vec<ObjectRef> = Self::unwrap_envelope(response).await?;
        Ok(objects.into_iter().next().map(|object| RepoHandle {
            id: object.id,
        }))
    }

    async fn set_parent(&self, child: &RepoHandle, parent: &RepoHandle) -> Result<()> {
        let response = self
            .client
            .put(self.parent_url(&child.id))
            .json(&ParentRequest { parent: &parent.id })
            .send()
            .await
            .map_err(|e| IngestError::repository(e.to_string()))?;

        Self::check(response).await
    }

    async fn attach_datastream(
        &self,
        handle: &RepoHandle,
        name: &str,
        content: &[u8],
        mime_type: &str,
    ) -> Result<()> {
        let response = self
            .client
            .post(self.datastream_url(&handle.id, name))
            .header(reqwest::header::CONTENT_TYPE, mime_type)
            .body(content.to_vec())
            .send()
            .await
            .map_err(|e| IngestError::repository(e.to_string()))?;

        Self::check(response).await
    }

    async fn save(&self, handle: &RepoHandle) -> Result<String> {
        let response = self
            .client
            .post(self.save_url(&handle.id))
            .send()
            .await
            .map_err(|e| IngestError::repository(e.to_string()))?;

        let saved: SavedObject = Self::unwrap_envelope(response).await?;
        Ok(saved.pid)
    }
}
