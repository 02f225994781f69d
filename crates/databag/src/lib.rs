//! DeployHook data-bag store adapter.
//!
//! Implements [`deploy::DeployStore`] against a configuration-management
//! server's data-bag REST API:
//!
//! | Operation | Request | Not found |
//! |-----------|---------|-----------|
//! | load container | `GET /data/{bag}` | `404` |
//! | create container | `POST /data` `{"name": bag}` | — |
//! | load record | `GET /data/{bag}/{id}` | `404` |
//! | save record | `PUT /data/{bag}/{id}`, then `POST /data/{bag}` on `404` | — |
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** This crate must not contain domain rules. HTTP
//! transport, authentication headers, and status-code mapping live here; the
//! [`deploy`] crate sees only [`deploy::DeployStore`].

use std::time::Duration;

use async_trait::async_trait;
use deploy::{
    ContainerName, DeployContainer, DeployRecord, DeployStore, Lookup, RecordId, StoreError,
};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// Errors raised while constructing a [`DataBagClient`].
#[derive(Debug, Error)]
pub enum DataBagClientError {
    /// The base URL is empty or not an absolute `http`/`https` URL.
    #[error("invalid store URL '{0}'")]
    InvalidUrl(String),

    /// The underlying HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Connection settings for a [`DataBagClient`].
#[derive(Debug, Clone)]
pub struct DataBagConfig {
    /// Server base URL, e.g. `https://chef.example.com/organizations/ops`.
    pub base_url: String,
    /// Bearer token sent with every request, if any.
    pub token: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

#[derive(Serialize)]
struct CreateContainerRequest<'a> {
    name: &'a str,
}

/// HTTP data-bag store.
#[derive(Debug, Clone)]
pub struct DataBagClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl DataBagClient {
    /// Creates a client from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not absolute `http(s)` or the HTTP client
    /// cannot be constructed.
    pub fn new(config: &DataBagConfig) -> Result<Self, DataBagClientError> {
        let invalid = || DataBagClientError::InvalidUrl(config.base_url.clone());
        let base_url = Url::parse(&config.base_url).map_err(|_| invalid())?;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(invalid());
        }

        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            base_url,
            token: config.token.clone(),
        })
    }

    /// Builds `{base}/data/{segments..}`, percent-encoding each segment so
    /// `/`, `?` and `#` in a record id stay inside that segment.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // `new` rejects cannot-be-a-base URLs, so this always succeeds.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("data");
            for segment in segments {
                path.push(segment);
            }
        }
        url
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response, StoreError> {
        self.authorize(req)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(transport)
    }

    async fn put_record(&self, record: &DeployRecord, body: &serde_json::Value) -> Result<Response, StoreError> {
        let url = self.url(&[record.container().as_str(), record.id().as_str()]);
        self.send(self.client.put(url).json(body)).await
    }

    async fn post_record(&self, record: &DeployRecord, body: &serde_json::Value) -> Result<Response, StoreError> {
        let url = self.url(&[record.container().as_str()]);
        self.send(self.client.post(url).json(body)).await
    }
}

#[async_trait]
impl DeployStore for DataBagClient {
    async fn load_container(&self, name: &ContainerName) -> Result<Lookup<DeployContainer>, StoreError> {
        let response = self.send(self.client.get(self.url(&[name.as_str()]))).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(Lookup::NotFound),
            s if s.is_success() => Ok(Lookup::Found(DeployContainer { name: name.clone() })),
            _ => Err(unexpected(response).await),
        }
    }

    async fn create_container(&self, name: &ContainerName) -> Result<DeployContainer, StoreError> {
        let body = CreateContainerRequest { name: name.as_str() };
        let response = self.send(self.client.post(self.url(&[])).json(&body)).await?;
        match response.status() {
            // Another writer created it between our lookup and this request.
            StatusCode::CONFLICT => {
                debug!(container = %name, "container already exists");
                Ok(DeployContainer { name: name.clone() })
            }
            s if s.is_success() => Ok(DeployContainer { name: name.clone() }),
            _ => Err(unexpected(response).await),
        }
    }

    async fn load_record(
        &self,
        container: &ContainerName,
        id: &RecordId,
    ) -> Result<Lookup<DeployRecord>, StoreError> {
        let url = self.url(&[container.as_str(), id.as_str()]);
        let response = self.send(self.client.get(url)).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(Lookup::NotFound),
            s if s.is_success() => {
                let value: serde_json::Value = response.json().await.map_err(|e| StoreError::Decode {
                    message: e.to_string(),
                })?;
                DeployRecord::from_json(container.clone(), value).map(Lookup::Found)
            }
            _ => Err(unexpected(response).await),
        }
    }

    async fn save_record(&self, record: &DeployRecord) -> Result<(), StoreError> {
        let body = record.to_json()?;

        let response = self.put_record(record, &body).await?;
        if response.status() != StatusCode::NOT_FOUND {
            return check(response).await;
        }

        debug!(
            container = %record.container(),
            record_id = %record.id(),
            "record not stored yet, creating it"
        );
        let response = self.post_record(record, &body).await?;
        check(response).await
    }
}

fn transport(e: reqwest::Error) -> StoreError {
    StoreError::Transport {
        message: e.to_string(),
    }
}

async fn check(response: Response) -> Result<(), StoreError> {
    if response.status().is_success() {
        Ok(())
    } else {
        Err(unexpected(response).await)
    }
}

async fn unexpected(response: Response) -> StoreError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    StoreError::UnexpectedStatus { status, body }
}
