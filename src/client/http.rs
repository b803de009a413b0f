use std::error::Error as _;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use serde::de::DeserializeOwned;
use tracing::trace;

use super::ResourceClient;
use crate::config::SyncConfig;
use crate::error::{ConfigError, FetchError};

/// [`ResourceClient`] issuing `GET` requests against a base URL.
#[derive(Debug, Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpClient {
    /// Build a client for the base URL and timeout in `config`.
    pub fn from_config(config: &SyncConfig) -> Result<Self, ConfigError> {
        let base_url = config.parsed_base_url()?;
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| ConfigError::Client(e.to_string()))?;
        Ok(Self { http, base_url })
    }

    /// Build a client from an existing reqwest client.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve an endpoint path below the base URL, keeping any base path prefix.
    pub fn resolve(&self, endpoint_path: &str) -> Result<Url, FetchError> {
        let path = endpoint_path.trim();
        if path.is_empty() {
            return Err(FetchError::InvalidEndpoint(endpoint_path.to_owned()));
        }
        let joined = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&joined).map_err(|_| FetchError::InvalidEndpoint(endpoint_path.to_owned()))
    }
}

/// reqwest only prints the outermost error; walk the chain so messages
/// like "connection refused" reach the slot.
fn describe(err: &reqwest::Error) -> String {
    let mut message = if err.is_timeout() {
        "request timed out".to_owned()
    } else {
        err.to_string()
    };
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !message.contains(&cause_text) {
            message.push_str(": ");
            message.push_str(&cause_text);
        }
        source = cause.source();
    }
    message
}

#[async_trait]
impl<R> ResourceClient<R> for HttpClient
where
    R: DeserializeOwned + Send + 'static,
{
    async fn fetch_collection(&self, endpoint_path: &str) -> Result<Vec<R>, FetchError> {
        let url = self.resolve(endpoint_path)?;
        trace!(%url, "GET");

        let response = self
            .http
            .get(url.clone())
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| FetchError::Transport(describe(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(describe(&e)))?;
        serde_json::from_slice::<Vec<R>>(&body).map_err(|e| FetchError::Decode(e.to_string()))
    }
}
