//! Store configuration.
//!
//! A store is configured once at startup: the base URL every endpoint is
//! resolved against, and the fixed list of collections it owns.
//!
//! ```toml
//! base_url = "http://localhost:8080"
//!
//! [[collections]]
//! name = "containers"
//!
//! [[collections]]
//! name = "deployments"
//! endpoint = "/api/deployments"
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Environment variable overriding [`SyncConfig::base_url`].
pub const BASE_URL_ENV: &str = "TINCAN_SYNC_BASE_URL";

/// Collections a default configuration owns.
pub const DEFAULT_COLLECTIONS: [&str; 2] = ["containers", "deployments"];

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_owned()
}

fn default_collections() -> Vec<CollectionConfig> {
    DEFAULT_COLLECTIONS
        .iter()
        .map(|name| CollectionConfig::new(*name))
        .collect()
}

/// One named collection and the endpoint it is fetched from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CollectionConfig {
    pub name: String,
    /// Path relative to the base URL; `/api/<name>` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl CollectionConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Endpoint path this collection is fetched from.
    pub fn endpoint_path(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.clone(),
            None => format!("/api/{}", self.name),
        }
    }
}

/// Top-level configuration for a [`SyncStore`](crate::SyncStore).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Transport-level bound on a single request. Unbounded when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
    #[serde(default = "default_collections")]
    pub collections: Vec<CollectionConfig>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: None,
            collections: default_collections(),
        }
    }
}

impl SyncConfig {
    /// Default configuration with a custom collection list.
    pub fn with_collections<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            collections: names.into_iter().map(CollectionConfig::new).collect(),
            ..Self::default()
        }
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Apply overrides from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn apply_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup(BASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.base_url = base_url.trim().to_owned();
        }
        self
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Parsed base URL.
    pub fn parsed_base_url(&self) -> Result<Url, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason,
        };
        let url = Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(invalid(format!("unsupported scheme {other:?}"))),
        }
    }

    /// Check the base URL and the collection list.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.parsed_base_url()?;
        validate_collections(&self.collections)
    }
}

/// Collection names must be non-empty and unique, endpoints non-empty.
pub(crate) fn validate_collections(collections: &[CollectionConfig]) -> Result<(), ConfigError> {
    if collections.is_empty() {
        return Err(ConfigError::NoCollections);
    }
    let mut seen = HashSet::new();
    for collection in collections {
        if collection.name.trim().is_empty() {
            return Err(ConfigError::EmptyCollectionName);
        }
        if !seen.insert(collection.name.as_str()) {
            return Err(ConfigError::DuplicateCollection(collection.name.clone()));
        }
        if collection.endpoint_path().trim().is_empty() {
            return Err(ConfigError::EmptyEndpoint(collection.name.clone()));
        }
    }
    Ok(())
}
