//! Error types.

use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single collection request.
///
/// The `Display` output is what ends up in a slot's error message, after the
/// `"Error loading <collection>: "` prefix.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// Endpoint path was empty or did not form a valid URL.
    #[error("invalid endpoint {0:?}")]
    InvalidEndpoint(String),

    /// Connection refused, DNS failure, timeout, broken body stream.
    #[error("{0}")]
    Transport(String),

    /// Server answered with a non-2xx status.
    #[error("request to {url} failed with status {status}")]
    Status { status: u16, url: String },

    /// Body was not a JSON array of the expected records.
    #[error("invalid response body: {0}")]
    Decode(String),
}

/// Errors raised by [`SyncStore`](crate::SyncStore) operations.
///
/// These indicate a defect in the calling code or setup, never a data
/// condition; fetch failures are recorded in the slot instead.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The collection name is not one of the store's fixed slots.
    #[error("unknown collection: {0}")]
    UnknownCollection(String),

    /// The store could not be built from its configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// `fetch` was called outside of a tokio runtime.
    #[error("fetch for {0} requires a running tokio runtime")]
    NoRuntime(String),

    /// The fetch task did not run to completion.
    #[error("fetch for {collection} aborted: {reason}")]
    TaskAborted { collection: String, reason: String },
}

/// Invalid or unreadable configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid base url {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("collection name cannot be empty")]
    EmptyCollectionName,

    #[error("collection {0:?} is configured more than once")]
    DuplicateCollection(String),

    #[error("collection {0:?} has an empty endpoint")]
    EmptyEndpoint(String),

    #[error("at least one collection must be configured")]
    NoCollections,

    #[error("failed to build http client: {0}")]
    Client(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
