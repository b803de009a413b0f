//! Remote resource clients.
//!
//! A client turns one endpoint path into one request and hands back either
//! the decoded records or a [`FetchError`]. Clients are stateless; the
//! store shares one behind an `Arc` across all of its fetch tasks.

mod http;

use async_trait::async_trait;

use crate::error::FetchError;

pub use http::HttpClient;

/// Fetches a whole collection from a named endpoint.
#[async_trait]
pub trait ResourceClient<R>: Send + Sync {
    /// Fetch the records behind `endpoint_path`.
    async fn fetch_collection(&self, endpoint_path: &str) -> Result<Vec<R>, FetchError>;
}
