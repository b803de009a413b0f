//! Record types for synchronized collections.
//!
//! The store never inspects records. [`Record`] accepts any JSON object;
//! the typed records below describe the resources served by the admin
//! backend and tolerate missing optional fields.

use serde::{Deserialize, Serialize};

/// Schema-less record: a JSON object.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// A container as listed by `/api/containers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
}

/// A deployment of one or more containers, as listed by `/api/deployments`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub status: String,
    #[serde(default)]
    pub replicas: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}
