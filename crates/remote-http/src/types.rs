//! Wire types for the cloud API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One page of a scoped collection listing. The server returns the whole
/// scoped view; `cursor` is reserved for future pagination and currently
/// always absent.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionPage {
    pub documents: Vec<Value>,
    #[serde(default)]
    pub cursor: Option<String>,
}

/// Response to a document create.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResponse {
    pub id: String,
}

/// Generic success acknowledgement.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessResponse {
    pub success: bool,
}

/// Error envelope returned by the API on failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponse {
    pub code: String,
    pub message: String,
}

/// Response to a generation request: the raw generated payload, validated by
/// the core before use.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub payload: Value,
}
