//! REST client for the Mealfolio cloud API.

use std::time::Duration;

use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;

use mealfolio_core::generation::GenerationRequest;
use mealfolio_core::store::{EntityKind, Scope, ScopeFilter};

use crate::error::{RemoteApiError, Result};
use crate::types::*;

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_LOG_BODY_CHARS: usize = 512;

/// Client for the Mealfolio cloud API.
///
/// Collections live under `/api/v1/collections/{kind}` and are always scoped
/// by owner; the generation endpoint is a single request/response call.
#[derive(Debug, Clone)]
pub struct MealfolioApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl MealfolioApiClient {
    /// Create a new API client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The base URL of the cloud API (e.g., "https://api.mealfolio.app")
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create headers for an API request.
    fn headers(&self, token: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let auth_value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| RemoteApiError::auth("Invalid access token format"))?;
        headers.insert(AUTHORIZATION, auth_value);

        Ok(headers)
    }

    fn log_response(status: reqwest::StatusCode, body: &str) {
        if status.is_success() {
            debug!("API response status: {}", status);
            return;
        }

        let mut preview = body.chars().take(MAX_LOG_BODY_CHARS).collect::<String>();
        if body.chars().count() > MAX_LOG_BODY_CHARS {
            preview.push_str("...");
        }
        debug!("API response error ({}): {}", status, preview);
    }

    /// Parse a JSON response body.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;
        Self::log_response(status, &body);

        if !status.is_success() {
            // Try to parse error response
            if let Ok(error) = serde_json::from_str::<ApiErrorResponse>(&body) {
                return Err(RemoteApiError::api(
                    status.as_u16(),
                    format!("{}: {}", error.code, error.message),
                ));
            }
            return Err(RemoteApiError::api(
                status.as_u16(),
                format!("Request failed: {}", body),
            ));
        }

        serde_json::from_str(&body).map_err(|e| {
            log::error!(
                "Failed to deserialize response. Body: {}, Error: {}",
                body,
                e
            );
            RemoteApiError::api(status.as_u16(), format!("Failed to parse response: {}", e))
        })
    }

    fn collection_url(&self, kind: EntityKind, scope: &Scope) -> String {
        let mut url = format!(
            "{}/api/v1/collections/{}?ownerId={}",
            self.base_url,
            kind.as_str(),
            scope.owner_id
        );
        if scope.filter != ScopeFilter::All {
            url = format!("{}&filter={}", url, scope.filter.as_str());
        }
        url
    }

    fn document_url(&self, kind: EntityKind, owner_id: &str, id: &str) -> String {
        format!(
            "{}/api/v1/collections/{}/{}?ownerId={}",
            self.base_url,
            kind.as_str(),
            id,
            owner_id
        )
    }

    /// List the scoped view of a collection.
    ///
    /// GET /api/v1/collections/{kind}
    pub async fn list_documents(
        &self,
        token: &str,
        kind: EntityKind,
        scope: &Scope,
    ) -> Result<CollectionPage> {
        let response = self
            .client
            .get(self.collection_url(kind, scope))
            .headers(self.headers(token)?)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Get one document.
    ///
    /// GET /api/v1/collections/{kind}/{id}
    pub async fn get_document(
        &self,
        token: &str,
        kind: EntityKind,
        owner_id: &str,
        id: &str,
    ) -> Result<Value> {
        let response = self
            .client
            .get(self.document_url(kind, owner_id, id))
            .headers(self.headers(token)?)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Create a document; the server assigns the id.
    ///
    /// POST /api/v1/collections/{kind}
    pub async fn create_document(
        &self,
        token: &str,
        kind: EntityKind,
        owner_id: &str,
        doc: &Value,
    ) -> Result<CreateResponse> {
        let response = self
            .client
            .post(self.collection_url(kind, &Scope::owned(owner_id)))
            .headers(self.headers(token)?)
            .json(doc)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Apply a partial update to a document.
    ///
    /// PATCH /api/v1/collections/{kind}/{id}
    pub async fn update_document(
        &self,
        token: &str,
        kind: EntityKind,
        owner_id: &str,
        id: &str,
        patch: &Value,
    ) -> Result<SuccessResponse> {
        let response = self
            .client
            .patch(self.document_url(kind, owner_id, id))
            .headers(self.headers(token)?)
            .json(patch)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Delete a document.
    ///
    /// DELETE /api/v1/collections/{kind}/{id}
    pub async fn delete_document(
        &self,
        token: &str,
        kind: EntityKind,
        owner_id: &str,
        id: &str,
    ) -> Result<SuccessResponse> {
        let response = self
            .client
            .delete(self.document_url(kind, owner_id, id))
            .headers(self.headers(token)?)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Replace a per-owner singleton document.
    ///
    /// PUT /api/v1/collections/{kind}/singleton
    pub async fn upsert_singleton(
        &self,
        token: &str,
        kind: EntityKind,
        owner_id: &str,
        doc: &Value,
    ) -> Result<SuccessResponse> {
        let url = format!(
            "{}/api/v1/collections/{}/singleton?ownerId={}",
            self.base_url,
            kind.as_str(),
            owner_id
        );
        let response = self
            .client
            .put(url)
            .headers(self.headers(token)?)
            .json(doc)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Activate one meal plan; the server deactivates the rest atomically.
    ///
    /// POST /api/v1/collections/meal_plan/{id}/activate
    pub async fn activate_plan(
        &self,
        token: &str,
        owner_id: &str,
        plan_id: &str,
    ) -> Result<SuccessResponse> {
        let url = format!(
            "{}/api/v1/collections/meal_plan/{}/activate?ownerId={}",
            self.base_url, plan_id, owner_id
        );
        let response = self
            .client
            .post(url)
            .headers(self.headers(token)?)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Run one generation request and return the raw payload.
    ///
    /// POST /api/v1/generate
    pub async fn generate(
        &self,
        token: &str,
        request: &GenerationRequest,
    ) -> Result<GenerateResponse> {
        let url = format!("{}/api/v1/generate", self.base_url);
        let response = self
            .client
            .post(url)
            .headers(self.headers(token)?)
            .json(request)
            .send()
            .await?;

        Self::parse_response(response).await
    }
}
