//! [`GenerationGateway`] over the cloud API's generation endpoint.

use async_trait::async_trait;
use log::debug;
use serde_json::Value;

use mealfolio_core::errors::Result;
use mealfolio_core::generation::{GenerationGateway, GenerationRequest};

use crate::client::MealfolioApiClient;

pub struct HttpGenerationGateway {
    client: MealfolioApiClient,
    token: String,
}

impl HttpGenerationGateway {
    pub fn new(client: MealfolioApiClient, token: impl Into<String>) -> Self {
        Self {
            client,
            token: token.into(),
        }
    }
}

#[async_trait]
impl GenerationGateway for HttpGenerationGateway {
    async fn generate(&self, request: &GenerationRequest) -> Result<Value> {
        debug!("generation request ({:?})", request.kind);
        let response = self.client.generate(&self.token, request).await?;
        Ok(response.payload)
    }
}
