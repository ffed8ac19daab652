use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use super::traits::TextGenerator;
use super::types::ProviderError;
use crate::models::{ErrorResponse, GenerateRequest, GenerateResponse};

pub const GENERATE_PATH: &str = "/api/generate";

/// Client for a Nexora server's generate route.
pub struct RemoteGenerator {
    client: Client,
    endpoint: Url,
}

impl RemoteGenerator {
    pub fn new(base_url: &str) -> Result<Self> {
        let base = Url::parse(base_url)
            .with_context(|| format!("Invalid server URL: {}", base_url))?;
        let endpoint = base
            .join(GENERATE_PATH)
            .with_context(|| format!("Invalid server URL: {}", base_url))?;
        Ok(Self {
            client: Client::new(),
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl TextGenerator for RemoteGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let body = GenerateRequest {
            prompt: Some(prompt.to_string()),
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<ErrorResponse>()
                .await
                .map(|e| e.error)
                .unwrap_or_else(|_| "Request failed".to_string());
            return Err(ProviderError::RequestFailed(format!(
                "HTTP {}: {}",
                status.as_u16(),
                detail
            )));
        }

        let reply: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        Ok(reply.response)
    }
}
