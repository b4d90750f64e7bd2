//! Azure OpenAI chat and embedding backends.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error};

use snipkit_core::{
    EmbeddingProvider, GenerationProvider, GenerationRequest, Result, SnipkitError,
};

use crate::config::AzureConfig;
use crate::wire::{error_detail, ChatRequest, ChatResponse, EmbeddingRequest, EmbeddingResponse};

fn provider_error(message: impl Into<String>) -> SnipkitError {
    SnipkitError::Provider { provider: "azure".into(), message: message.into() }
}

fn deployment_url(config: &AzureConfig, deployment: &str, operation: &str) -> String {
    format!(
        "{}/openai/deployments/{}/{}?api-version={}",
        config.endpoint.trim_end_matches('/'),
        deployment,
        operation,
        config.api_version
    )
}

/// A [`GenerationProvider`] backed by an Azure OpenAI chat deployment.
pub struct AzureChat {
    client: reqwest::Client,
    config: AzureConfig,
}

impl AzureChat {
    /// Create a chat client for the configured deployment.
    pub fn new(config: AzureConfig, timeout: Duration) -> Self {
        let client =
            reqwest::Client::builder().timeout(timeout).build().unwrap_or_else(|_| reqwest::Client::new());
        Self { client, config }
    }
}

#[async_trait]
impl GenerationProvider for AzureChat {
    fn name(&self) -> &str {
        "azure"
    }

    async fn generate(&self, request: GenerationRequest) -> Result<String> {
        debug!(provider = "azure", deployment = %self.config.chat_deployment, max_tokens = request.max_tokens, "chat completion");

        let url = deployment_url(&self.config, &self.config.chat_deployment, "chat/completions");
        let body = ChatRequest::from_generation(&request, None);

        let response = self
            .client
            .post(&url)
            .header("api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = "azure", error = %e, "request failed");
                provider_error(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(provider = "azure", %status, "API error");
            return Err(provider_error(format!("API returned {status}: {}", error_detail(&body))));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| provider_error(format!("failed to parse response: {e}")))?;
        parsed.content().ok_or_else(|| provider_error("API returned no content"))
    }
}

/// An [`EmbeddingProvider`] backed by an Azure OpenAI embedding deployment.
pub struct AzureEmbeddings {
    client: reqwest::Client,
    config: AzureConfig,
    dimensions: usize,
}

/// Default dimensionality of `text-embedding-ada-002`.
const DEFAULT_DIMENSIONS: usize = 1536;

impl AzureEmbeddings {
    /// Create an embedding client for the configured deployment.
    pub fn new(config: AzureConfig, timeout: Duration) -> Self {
        let client =
            reqwest::Client::builder().timeout(timeout).build().unwrap_or_else(|_| reqwest::Client::new());
        Self { client, config, dimensions: DEFAULT_DIMENSIONS }
    }

    /// Override the reported dimensionality for non-default models.
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self
    }
}

#[async_trait]
impl EmbeddingProvider for AzureEmbeddings {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed_batch(&[text]).await?;
        results.into_iter().next().ok_or_else(|| provider_error("API returned empty response"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            provider = "azure",
            batch_size = texts.len(),
            deployment = %self.config.embedding_deployment,
            "embedding batch"
        );

        let url = deployment_url(&self.config, &self.config.embedding_deployment, "embeddings");
        let body = EmbeddingRequest { model: None, input: texts.to_vec() };

        let response = self
            .client
            .post(&url)
            .header("api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = "azure", error = %e, "request failed");
                provider_error(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(provider = "azure", %status, "API error");
            return Err(provider_error(format!("API returned {status}: {}", error_detail(&body))));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| provider_error(format!("failed to parse response: {e}")))?;
        Ok(parsed.into_ordered())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
