//! Ollama backends through its OpenAI-compatible API.
//!
//! Ollama does not require an API key; a placeholder bearer token is sent
//! for compatibility with OpenAI-style middlewares.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error};

use snipkit_core::{
    EmbeddingProvider, GenerationProvider, GenerationRequest, Result, SnipkitError,
};

use crate::config::OllamaConfig;
use crate::wire::{error_detail, ChatRequest, ChatResponse, EmbeddingRequest, EmbeddingResponse};

fn provider_error(message: impl Into<String>) -> SnipkitError {
    SnipkitError::Provider { provider: "ollama".into(), message: message.into() }
}

fn v1_url(config: &OllamaConfig, operation: &str) -> String {
    format!("{}/v1/{}", config.base_url.trim_end_matches('/'), operation)
}

/// A [`GenerationProvider`] backed by a local Ollama server.
pub struct OllamaChat {
    client: reqwest::Client,
    config: OllamaConfig,
}

impl OllamaChat {
    /// Create a chat client for the configured server and model.
    pub fn new(config: OllamaConfig, timeout: Duration) -> Self {
        let client =
            reqwest::Client::builder().timeout(timeout).build().unwrap_or_else(|_| reqwest::Client::new());
        Self { client, config }
    }
}

#[async_trait]
impl GenerationProvider for OllamaChat {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn generate(&self, request: GenerationRequest) -> Result<String> {
        debug!(provider = "ollama", model = %self.config.chat_model, max_tokens = request.max_tokens, "chat completion");

        let body = ChatRequest::from_generation(&request, Some(&self.config.chat_model));

        let response = self
            .client
            .post(v1_url(&self.config, "chat/completions"))
            .bearer_auth("ollama")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = "ollama", error = %e, "request failed (is Ollama running?)");
                provider_error(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(provider = "ollama", %status, "API error");
            return Err(provider_error(format!("API returned {status}: {}", error_detail(&body))));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| provider_error(format!("failed to parse response: {e}")))?;
        parsed.content().ok_or_else(|| provider_error("API returned no content"))
    }
}

/// An [`EmbeddingProvider`] backed by a local Ollama server.
pub struct OllamaEmbeddings {
    client: reqwest::Client,
    config: OllamaConfig,
    dimensions: usize,
}

/// Default dimensionality of `nomic-embed-text`.
const DEFAULT_DIMENSIONS: usize = 768;

impl OllamaEmbeddings {
    /// Create an embedding client for the configured server and model.
    pub fn new(config: OllamaConfig, timeout: Duration) -> Self {
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
impl EmbeddingProvider for OllamaEmbeddings {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed_batch(&[text]).await?;
        results.into_iter().next().ok_or_else(|| provider_error("API returned empty response"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            provider = "ollama",
            batch_size = texts.len(),
            model = %self.config.embedding_model,
            "embedding batch"
        );

        let body = EmbeddingRequest { model: Some(&self.config.embedding_model), input: texts.to_vec() };

        let response = self
            .client
            .post(v1_url(&self.config, "embeddings"))
            .bearer_auth("ollama")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = "ollama", error = %e, "request failed (is Ollama running?)");
                provider_error(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(provider = "ollama", %status, "API error");
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
