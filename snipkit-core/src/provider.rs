//! Capability traits for the embedding and generation backends.
//!
//! The engine depends only on these interfaces; concrete backends (Azure,
//! Ollama, mocks) are selected at configuration time, which keeps the core
//! deterministic under test via stub capabilities.

use async_trait::async_trait;

use crate::error::Result;

/// A provider that converts text into fixed-dimensional vectors.
///
/// The default [`embed_batch`](EmbeddingProvider::embed_batch) calls
/// [`embed`](EmbeddingProvider::embed) sequentially; backends with native
/// batching should override it.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;
}

/// A single bounded text-generation call. No tools, no streaming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    /// Optional system instruction.
    pub system: Option<String>,
    /// The user prompt.
    pub user: String,
    /// Hard output bound for the call.
    pub max_tokens: u32,
}

impl GenerationRequest {
    /// A request with only a user prompt.
    pub fn new(user: impl Into<String>, max_tokens: u32) -> Self {
        Self { system: None, user: user.into(), max_tokens }
    }

    /// Attach a system instruction.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// A provider that produces text from a prompt.
///
/// Failures map to [`SnipkitError::Provider`](crate::SnipkitError::Provider)
/// and are recovered locally by the engine; a generation failure must never
/// abort an ask.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// A short name for logs ("azure", "ollama", ...).
    fn name(&self) -> &str;

    /// Run a single generation call and return the produced text.
    async fn generate(&self, request: GenerationRequest) -> Result<String>;
}
