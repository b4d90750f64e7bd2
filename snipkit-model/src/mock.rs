//! Deterministic mock backends for tests and demos.

use std::collections::hash_map::DefaultHasher;
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;

use async_trait::async_trait;

use snipkit_core::{
    EmbeddingProvider, GenerationProvider, GenerationRequest, Result, SnipkitError,
};

/// A scripted [`GenerationProvider`].
///
/// Pops one queued response per call and records every request for
/// assertions. An exhausted queue (or a provider constructed with
/// [`failing`](MockGeneration::failing)) produces a provider error, which
/// exercises the engine's fallback paths.
#[derive(Debug, Default)]
pub struct MockGeneration {
    responses: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<GenerationRequest>>,
    fail: bool,
}

impl MockGeneration {
    /// A provider that replies with the given responses in order.
    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            calls: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    /// A provider whose every call fails.
    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    /// All requests received so far.
    pub fn calls(&self) -> Vec<GenerationRequest> {
        self.calls.lock().expect("mock lock").clone()
    }
}

#[async_trait]
impl GenerationProvider for MockGeneration {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: GenerationRequest) -> Result<String> {
        self.calls.lock().expect("mock lock").push(request);
        if self.fail {
            return Err(SnipkitError::Provider {
                provider: "mock".into(),
                message: "scripted failure".into(),
            });
        }
        self.responses.lock().expect("mock lock").pop_front().ok_or_else(|| {
            SnipkitError::Provider { provider: "mock".into(), message: "response queue empty".into() }
        })
    }
}

/// A deterministic [`EmbeddingProvider`] with no model behind it.
///
/// Embeds text as an L2-normalized hashed bag of words, so texts sharing
/// vocabulary land close in cosine space. Good enough for ranking
/// assertions; useless for real retrieval quality.
#[derive(Debug, Clone)]
pub struct MockEmbedding {
    dimensions: usize,
}

impl Default for MockEmbedding {
    fn default() -> Self {
        Self { dimensions: 64 }
    }
}

impl MockEmbedding {
    /// A mock embedder with the default dimensionality.
    pub fn new() -> Self {
        Self::default()
    }

    /// A mock embedder with the given dimensionality.
    pub fn with_dimensions(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        for token in text.to_lowercase().split(|c: char| !c.is_alphanumeric()) {
            if token.is_empty() {
                continue;
            }
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            let slot = (hasher.finish() as usize) % self.dimensions;
            vector[slot] += 1.0;
        }
        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.vector_for(text))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[tokio::test]
    async fn identical_text_embeds_identically() {
        let embedder = MockEmbedding::new();
        let a = embedder.embed("refund window is 30 days").await.unwrap();
        let b = embedder.embed("refund window is 30 days").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn shared_vocabulary_scores_higher() {
        let embedder = MockEmbedding::new();
        let refund = embedder.embed("refund policy for returned items").await.unwrap();
        let similar = embedder.embed("what is the refund policy").await.unwrap();
        let unrelated = embedder.embed("shipping takes three to five days").await.unwrap();
        assert!(cosine(&refund, &similar) > cosine(&refund, &unrelated));
    }

    #[tokio::test]
    async fn scripted_responses_pop_in_order() {
        let generator = MockGeneration::with_responses(["first", "second"]);
        let request = GenerationRequest::new("q", 10);
        assert_eq!(generator.generate(request.clone()).await.unwrap(), "first");
        assert_eq!(generator.generate(request.clone()).await.unwrap(), "second");
        assert!(generator.generate(request).await.is_err());
        assert_eq!(generator.calls().len(), 3);
    }
}
