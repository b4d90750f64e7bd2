//! Content-hash keyed embedding cache.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use snipkit_core::{EmbeddingProvider, Result};

/// An [`EmbeddingProvider`] wrapper that caches vectors by the blake3 hash
/// of the exact input text.
///
/// Keying on content rather than snippet id means an edited text can never
/// be served a stale vector: the new text is a new key. No invalidation
/// plumbing is needed on any mutation path.
pub struct CachedEmbedder {
    inner: Arc<dyn EmbeddingProvider>,
    cache: RwLock<HashMap<blake3::Hash, Vec<f32>>>,
}

impl CachedEmbedder {
    /// Wrap an embedding provider with a content-hash cache.
    pub fn new(inner: Arc<dyn EmbeddingProvider>) -> Self {
        Self { inner, cache: RwLock::new(HashMap::new()) }
    }

    /// Number of cached vectors.
    pub async fn len(&self) -> usize {
        self.cache.read().await.len()
    }

    /// Whether the cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl EmbeddingProvider for CachedEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let key = blake3::hash(text.as_bytes());
        if let Some(vector) = self.cache.read().await.get(&key) {
            return Ok(vector.clone());
        }
        let vector = self.inner.embed(text).await?;
        self.cache.write().await.insert(key, vector.clone());
        Ok(vector)
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let keys: Vec<blake3::Hash> = texts.iter().map(|t| blake3::hash(t.as_bytes())).collect();

        let mut results: Vec<Option<Vec<f32>>> = vec![None; texts.len()];
        let mut missing: Vec<usize> = Vec::new();
        {
            let cache = self.cache.read().await;
            for (i, key) in keys.iter().enumerate() {
                match cache.get(key) {
                    Some(vector) => results[i] = Some(vector.clone()),
                    None => missing.push(i),
                }
            }
        }

        if !missing.is_empty() {
            debug!(total = texts.len(), misses = missing.len(), "embedding cache misses");
            let miss_texts: Vec<&str> = missing.iter().map(|&i| texts[i]).collect();
            let vectors = self.inner.embed_batch(&miss_texts).await?;
            let mut cache = self.cache.write().await;
            for (&i, vector) in missing.iter().zip(vectors) {
                cache.insert(keys[i], vector.clone());
                results[i] = Some(vector);
            }
        }

        Ok(results.into_iter().map(|v| v.unwrap_or_default()).collect())
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingEmbedder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EmbeddingProvider for CountingEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![text.len() as f32])
        }

        fn dimensions(&self) -> usize {
            1
        }
    }

    #[tokio::test]
    async fn repeated_text_hits_the_cache() {
        let inner = Arc::new(CountingEmbedder { calls: AtomicUsize::new(0) });
        let cached = CachedEmbedder::new(inner.clone());

        cached.embed("hello").await.unwrap();
        cached.embed("hello").await.unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cached.len().await, 1);
    }

    #[tokio::test]
    async fn changed_text_is_a_new_key() {
        let inner = Arc::new(CountingEmbedder { calls: AtomicUsize::new(0) });
        let cached = CachedEmbedder::new(inner.clone());

        cached.embed("old text").await.unwrap();
        cached.embed("new text").await.unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn batch_fetches_only_misses() {
        let inner = Arc::new(CountingEmbedder { calls: AtomicUsize::new(0) });
        let cached = CachedEmbedder::new(inner.clone());

        cached.embed("a").await.unwrap();
        let vectors = cached.embed_batch(&["a", "bb", "ccc"]).await.unwrap();
        assert_eq!(vectors, vec![vec![1.0], vec![2.0], vec![3.0]]);
        // "a" came from the cache; only "bb" and "ccc" reached the provider.
        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
    }
}
