//! In-memory snippet index using cosine similarity.
//!
//! This module provides [`InMemoryIndex`], a zero-dependency index backed by
//! `HashMap`s protected by a `tokio::sync::RwLock`. It is suitable for
//! development, testing, and small curated collections; larger deployments
//! plug a real vector store behind the same [`SnippetIndex`] trait.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use snipkit_core::{Result, Snippet};

use crate::index::{CandidateFilter, Hit, IndexedSnippet, SnippetIndex};

#[derive(Debug, Clone)]
struct StoredSnippet {
    /// `snippet.linked_snippets` holds the links this snippet declared
    /// itself; the undirected view lives in `Store::links`.
    snippet: Snippet,
    text_embedding: Vec<f32>,
    example_question_embeddings: Vec<Vec<f32>>,
}

#[derive(Debug, Default)]
struct Store {
    snippets: HashMap<String, StoredSnippet>,
    /// Materialized undirected link adjacency. An edge exists when either
    /// endpoint declared it; edges may reference ids not yet inserted.
    links: HashMap<String, BTreeSet<String>>,
}

/// An in-memory [`SnippetIndex`] using cosine similarity for search.
///
/// All operations are async-safe via `tokio::sync::RwLock`; mutations take
/// the write lock for their full duration, so link materialization and the
/// deletion cascade are atomic with the record change.
#[derive(Debug, Default)]
pub struct InMemoryIndex {
    store: RwLock<Store>,
}

impl InMemoryIndex {
    /// Create a new empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored snippets.
    pub async fn len(&self) -> usize {
        self.store.read().await.snippets.len()
    }

    /// Whether the index holds no snippets.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl SnippetIndex for InMemoryIndex {
    async fn upsert(&self, entry: IndexedSnippet) -> Result<()> {
        let mut store = self.store.write().await;
        let id = entry.snippet.id.clone();

        let declared_old: BTreeSet<String> = store
            .snippets
            .get(&id)
            .map(|s| s.snippet.linked_snippets.clone())
            .unwrap_or_default();
        let declared_new: BTreeSet<String> =
            entry.snippet.linked_snippets.iter().filter(|p| **p != id).cloned().collect();

        for peer in declared_new.difference(&declared_old) {
            store.links.entry(id.clone()).or_default().insert(peer.clone());
            store.links.entry(peer.clone()).or_default().insert(id.clone());
        }
        for peer in declared_old.difference(&declared_new) {
            // The edge survives while the peer still declares it.
            let peer_declares = store
                .snippets
                .get(peer)
                .is_some_and(|s| s.snippet.linked_snippets.contains(&id));
            if !peer_declares {
                if let Some(set) = store.links.get_mut(&id) {
                    set.remove(peer);
                }
                if let Some(set) = store.links.get_mut(peer) {
                    set.remove(&id);
                }
            }
        }

        let mut snippet = entry.snippet;
        snippet.linked_snippets = declared_new;
        store.snippets.insert(
            id,
            StoredSnippet {
                snippet,
                text_embedding: entry.text_embedding,
                example_question_embeddings: entry.example_question_embeddings,
            },
        );
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<bool> {
        let mut store = self.store.write().await;
        if store.snippets.remove(id).is_none() {
            return Ok(false);
        }
        if let Some(peers) = store.links.remove(id) {
            for peer in peers {
                if let Some(set) = store.links.get_mut(&peer) {
                    set.remove(id);
                }
            }
        }
        // Also drop the id from declared sets recorded in one direction only.
        for stored in store.snippets.values_mut() {
            stored.snippet.linked_snippets.remove(id);
        }
        Ok(true)
    }

    async fn get(&self, id: &str) -> Result<Option<Snippet>> {
        let store = self.store.read().await;
        Ok(store.snippets.get(id).map(|s| s.snippet.clone()))
    }

    async fn get_many(&self, ids: &BTreeSet<String>) -> Result<Vec<Snippet>> {
        let store = self.store.read().await;
        Ok(ids.iter().filter_map(|id| store.snippets.get(id).map(|s| s.snippet.clone())).collect())
    }

    async fn candidates(&self, filter: &CandidateFilter) -> Result<BTreeSet<String>> {
        let store = self.store.read().await;
        Ok(store
            .snippets
            .values()
            .filter(|s| filter.matches(&s.snippet))
            .map(|s| s.snippet.id.clone())
            .collect())
    }

    async fn search(
        &self,
        query: &[f32],
        candidates: &BTreeSet<String>,
        limit: usize,
    ) -> Result<Vec<Hit>> {
        let store = self.store.read().await;
        let mut hits: Vec<Hit> = candidates
            .iter()
            .filter_map(|id| store.snippets.get(id))
            .map(|stored| {
                let mut best = cosine_similarity(&stored.text_embedding, query);
                for example in &stored.example_question_embeddings {
                    let score = cosine_similarity(example, query);
                    if score > best {
                        best = score;
                    }
                }
                Hit { snippet_id: stored.snippet.id.clone(), similarity: best }
            })
            .collect();

        hits.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.snippet_id.cmp(&b.snippet_id))
        });
        hits.truncate(limit);
        Ok(hits)
    }

    async fn page(
        &self,
        limit: usize,
        offset: usize,
        filter: &CandidateFilter,
    ) -> Result<(Vec<Snippet>, usize)> {
        let store = self.store.read().await;
        let mut matching: Vec<&StoredSnippet> =
            store.snippets.values().filter(|s| filter.matches(&s.snippet)).collect();
        matching.sort_by(|a, b| {
            a.snippet
                .created_at
                .cmp(&b.snippet.created_at)
                .then_with(|| a.snippet.id.cmp(&b.snippet.id))
        });
        let total = matching.len();
        let snippets =
            matching.into_iter().skip(offset).take(limit).map(|s| s.snippet.clone()).collect();
        Ok((snippets, total))
    }

    async fn groups(&self) -> Result<Vec<String>> {
        let store = self.store.read().await;
        let groups: BTreeSet<String> =
            store.snippets.values().filter_map(|s| s.snippet.group.clone()).collect();
        Ok(groups.into_iter().collect())
    }

    async fn linked(&self, id: &str) -> Result<BTreeSet<String>> {
        let store = self.store.read().await;
        Ok(store
            .links
            .get(id)
            .map(|peers| {
                peers.iter().filter(|p| store.snippets.contains_key(*p)).cloned().collect()
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn snippet(id: &str) -> Snippet {
        let now = Utc::now();
        Snippet {
            id: id.to_string(),
            text: format!("text {id}"),
            title: None,
            section_label: None,
            group: None,
            language: String::new(),
            heading: None,
            category: None,
            example_questions: Vec::new(),
            linked_snippets: BTreeSet::new(),
            is_generated_translation: false,
            translation_source: None,
            source_document_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn entry(id: &str, embedding: Vec<f32>) -> IndexedSnippet {
        IndexedSnippet {
            snippet: snippet(id),
            text_embedding: embedding,
            example_question_embeddings: Vec::new(),
        }
    }

    #[tokio::test]
    async fn one_directional_link_is_visible_from_both_sides() {
        let index = InMemoryIndex::new();
        index.upsert(entry("a", vec![1.0, 0.0])).await.unwrap();
        let mut b = entry("b", vec![0.0, 1.0]);
        b.snippet.linked_snippets.insert("a".into());
        index.upsert(b).await.unwrap();

        assert!(index.linked("a").await.unwrap().contains("b"));
        assert!(index.linked("b").await.unwrap().contains("a"));
    }

    #[tokio::test]
    async fn remove_cascades_over_links() {
        let index = InMemoryIndex::new();
        index.upsert(entry("a", vec![1.0, 0.0])).await.unwrap();
        let mut b = entry("b", vec![0.0, 1.0]);
        b.snippet.linked_snippets.insert("a".into());
        index.upsert(b).await.unwrap();

        assert!(index.remove("b").await.unwrap());
        assert!(index.linked("a").await.unwrap().is_empty());
        let a = index.get("a").await.unwrap().unwrap();
        assert!(a.linked_snippets.is_empty());
    }

    #[tokio::test]
    async fn unlinking_removes_the_back_reference() {
        let index = InMemoryIndex::new();
        index.upsert(entry("a", vec![1.0, 0.0])).await.unwrap();
        let mut b = entry("b", vec![0.0, 1.0]);
        b.snippet.linked_snippets.insert("a".into());
        index.upsert(b.clone()).await.unwrap();

        b.snippet.linked_snippets.clear();
        index.upsert(b).await.unwrap();
        assert!(index.linked("a").await.unwrap().is_empty());
        assert!(index.linked("b").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn search_orders_by_similarity_then_id() {
        let index = InMemoryIndex::new();
        index.upsert(entry("b", vec![1.0, 0.0])).await.unwrap();
        index.upsert(entry("a", vec![1.0, 0.0])).await.unwrap();
        index.upsert(entry("c", vec![0.0, 1.0])).await.unwrap();

        let candidates: BTreeSet<String> =
            ["a", "b", "c"].into_iter().map(String::from).collect();
        let hits = index.search(&[1.0, 0.0], &candidates, 10).await.unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.snippet_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn example_question_match_resolves_to_owner_with_max_score() {
        let index = InMemoryIndex::new();
        let mut owner = entry("a", vec![0.0, 1.0]);
        owner.example_question_embeddings = vec![vec![1.0, 0.0]];
        index.upsert(owner).await.unwrap();

        let candidates: BTreeSet<String> = [String::from("a")].into_iter().collect();
        let hits = index.search(&[1.0, 0.0], &candidates, 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].snippet_id, "a");
        assert!((hits[0].similarity - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn zero_vector_scores_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
