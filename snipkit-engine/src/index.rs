//! Snippet index trait: a metadata-filterable vector store.
//!
//! The index owns storage and candidate filtering but no ranking policy
//! beyond raw similarity: score calibration, reranking, and confidence live
//! in the engine.

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use snipkit_core::{Result, Snippet};

/// A snippet with the embeddings the index stores for it: one vector for the
/// text and one per example question. Example-question vectors are retrieval
/// keys only; a match through one always resolves to the owning snippet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedSnippet {
    /// The snippet record.
    pub snippet: Snippet,
    /// Embedding of `snippet.text`.
    pub text_embedding: Vec<f32>,
    /// One embedding per entry of `snippet.example_questions`, same order.
    pub example_question_embeddings: Vec<Vec<f32>>,
}

/// Metadata restrictions applied before similarity search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateFilter {
    /// Restrict to snippets whose `group` is in this set.
    pub groups: Option<BTreeSet<String>>,
    /// Restrict to exactly these snippet ids.
    pub ids: Option<BTreeSet<String>>,
    /// Restrict to these language codes; snippets with an empty language
    /// pass any language filter.
    pub languages: Option<BTreeSet<String>>,
    /// Whether generated translations are eligible.
    pub include_generated_translations: bool,
}

impl CandidateFilter {
    /// Whether a snippet passes this filter.
    pub fn matches(&self, snippet: &Snippet) -> bool {
        if snippet.is_generated_translation && !self.include_generated_translations {
            return false;
        }
        if let Some(ids) = &self.ids {
            if !ids.contains(&snippet.id) {
                return false;
            }
        }
        if let Some(groups) = &self.groups {
            match &snippet.group {
                Some(group) if groups.contains(group) => {}
                _ => return false,
            }
        }
        if let Some(languages) = &self.languages {
            if !snippet.language.is_empty() && !languages.contains(&snippet.language) {
                return false;
            }
        }
        true
    }
}

/// One similarity hit, already attributed to its owning snippet.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    /// The owning snippet id.
    pub snippet_id: String,
    /// Raw similarity in the provider's native metric (cosine).
    pub similarity: f32,
}

/// A vector-searchable store of snippet records with metadata filtering.
///
/// Implementations must keep translation links undirected: back-references
/// are materialized at write time and surfaced through
/// [`linked`](SnippetIndex::linked), and removing a snippet removes it from
/// every other snippet's link set in the same operation.
#[async_trait]
pub trait SnippetIndex: Send + Sync {
    /// Insert or replace a snippet and its embeddings.
    async fn upsert(&self, entry: IndexedSnippet) -> Result<()>;

    /// Remove a snippet. Returns `false` if the id was unknown.
    ///
    /// Cascades over the link graph: no other snippet retains a link to the
    /// removed id afterwards.
    async fn remove(&self, id: &str) -> Result<bool>;

    /// Fetch one snippet by id.
    ///
    /// The record's `linked_snippets` holds the links the snippet declared
    /// itself; [`linked`](SnippetIndex::linked) serves the undirected view.
    async fn get(&self, id: &str) -> Result<Option<Snippet>>;

    /// Fetch several snippets by id, skipping unknown ids.
    async fn get_many(&self, ids: &BTreeSet<String>) -> Result<Vec<Snippet>>;

    /// Ids of all snippets passing the filter.
    async fn candidates(&self, filter: &CandidateFilter) -> Result<BTreeSet<String>>;

    /// Similarity search restricted to the candidate set.
    ///
    /// Searches snippet-text and example-question vectors; hits are merged
    /// per owning snippet keeping the higher similarity, ordered by
    /// descending similarity with ties broken by ascending id, and capped at
    /// `limit`. No snippet id appears twice.
    async fn search(
        &self,
        query: &[f32],
        candidates: &BTreeSet<String>,
        limit: usize,
    ) -> Result<Vec<Hit>>;

    /// Page through snippets passing the filter. Returns the page and the
    /// total match count, ordered by creation time then id.
    async fn page(
        &self,
        limit: usize,
        offset: usize,
        filter: &CandidateFilter,
    ) -> Result<(Vec<Snippet>, usize)>;

    /// Distinct group names in the store, sorted.
    async fn groups(&self) -> Result<Vec<String>>;

    /// Ids linked to the given snippet, in either direction.
    async fn linked(&self, id: &str) -> Result<BTreeSet<String>>;
}
