//! Answer engine orchestrator.
//!
//! The [`AnswerEngine`] coordinates the full ask workflow by composing a
//! [`SnippetIndex`], an [`EmbeddingProvider`] (wrapped in a content-hash
//! cache), and an optional [`GenerationProvider`].
//!
//! # Example
//!
//! ```rust,ignore
//! use snipkit_engine::{AnswerEngine, EngineConfig, InMemoryIndex};
//!
//! let engine = AnswerEngine::builder()
//!     .config(EngineConfig::default())
//!     .index(Arc::new(InMemoryIndex::new()))
//!     .embedding_provider(Arc::new(my_embedder))
//!     .generation_provider(generation)   // optional
//!     .build()?;
//!
//! engine.add_snippet(SnippetDraft::new("Refund window is 30 days.")).await?;
//! let result = engine.ask(AskRequest::new("What is the refund policy?")).await?;
//! ```

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use snipkit_core::{
    AskRequest, AskResult, EmbeddingProvider, GenerationProvider, RefineRequest, RefineResult,
    Result, Snippet, SnippetDraft, SnippetPatch, SnipkitError, SourceItem,
};

use crate::cache::CachedEmbedder;
use crate::config::EngineConfig;
use crate::confidence::{blend, similarity_to_confidence};
use crate::hyde::expand_query;
use crate::index::{CandidateFilter, IndexedSnippet, SnippetIndex};
use crate::refine;
use crate::rerank::{lexical_score, significant_tokens};
use crate::scope::candidate_filter;
use crate::synthesize::{synthesize, NO_MATCH_ANSWER};

/// The answer engine: retrieval, ranking, confidence, synthesis, refinement,
/// and the snippet mutation path.
///
/// Ask and refine are read-only on the index and safe to run concurrently;
/// mutations are exclusive per snippet through the index's own write
/// locking. No lock is held across an external provider call: embeddings
/// are computed before the index write begins.
pub struct AnswerEngine {
    config: EngineConfig,
    index: Arc<dyn SnippetIndex>,
    embedder: CachedEmbedder,
    generation: Option<Arc<dyn GenerationProvider>>,
}

impl AnswerEngine {
    /// Create a new [`AnswerEngineBuilder`].
    pub fn builder() -> AnswerEngineBuilder {
        AnswerEngineBuilder::default()
    }

    /// Return a reference to the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Ask with the engine's configured defaults for closeness, HyDE, and
    /// keyword reranking.
    pub async fn ask_question(&self, question: impl Into<String>) -> Result<AskResult> {
        let request = AskRequest::new(question)
            .with_closeness(self.config.closeness)
            .with_hyde(self.config.hyde)
            .with_keyword_rerank(self.config.keyword_rerank);
        self.ask(request).await
    }

    /// Answer a question from the scoped snippet collection.
    ///
    /// Provider failures are recovered locally: a HyDE or generation failure
    /// degrades per the component contracts, and an embedding outage yields
    /// the deterministic empty result. Only index failures propagate.
    pub async fn ask(&self, request: AskRequest) -> Result<AskResult> {
        let filter = candidate_filter(
            &request.scope,
            &request.languages,
            request.include_generated_translations,
        );
        let candidates = self.index.candidates(&filter).await?;
        if candidates.is_empty() {
            info!(question_len = request.question.len(), "no candidates in scope");
            return Ok(empty_result());
        }

        let query_text = if request.use_hyde {
            expand_query(self.generation.as_ref(), &request.question, self.config.hyde_timeout())
                .await
        } else {
            request.question.clone()
        };

        let query_embedding = match self.embedder.embed(&query_text).await {
            Ok(embedding) => embedding,
            Err(e) => {
                warn!(error = %e, "query embedding unavailable; returning empty result");
                return Ok(empty_result());
            }
        };

        let hits = self.index.search(&query_embedding, &candidates, self.config.top_k).await?;
        let ids: BTreeSet<String> = hits.iter().map(|h| h.snippet_id.clone()).collect();
        let snippets = self.index.get_many(&ids).await?;

        let question_tokens = significant_tokens(&request.question);
        let mut ranked: Vec<(Snippet, f32)> = Vec::with_capacity(hits.len());
        for hit in &hits {
            // Ids can go stale between search and fetch; skip them silently.
            let Some(snippet) = snippets.iter().find(|s| s.id == hit.snippet_id) else {
                continue;
            };
            let semantic = similarity_to_confidence(hit.similarity);
            let confidence = if request.use_keyword_rerank {
                let lexical = lexical_score(&question_tokens, &snippet.text);
                blend(
                    semantic,
                    lexical,
                    self.config.semantic_weight,
                    self.config.lexical_weight,
                )
            } else {
                semantic
            };
            ranked.push((snippet.clone(), confidence));
        }

        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.id.cmp(&b.0.id))
        });

        let sources: Vec<SourceItem> = ranked
            .iter()
            .map(|(snippet, confidence)| SourceItem::from_snippet(snippet, *confidence))
            .collect();

        let outcome = synthesize(
            self.generation.as_ref(),
            &request.question,
            &sources,
            request.answer_closeness,
            self.config.generation_timeout(),
        )
        .await;

        info!(
            source_count = sources.len(),
            answer_confidence = outcome.answer_confidence,
            "ask completed"
        );

        Ok(AskResult {
            answer: outcome.answer,
            sources,
            answer_confidence: outcome.answer_confidence,
        })
    }

    /// Re-synthesize an existing answer; never re-ranks or re-retrieves.
    pub async fn refine(&self, request: RefineRequest) -> Result<RefineResult> {
        let result =
            refine::refine(self.generation.as_ref(), &request, self.config.generation_timeout())
                .await;
        info!(answer_confidence = result.answer_confidence, "refine completed");
        Ok(result)
    }

    /// Add a snippet: embed its text and example questions, then index it.
    ///
    /// Declared `linked_snippets` are materialized as undirected edges by
    /// the index, so the peers' link lookups see this snippet immediately.
    pub async fn add_snippet(&self, draft: SnippetDraft) -> Result<Snippet> {
        if draft.text.trim().is_empty() {
            return Err(SnipkitError::Config("snippet text must not be empty".to_string()));
        }
        let now = Utc::now();
        let snippet = Snippet {
            id: Uuid::new_v4().to_string(),
            text: draft.text,
            title: draft.title,
            section_label: draft.section_label,
            group: draft.group,
            language: draft.language,
            heading: draft.heading,
            category: draft.category,
            example_questions: draft.example_questions,
            linked_snippets: draft.linked_snippets,
            is_generated_translation: draft.is_generated_translation,
            translation_source: draft.translation_source,
            source_document_url: draft.source_document_url,
            created_at: now,
            updated_at: now,
        };
        self.index_snippet(snippet.clone()).await?;
        info!(snippet.id = %snippet.id, "snippet added");
        Ok(snippet)
    }

    /// Update a snippet in place.
    ///
    /// A text or example-question change re-embeds through the content-hash
    /// cache, so the index never serves a stale vector for the new content.
    pub async fn update_snippet(&self, id: &str, patch: SnippetPatch) -> Result<Snippet> {
        let mut snippet = self
            .index
            .get(id)
            .await?
            .ok_or_else(|| SnipkitError::SnippetNotFound(id.to_string()))?;

        if let Some(text) = patch.text {
            if text.trim().is_empty() {
                return Err(SnipkitError::Config("snippet text must not be empty".to_string()));
            }
            snippet.text = text;
        }
        if let Some(title) = patch.title {
            snippet.title = title;
        }
        if let Some(section_label) = patch.section_label {
            snippet.section_label = section_label;
        }
        if let Some(group) = patch.group {
            snippet.group = group;
        }
        if let Some(language) = patch.language {
            snippet.language = language;
        }
        if let Some(heading) = patch.heading {
            snippet.heading = heading;
        }
        if let Some(category) = patch.category {
            snippet.category = category;
        }
        if let Some(example_questions) = patch.example_questions {
            snippet.example_questions = example_questions;
        }
        if let Some(linked_snippets) = patch.linked_snippets {
            snippet.linked_snippets = linked_snippets;
        }
        if let Some(source_document_url) = patch.source_document_url {
            snippet.source_document_url = source_document_url;
        }
        snippet.updated_at = Utc::now();

        self.index_snippet(snippet.clone()).await?;
        info!(snippet.id = %id, "snippet updated");
        Ok(snippet)
    }

    /// Delete a snippet and cascade over the link graph.
    pub async fn delete_snippet(&self, id: &str) -> Result<()> {
        if !self.index.remove(id).await? {
            return Err(SnipkitError::SnippetNotFound(id.to_string()));
        }
        info!(snippet.id = %id, "snippet deleted");
        Ok(())
    }

    /// Fetch one snippet by id.
    pub async fn get_snippet(&self, id: &str) -> Result<Snippet> {
        self.index
            .get(id)
            .await?
            .ok_or_else(|| SnipkitError::SnippetNotFound(id.to_string()))
    }

    /// Page through snippets passing the filter. Returns the page and the
    /// total match count.
    pub async fn list_snippets(
        &self,
        limit: usize,
        offset: usize,
        filter: &CandidateFilter,
    ) -> Result<(Vec<Snippet>, usize)> {
        self.index.page(limit, offset, filter).await
    }

    /// Distinct group names in the collection.
    pub async fn list_groups(&self) -> Result<Vec<String>> {
        self.index.groups().await
    }

    /// Translation counterparts of a snippet, in either link direction.
    pub async fn linked_snippets(&self, id: &str) -> Result<Vec<Snippet>> {
        if self.index.get(id).await?.is_none() {
            return Err(SnipkitError::SnippetNotFound(id.to_string()));
        }
        let ids = self.index.linked(id).await?;
        self.index.get_many(&ids).await
    }

    /// Embed and upsert a snippet. Embeddings are computed before the index
    /// write lock is taken.
    async fn index_snippet(&self, snippet: Snippet) -> Result<()> {
        let text_embedding = self.embedder.embed(&snippet.text).await?;
        let questions: Vec<&str> = snippet
            .example_questions
            .iter()
            .map(String::as_str)
            .filter(|q| !q.trim().is_empty())
            .collect();
        let example_question_embeddings = self.embedder.embed_batch(&questions).await?;
        self.index
            .upsert(IndexedSnippet { snippet, text_embedding, example_question_embeddings })
            .await
    }
}

fn empty_result() -> AskResult {
    AskResult { answer: NO_MATCH_ANSWER.to_string(), sources: Vec::new(), answer_confidence: 0.0 }
}

/// Builder for constructing an [`AnswerEngine`].
///
/// The index and embedding provider are required; the generation provider is
/// optional (without one, answers fall back to the top snippet verbatim).
#[derive(Default)]
pub struct AnswerEngineBuilder {
    config: Option<EngineConfig>,
    index: Option<Arc<dyn SnippetIndex>>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    generation_provider: Option<Arc<dyn GenerationProvider>>,
}

impl AnswerEngineBuilder {
    /// Set the engine configuration (defaults apply when omitted).
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the snippet index backend.
    pub fn index(mut self, index: Arc<dyn SnippetIndex>) -> Self {
        self.index = Some(index);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set an optional generation provider.
    pub fn generation_provider(mut self, provider: Arc<dyn GenerationProvider>) -> Self {
        self.generation_provider = Some(provider);
        self
    }

    /// Build the [`AnswerEngine`], validating that required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`SnipkitError::Config`] if the index or embedding provider
    /// is missing.
    pub fn build(self) -> Result<AnswerEngine> {
        let config = self.config.unwrap_or_default();
        let index =
            self.index.ok_or_else(|| SnipkitError::Config("index is required".to_string()))?;
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| SnipkitError::Config("embedding_provider is required".to_string()))?;

        Ok(AnswerEngine {
            config,
            index,
            embedder: CachedEmbedder::new(embedding_provider),
            generation: self.generation_provider,
        })
    }
}
