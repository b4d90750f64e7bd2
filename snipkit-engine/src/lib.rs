//! # snipkit-engine
//!
//! Retrieval, ranking, confidence, and refinement engine for
//! snippet-grounded question answering.
//!
//! The [`AnswerEngine`] composes a [`SnippetIndex`], an embedding provider
//! (wrapped in a content-hash cache), and an optional generation provider
//! into the ask workflow: scope resolution → optional hypothetical-document
//! expansion → vector retrieval → optional keyword reranking → confidence
//! calibration → closeness-controlled answer synthesis. Refinement
//! re-synthesizes an existing answer from the caller-supplied context
//! without touching retrieval.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use snipkit_core::{AskRequest, SnippetDraft};
//! use snipkit_engine::{AnswerEngine, InMemoryIndex};
//!
//! let engine = AnswerEngine::builder()
//!     .index(Arc::new(InMemoryIndex::new()))
//!     .embedding_provider(Arc::new(embedder))
//!     .build()?;
//!
//! engine.add_snippet(SnippetDraft::new("Refund window is 30 days.")).await?;
//! let result = engine.ask(AskRequest::new("What is the refund policy?")).await?;
//! assert!(!result.sources.is_empty());
//! ```

pub mod cache;
pub mod config;
pub mod confidence;
pub mod engine;
pub mod hyde;
pub mod index;
pub mod memory;
pub mod refine;
pub mod rerank;
pub mod scope;
pub mod synthesize;

pub use cache::CachedEmbedder;
pub use config::{EngineConfig, EngineConfigBuilder};
pub use engine::{AnswerEngine, AnswerEngineBuilder};
pub use index::{CandidateFilter, Hit, IndexedSnippet, SnippetIndex};
pub use memory::InMemoryIndex;
pub use synthesize::NO_MATCH_ANSWER;
