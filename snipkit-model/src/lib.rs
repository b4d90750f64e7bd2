//! # snipkit-model
//!
//! Embedding and generation backends for the snipkit answer engine.
//!
//! ## Overview
//!
//! This crate provides the concrete capability implementations consumed by
//! `snipkit-engine`:
//!
//! - [`AzureChat`] / [`AzureEmbeddings`] - Azure OpenAI deployments
//! - [`OllamaChat`] / [`OllamaEmbeddings`] - local Ollama via its
//!   OpenAI-compatible API
//! - [`MockGeneration`] / [`MockEmbedding`] - deterministic mocks for tests
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use snipkit_model::ModelConfig;
//!
//! let config = ModelConfig::from_env();
//! let generation = config.generation_provider();   // None when disabled
//! let embeddings = config.embedding_provider();
//! ```
//!
//! ## Backend selection
//!
//! | `SNIPKIT_LLM_PROVIDER` | Behavior |
//! |------------------------|----------|
//! | `auto` (default)       | Azure when endpoint+key are set, else Ollama |
//! | `azure`                | Azure, or disabled when credentials are missing |
//! | `ollama`               | Ollama |
//! | `none`                 | Generation disabled; answers fall back to the top snippet |

pub mod azure;
pub mod config;
pub mod mock;
pub mod ollama;
mod wire;

pub use azure::{AzureChat, AzureEmbeddings};
pub use config::{AzureConfig, GenerationBackend, ModelConfig, OllamaConfig};
pub use mock::{MockEmbedding, MockGeneration};
pub use ollama::{OllamaChat, OllamaEmbeddings};
