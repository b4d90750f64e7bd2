//! Backend selection and per-provider configuration.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use snipkit_core::{EmbeddingProvider, GenerationProvider};

use crate::azure::{AzureChat, AzureEmbeddings};
use crate::ollama::{OllamaChat, OllamaEmbeddings};

/// Which generation backend to use.
///
/// `Auto` prefers Azure when its endpoint and key are configured, otherwise
/// Ollama. `None` disables generation entirely; the engine then answers with
/// the top snippet verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationBackend {
    #[default]
    Auto,
    Azure,
    Ollama,
    None,
}

/// Azure OpenAI connection settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AzureConfig {
    /// Resource endpoint, e.g. `https://my-resource.openai.azure.com`.
    pub endpoint: String,
    /// API key for the resource.
    pub api_key: String,
    /// Chat deployment name.
    pub chat_deployment: String,
    /// Embedding deployment name; empty disables Azure embeddings.
    #[serde(default)]
    pub embedding_deployment: String,
    /// API version query parameter.
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

fn default_api_version() -> String {
    "2024-02-15-preview".to_string()
}

impl AzureConfig {
    /// Whether chat credentials are present.
    pub fn has_chat_credentials(&self) -> bool {
        !self.endpoint.trim().is_empty()
            && !self.api_key.trim().is_empty()
            && !self.chat_deployment.trim().is_empty()
    }

    /// Whether embedding credentials are present.
    pub fn has_embedding_credentials(&self) -> bool {
        !self.endpoint.trim().is_empty()
            && !self.api_key.trim().is_empty()
            && !self.embedding_deployment.trim().is_empty()
    }
}

/// Ollama (OpenAI-compatible local server) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Server base URL.
    pub base_url: String,
    /// Chat model name.
    pub chat_model: String,
    /// Embedding model name.
    pub embedding_model: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            chat_model: "llama3.2".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
        }
    }
}

/// Full backend configuration, resolved once at process start.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Generation backend selection.
    #[serde(default)]
    pub backend: GenerationBackend,
    /// Azure settings (used when selected or preferred by `Auto`).
    #[serde(default)]
    pub azure: AzureConfig,
    /// Ollama settings.
    #[serde(default)]
    pub ollama: OllamaConfig,
    /// Per-request HTTP timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    60
}

impl ModelConfig {
    /// Read configuration from environment variables.
    ///
    /// Recognized variables: `SNIPKIT_LLM_PROVIDER` (`auto` | `azure` |
    /// `ollama` | `none`), `AZURE_OPENAI_ENDPOINT`, `AZURE_OPENAI_API_KEY`,
    /// `AZURE_OPENAI_CHAT_DEPLOYMENT`, `AZURE_OPENAI_EMBEDDING_DEPLOYMENT`,
    /// `AZURE_OPENAI_API_VERSION`, `OLLAMA_BASE_URL`, `OLLAMA_CHAT_MODEL`,
    /// `OLLAMA_EMBEDDING_MODEL`.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).unwrap_or_default();
        let backend = match var("SNIPKIT_LLM_PROVIDER").to_lowercase().as_str() {
            "azure" => GenerationBackend::Azure,
            "ollama" => GenerationBackend::Ollama,
            "none" => GenerationBackend::None,
            _ => GenerationBackend::Auto,
        };
        let mut config = Self {
            backend,
            azure: AzureConfig {
                endpoint: var("AZURE_OPENAI_ENDPOINT"),
                api_key: var("AZURE_OPENAI_API_KEY"),
                chat_deployment: var("AZURE_OPENAI_CHAT_DEPLOYMENT"),
                embedding_deployment: var("AZURE_OPENAI_EMBEDDING_DEPLOYMENT"),
                api_version: default_api_version(),
            },
            ollama: OllamaConfig::default(),
            request_timeout_secs: default_timeout_secs(),
        };
        let api_version = var("AZURE_OPENAI_API_VERSION");
        if !api_version.is_empty() {
            config.azure.api_version = api_version;
        }
        let base_url = var("OLLAMA_BASE_URL");
        if !base_url.is_empty() {
            config.ollama.base_url = base_url;
        }
        let chat_model = var("OLLAMA_CHAT_MODEL");
        if !chat_model.is_empty() {
            config.ollama.chat_model = chat_model;
        }
        let embedding_model = var("OLLAMA_EMBEDDING_MODEL");
        if !embedding_model.is_empty() {
            config.ollama.embedding_model = embedding_model;
        }
        config
    }

    /// Timeout applied to each backend HTTP request.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Resolve the effective generation provider, or `None` when generation
    /// is disabled or unconfigured.
    ///
    /// `Auto` prefers Azure when its chat credentials are present, otherwise
    /// Ollama. An explicit `Azure` selection without credentials degrades to
    /// `None` rather than producing a provider that can never succeed.
    pub fn generation_provider(&self) -> Option<Arc<dyn GenerationProvider>> {
        match self.backend {
            GenerationBackend::None => None,
            GenerationBackend::Azure => {
                if self.azure.has_chat_credentials() {
                    info!(provider = "azure", deployment = %self.azure.chat_deployment, "generation backend selected");
                    Some(Arc::new(AzureChat::new(self.azure.clone(), self.request_timeout())))
                } else {
                    info!("azure selected but credentials missing; generation disabled");
                    None
                }
            }
            GenerationBackend::Ollama => {
                info!(provider = "ollama", model = %self.ollama.chat_model, "generation backend selected");
                Some(Arc::new(OllamaChat::new(self.ollama.clone(), self.request_timeout())))
            }
            GenerationBackend::Auto => {
                if self.azure.has_chat_credentials() {
                    info!(provider = "azure", deployment = %self.azure.chat_deployment, "generation backend selected (auto)");
                    Some(Arc::new(AzureChat::new(self.azure.clone(), self.request_timeout())))
                } else {
                    info!(provider = "ollama", model = %self.ollama.chat_model, "generation backend selected (auto)");
                    Some(Arc::new(OllamaChat::new(self.ollama.clone(), self.request_timeout())))
                }
            }
        }
    }

    /// Resolve the embedding provider, or `None` when nothing is configured.
    ///
    /// Azure embeddings require the embedding deployment to be set;
    /// otherwise Ollama serves embeddings through its OpenAI-compatible
    /// endpoint.
    pub fn embedding_provider(&self) -> Option<Arc<dyn EmbeddingProvider>> {
        if self.azure.has_embedding_credentials() {
            info!(provider = "azure", deployment = %self.azure.embedding_deployment, "embedding backend selected");
            return Some(Arc::new(AzureEmbeddings::new(
                self.azure.clone(),
                self.request_timeout(),
            )));
        }
        if self.backend == GenerationBackend::None {
            return None;
        }
        info!(provider = "ollama", model = %self.ollama.embedding_model, "embedding backend selected");
        Some(Arc::new(OllamaEmbeddings::new(self.ollama.clone(), self.request_timeout())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn azure_config() -> AzureConfig {
        AzureConfig {
            endpoint: "https://example.openai.azure.com".into(),
            api_key: "key".into(),
            chat_deployment: "gpt".into(),
            embedding_deployment: String::new(),
            api_version: default_api_version(),
        }
    }

    #[test]
    fn auto_prefers_azure_with_credentials() {
        let config =
            ModelConfig { backend: GenerationBackend::Auto, azure: azure_config(), ..Default::default() };
        let provider = config.generation_provider().expect("provider");
        assert_eq!(provider.name(), "azure");
    }

    #[test]
    fn auto_falls_back_to_ollama() {
        let config = ModelConfig::default();
        let provider = config.generation_provider().expect("provider");
        assert_eq!(provider.name(), "ollama");
    }

    #[test]
    fn explicit_azure_without_credentials_disables_generation() {
        let config = ModelConfig { backend: GenerationBackend::Azure, ..Default::default() };
        assert!(config.generation_provider().is_none());
    }

    #[test]
    fn none_disables_generation() {
        let config = ModelConfig { backend: GenerationBackend::None, ..Default::default() };
        assert!(config.generation_provider().is_none());
        assert!(config.embedding_provider().is_none());
    }
}
