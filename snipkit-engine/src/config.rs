//! Configuration for the answer engine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use snipkit_core::{Result, SnipkitError};

/// Tunable parameters for retrieval, ranking, and synthesis.
///
/// Closeness and the reranking weights are configuration rather than code
/// branches; the per-request flags on `AskRequest` override the defaults
/// recorded here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Number of sources retrieved per ask.
    pub top_k: usize,
    /// Weight of the semantic similarity in the blended ranking score.
    pub semantic_weight: f32,
    /// Weight of the lexical overlap in the blended ranking score.
    pub lexical_weight: f32,
    /// Default paraphrase-vs-quote control in [0,1].
    pub closeness: f32,
    /// Default for hypothetical-document expansion.
    pub hyde: bool,
    /// Default for the keyword reranking pass.
    pub keyword_rerank: bool,
    /// Bound on the HyDE generation call, in seconds.
    pub hyde_timeout_secs: u64,
    /// Bound on answer/refinement generation calls, in seconds.
    pub generation_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            top_k: 8,
            semantic_weight: 0.7,
            lexical_weight: 0.3,
            closeness: 0.5,
            hyde: false,
            keyword_rerank: true,
            hyde_timeout_secs: 10,
            generation_timeout_secs: 60,
        }
    }
}

impl EngineConfig {
    /// Create a new builder for constructing an [`EngineConfig`].
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Bound applied to the HyDE generation call.
    pub fn hyde_timeout(&self) -> Duration {
        Duration::from_secs(self.hyde_timeout_secs)
    }

    /// Bound applied to answer and refinement generation calls.
    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }
}

/// Builder for constructing a validated [`EngineConfig`].
#[derive(Debug, Clone, Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// Set the number of sources retrieved per ask.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the semantic/lexical blend weights.
    pub fn weights(mut self, semantic: f32, lexical: f32) -> Self {
        self.config.semantic_weight = semantic;
        self.config.lexical_weight = lexical;
        self
    }

    /// Set the default answer closeness.
    pub fn closeness(mut self, closeness: f32) -> Self {
        self.config.closeness = closeness;
        self
    }

    /// Set the HyDE default.
    pub fn hyde(mut self, on: bool) -> Self {
        self.config.hyde = on;
        self
    }

    /// Set the keyword-rerank default.
    pub fn keyword_rerank(mut self, on: bool) -> Self {
        self.config.keyword_rerank = on;
        self
    }

    /// Set the HyDE generation bound in seconds.
    pub fn hyde_timeout_secs(mut self, secs: u64) -> Self {
        self.config.hyde_timeout_secs = secs;
        self
    }

    /// Set the answer generation bound in seconds.
    pub fn generation_timeout_secs(mut self, secs: u64) -> Self {
        self.config.generation_timeout_secs = secs;
        self
    }

    /// Build the [`EngineConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`SnipkitError::Config`] if:
    /// - `top_k == 0`
    /// - either weight is outside [0,1] or the weights do not sum to 1
    /// - `closeness` is outside [0,1]
    pub fn build(self) -> Result<EngineConfig> {
        let config = self.config;
        if config.top_k == 0 {
            return Err(SnipkitError::Config("top_k must be greater than zero".to_string()));
        }
        let weight_range = 0.0..=1.0;
        if !weight_range.contains(&config.semantic_weight)
            || !weight_range.contains(&config.lexical_weight)
        {
            return Err(SnipkitError::Config(format!(
                "weights must be within [0,1]: semantic {}, lexical {}",
                config.semantic_weight, config.lexical_weight
            )));
        }
        if (config.semantic_weight + config.lexical_weight - 1.0).abs() > 1e-4 {
            return Err(SnipkitError::Config(format!(
                "weights must sum to 1.0: semantic {} + lexical {}",
                config.semantic_weight, config.lexical_weight
            )));
        }
        if !(0.0..=1.0).contains(&config.closeness) {
            return Err(SnipkitError::Config(format!(
                "closeness must be within [0,1], got {}",
                config.closeness
            )));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(EngineConfig::builder().build().is_ok());
    }

    #[test]
    fn zero_top_k_rejected() {
        assert!(EngineConfig::builder().top_k(0).build().is_err());
    }

    #[test]
    fn weights_must_sum_to_one() {
        assert!(EngineConfig::builder().weights(0.7, 0.2).build().is_err());
        assert!(EngineConfig::builder().weights(0.5, 0.5).build().is_ok());
    }

    #[test]
    fn closeness_out_of_range_rejected() {
        assert!(EngineConfig::builder().closeness(1.5).build().is_err());
    }
}
