//! Error types shared across the snipkit crates.

use thiserror::Error;

/// Errors that can occur across the snippet answer engine.
///
/// Provider failures are recovered locally by the engine (fallback to the
/// raw question for retrieval, verbatim top-snippet answers for synthesis)
/// and are never surfaced from `ask`/`refine`. Only index failures are fatal
/// to a request.
#[derive(Debug, Error)]
pub enum SnipkitError {
    /// An embedding or generation backend is unreachable or misbehaving.
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// The provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The snippet index backend failed.
    #[error("Index error ({backend}): {message}")]
    Index {
        /// The index backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A snippet id was not found by a direct lookup or mutation.
    ///
    /// Stale ids inside a retrieval scope are filtered silently instead.
    #[error("Snippet not found: {0}")]
    SnippetNotFound(String),

    /// Generated text introduced content not present in the supplied sources.
    ///
    /// Handled inside the synthesizer (stricter retry, then verbatim
    /// fallback); callers never observe this variant from `ask`.
    #[error("Grounding violation: {0}")]
    Grounding(String),
}

/// A convenience result type for snipkit operations.
pub type Result<T> = std::result::Result<T, SnipkitError>;
