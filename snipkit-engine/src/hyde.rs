//! Hypothetical-document expansion of the query.
//!
//! Generates a short hypothetical answer and embeds that instead of the raw
//! question, which often lands closer to answer-shaped snippet text in
//! embedding space. Any failure falls back silently to the raw question; a
//! HyDE failure never aborts an ask.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use snipkit_core::{GenerationProvider, GenerationRequest};

/// Output bound for the hypothetical answer.
const HYDE_MAX_TOKENS: u32 = 150;

/// Produce the text to embed as the query vector.
///
/// One bounded generation call, no tool use. Returns the hypothetical
/// answer when generation succeeds with non-empty output within the
/// timeout, otherwise the raw question.
pub async fn expand_query(
    generation: Option<&Arc<dyn GenerationProvider>>,
    question: &str,
    timeout: Duration,
) -> String {
    let Some(provider) = generation else {
        return question.to_string();
    };

    let prompt = format!(
        "Answer the following question in 1-2 short sentences, without using any \
         external sources. Be concise and direct.\n\nQuestion: {question}"
    );
    let request = GenerationRequest::new(prompt, HYDE_MAX_TOKENS);

    match tokio::time::timeout(timeout, provider.generate(request)).await {
        Ok(Ok(answer)) if !answer.trim().is_empty() => {
            debug!(provider = provider.name(), "query expanded with hypothetical answer");
            answer
        }
        Ok(Ok(_)) => {
            debug!(provider = provider.name(), "empty hypothetical answer; using raw question");
            question.to_string()
        }
        Ok(Err(e)) => {
            warn!(provider = provider.name(), error = %e, "hypothetical answer failed; using raw question");
            question.to_string()
        }
        Err(_) => {
            warn!(provider = provider.name(), "hypothetical answer timed out; using raw question");
            question.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use snipkit_core::Result;

    struct SlowProvider;

    #[async_trait]
    impl GenerationProvider for SlowProvider {
        fn name(&self) -> &str {
            "slow"
        }

        async fn generate(&self, _request: GenerationRequest) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok("too late".into())
        }
    }

    #[tokio::test]
    async fn no_provider_returns_raw_question() {
        let expanded = expand_query(None, "what is the refund policy?", Duration::from_secs(1)).await;
        assert_eq!(expanded, "what is the refund policy?");
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_falls_back_to_raw_question() {
        let provider: Arc<dyn GenerationProvider> = Arc::new(SlowProvider);
        let expanded =
            expand_query(Some(&provider), "question?", Duration::from_millis(50)).await;
        assert_eq!(expanded, "question?");
    }
}
