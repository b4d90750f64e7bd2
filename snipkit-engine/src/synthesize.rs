//! Answer synthesis from ranked sources.
//!
//! With no generation capability the synthesizer deterministically returns
//! the top-ranked source verbatim — a first-class behavior, not an error
//! path. With a generator, it builds a grounding prompt that restricts the
//! model to the supplied source texts, verifies the output against them, and
//! falls back to verbatim extraction when the model cannot be kept grounded.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use snipkit_core::{GenerationProvider, GenerationRequest, SourceItem};

use crate::confidence::answer_confidence;
use crate::rerank::significant_tokens;

/// Deterministic answer for an empty candidate or result set.
pub const NO_MATCH_ANSWER: &str =
    "No relevant snippets in the knowledge base. Add snippets first.";

/// Output bound for answer and refinement generation.
pub(crate) const ANSWER_MAX_TOKENS: u32 = 800;

/// A synthesized answer with its aggregate confidence.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisOutcome {
    pub answer: String,
    pub answer_confidence: f32,
}

/// The paraphrase-vs-quote instruction for a closeness value.
///
/// Below 0.3 the sources are inspiration only; above 0.7 the answer must
/// stay with their exact wording; in between, light rephrasing is allowed.
/// Every tier forbids adding information absent from the sources.
pub(crate) fn closeness_instruction(closeness: f32) -> &'static str {
    if closeness < 0.3 {
        "Use the provided snippets as inspiration only. You may answer freely and \
         rephrase, but do not add information that is not present in the snippets."
    } else if closeness > 0.7 {
        "Your answer MUST stay as close as possible to the exact wording of the \
         snippets. Prefer quoting over paraphrasing; do not add new formulations or \
         information not in the snippets."
    } else {
        "Formulate your answer closely based on the snippets; light rephrasing is \
         allowed. Do not add information that is not present in the snippets."
    }
}

/// Numbered source block used in grounding prompts.
pub(crate) fn sources_block(sources: &[SourceItem]) -> String {
    sources
        .iter()
        .enumerate()
        .map(|(i, s)| format!("[{}] {}", i + 1, s.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn system_prompt(closeness: f32, strict: bool) -> String {
    let mut prompt = format!(
        "You are a helpful assistant that answers the user's question using only \
         the provided numbered snippets, in the same language as the question. {} \
         If the snippets do not contain the answer, politely say so.",
        closeness_instruction(closeness)
    );
    if strict {
        prompt.push_str(
            " Your previous answer introduced information that is not present in the \
             snippets. Answer again using ONLY words and facts from the snippets.",
        );
    }
    prompt
}

fn user_prompt(question: &str, sources: &[SourceItem]) -> String {
    format!("Question:\n{question}\n\nSnippets:\n{}", sources_block(sources))
}

/// Long answer tokens not covered by the allowed context.
///
/// The check is lexical and deliberately cheap: every alphabetic token of
/// six or more characters in the answer must occur somewhere in the prompt
/// that produced it (sources, question, scaffolding). Names, figures, and
/// invented facts the sources never mention trip it.
pub(crate) fn grounding_violations(answer: &str, allowed: &BTreeSet<String>) -> Vec<String> {
    significant_tokens(answer)
        .into_iter()
        .filter(|t| t.chars().count() >= 6 && t.chars().all(|c| c.is_alphabetic()))
        .filter(|t| !allowed.contains(t))
        .collect()
}

/// Synthesize an answer from ranked sources.
///
/// Never returns an error: provider failures, timeouts, and persistent
/// grounding violations all degrade to the verbatim top-source answer with
/// that source's confidence.
pub async fn synthesize(
    generation: Option<&Arc<dyn GenerationProvider>>,
    question: &str,
    sources: &[SourceItem],
    closeness: f32,
    timeout: Duration,
) -> SynthesisOutcome {
    let Some(top) = sources.first() else {
        return SynthesisOutcome { answer: NO_MATCH_ANSWER.to_string(), answer_confidence: 0.0 };
    };
    let verbatim = || SynthesisOutcome {
        answer: top.text.clone(),
        answer_confidence: top.snippet_confidence,
    };

    let Some(provider) = generation else {
        debug!("no generation capability; answering with top snippet verbatim");
        return verbatim();
    };

    let confidences: Vec<f32> = sources.iter().map(|s| s.snippet_confidence).collect();
    let user = user_prompt(question, sources);

    for strict in [false, true] {
        let system = system_prompt(closeness, strict);
        let allowed: BTreeSet<String> =
            significant_tokens(&system).into_iter().chain(significant_tokens(&user)).collect();
        let request =
            GenerationRequest::new(user.clone(), ANSWER_MAX_TOKENS).with_system(system);

        let answer = match tokio::time::timeout(timeout, provider.generate(request)).await {
            Ok(Ok(answer)) if !answer.trim().is_empty() => answer.trim().to_string(),
            Ok(Ok(_)) => {
                warn!(provider = provider.name(), "empty generation output; falling back to top snippet");
                return verbatim();
            }
            Ok(Err(e)) => {
                warn!(provider = provider.name(), error = %e, "generation failed; falling back to top snippet");
                return verbatim();
            }
            Err(_) => {
                warn!(provider = provider.name(), "generation timed out; falling back to top snippet");
                return verbatim();
            }
        };

        let violations = grounding_violations(&answer, &allowed);
        if violations.is_empty() {
            return SynthesisOutcome {
                answer,
                answer_confidence: answer_confidence(&confidences),
            };
        }
        if strict {
            info!(
                violations = violations.len(),
                "generation stayed ungrounded after retry; falling back to top snippet"
            );
        } else {
            info!(violations = violations.len(), "generation introduced ungrounded content; retrying strictly");
        }
    }

    verbatim()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(id: &str, text: &str, confidence: f32) -> SourceItem {
        SourceItem {
            id: id.into(),
            text: text.into(),
            title: None,
            section_label: None,
            snippet_confidence: confidence,
            language: String::new(),
            heading: None,
            category: None,
            group: None,
            linked_snippets: BTreeSet::new(),
            is_generated_translation: false,
            source_document_url: None,
        }
    }

    #[test]
    fn closeness_tiers() {
        assert!(closeness_instruction(0.1).contains("inspiration"));
        assert!(closeness_instruction(0.5).contains("light rephrasing"));
        assert!(closeness_instruction(0.9).contains("exact wording"));
    }

    #[test]
    fn sources_block_is_numbered() {
        let sources = vec![source("a", "first", 0.9), source("b", "second", 0.5)];
        assert_eq!(sources_block(&sources), "[1] first\n\n[2] second");
    }

    #[test]
    fn grounded_answer_has_no_violations() {
        let allowed = significant_tokens("The refund window is 30 days for all purchases.");
        assert!(grounding_violations("Refund window: 30 days.", &allowed).is_empty());
    }

    #[test]
    fn fabricated_token_is_flagged() {
        let allowed = significant_tokens("The refund window is 30 days.");
        let violations = grounding_violations("Contact our Zurich headquarters.", &allowed);
        assert!(violations.iter().any(|t| t == "headquarters"));
    }

    #[tokio::test]
    async fn empty_sources_yield_no_match_answer() {
        let outcome = synthesize(None, "question?", &[], 0.5, Duration::from_secs(1)).await;
        assert_eq!(outcome.answer, NO_MATCH_ANSWER);
        assert_eq!(outcome.answer_confidence, 0.0);
    }

    #[tokio::test]
    async fn no_provider_returns_top_source_verbatim() {
        let sources = vec![source("a", "Refund window is 30 days.", 0.85)];
        let outcome = synthesize(None, "refund?", &sources, 0.5, Duration::from_secs(1)).await;
        assert_eq!(outcome.answer, "Refund window is 30 days.");
        assert_eq!(outcome.answer_confidence, 0.85);
    }
}
