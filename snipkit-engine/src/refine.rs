//! Stateless answer refinement.
//!
//! Each call runs `Idle → Refining → Idle`; a provider failure is the
//! recoverable `Refining → Failed` transition, observed by the caller as
//! the prior answer coming back unchanged. The engine holds no state across
//! calls: the caller supplies the full context every time, and the source
//! list passed in is echoed back untouched (same ids, same order).

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use snipkit_core::{GenerationProvider, GenerationRequest, RefineRequest, RefineResult, SourceItem};

use crate::confidence::answer_confidence;
use crate::rerank::significant_tokens;
use crate::synthesize::{closeness_instruction, sources_block, ANSWER_MAX_TOKENS};

fn system_prompt(closeness: f32, strict: bool) -> String {
    let mut prompt = format!(
        "You are refining an existing answer based on user feedback. {} Use the \
         provided snippets as context; do not add information that is not present \
         in the snippets or the original answer. Produce only the improved answer \
         without any explanations or meta-commentary.",
        closeness_instruction(closeness)
    );
    if strict {
        prompt.push_str(
            " Your previous attempt introduced information that is not present in \
             the snippets. Refine again using ONLY words and facts from the \
             snippets and the original answer.",
        );
    }
    prompt
}

fn user_prompt(request: &RefineRequest, grounding: &[SourceItem]) -> String {
    format!(
        "Original question: {}\n\nOriginal answer: {}\n\nRefinement request: {}\n\n\
         Context snippets to use:\n{}\n\nPlease provide the refined answer:",
        request.original_question,
        request.original_answer,
        request.instruction,
        sources_block(grounding)
    )
}

/// Re-synthesize an answer from a prior answer, an instruction, and a
/// subset of the original sources.
///
/// Never re-ranks or re-retrieves. The new confidence is computed from the
/// grounding sources' confidences, so it cannot exceed their maximum.
/// Provider failures and persistent grounding violations return the prior
/// answer unchanged.
pub async fn refine(
    generation: Option<&Arc<dyn GenerationProvider>>,
    request: &RefineRequest,
    timeout: Duration,
) -> RefineResult {
    let grounding: Vec<SourceItem> = if request.selected_source_ids.is_empty() {
        request.sources.clone()
    } else {
        request
            .sources
            .iter()
            .filter(|s| request.selected_source_ids.contains(&s.id))
            .cloned()
            .collect()
    };

    if grounding.is_empty() {
        debug!("refinement has no grounding sources; returning prior answer");
        return RefineResult {
            answer: request.original_answer.clone(),
            sources: request.sources.clone(),
            answer_confidence: 0.0,
        };
    }

    let confidences: Vec<f32> = grounding.iter().map(|s| s.snippet_confidence).collect();
    let fallback_confidence = answer_confidence(&confidences);
    let fallback = || RefineResult {
        answer: request.original_answer.clone(),
        sources: request.sources.clone(),
        answer_confidence: fallback_confidence,
    };

    let Some(provider) = generation else {
        debug!("no generation capability; refinement returns prior answer");
        return fallback();
    };

    let user = user_prompt(request, &grounding);

    for strict in [false, true] {
        let system = system_prompt(request.answer_closeness, strict);
        let allowed: BTreeSet<String> =
            significant_tokens(&system).into_iter().chain(significant_tokens(&user)).collect();
        let generation_request =
            GenerationRequest::new(user.clone(), ANSWER_MAX_TOKENS).with_system(system);

        let answer = match tokio::time::timeout(timeout, provider.generate(generation_request)).await
        {
            Ok(Ok(answer)) if !answer.trim().is_empty() => answer.trim().to_string(),
            Ok(Ok(_)) => {
                warn!(provider = provider.name(), "empty refinement output; keeping prior answer");
                return fallback();
            }
            Ok(Err(e)) => {
                warn!(provider = provider.name(), error = %e, "refinement failed; keeping prior answer");
                return fallback();
            }
            Err(_) => {
                warn!(provider = provider.name(), "refinement timed out; keeping prior answer");
                return fallback();
            }
        };

        let violations = crate::synthesize::grounding_violations(&answer, &allowed);
        if violations.is_empty() {
            return RefineResult {
                answer,
                sources: request.sources.clone(),
                answer_confidence: answer_confidence(&confidences),
            };
        }
        info!(
            violations = violations.len(),
            strict, "refinement introduced ungrounded content"
        );
    }

    fallback()
}
