//! Lexical keyword reranking blended with semantic confidence.
//!
//! A strictly reordering pass over the retriever's result set: it may move
//! snippets around but never adds one the retriever did not return.

use std::collections::BTreeSet;

/// English stop words.
const STOP_WORDS_EN: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "can", "do", "does", "for", "from",
    "has", "have", "how", "i", "if", "in", "is", "it", "its", "my", "no", "not", "of", "on", "or",
    "our", "so", "that", "the", "their", "there", "this", "to", "was", "we", "what", "when",
    "where", "which", "who", "why", "will", "with", "you", "your",
];

/// German stop words; the snippet corpus is bilingual.
const STOP_WORDS_DE: &[&str] = &[
    "aber", "als", "am", "an", "auch", "auf", "aus", "bei", "bin", "bis", "das", "dass", "dem",
    "den", "der", "des", "die", "ein", "eine", "einem", "einen", "einer", "es", "für", "hat",
    "ich", "im", "in", "ist", "kann", "mit", "nach", "nicht", "oder", "sich", "sie", "sind", "um",
    "und", "von", "vor", "war", "was", "wie", "wir", "wird", "wo", "zu", "zum", "zur",
];

fn is_stop_word(token: &str) -> bool {
    STOP_WORDS_EN.contains(&token) || STOP_WORDS_DE.contains(&token)
}

/// Lowercased alphanumeric tokens with stop words removed.
pub fn significant_tokens(text: &str) -> BTreeSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty() && !is_stop_word(t))
        .map(String::from)
        .collect()
}

/// Fraction of the question's significant tokens present in the text.
///
/// Returns a score in [0,1]; a question with no significant tokens scores
/// 0.0 against everything.
pub fn lexical_score(question_tokens: &BTreeSet<String>, text: &str) -> f32 {
    if question_tokens.is_empty() {
        return 0.0;
    }
    let text_tokens = significant_tokens(text);
    let overlap = question_tokens.intersection(&text_tokens).count();
    overlap as f32 / question_tokens.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_drop_stop_words_and_case() {
        let tokens = significant_tokens("What is the Refund Policy?");
        assert!(tokens.contains("refund"));
        assert!(tokens.contains("policy"));
        assert!(!tokens.contains("what"));
        assert!(!tokens.contains("the"));
    }

    #[test]
    fn german_stop_words_are_dropped() {
        let tokens = significant_tokens("Wie ist die Rückgabefrist für Bestellungen?");
        assert!(tokens.contains("rückgabefrist"));
        assert!(!tokens.contains("die"));
        assert!(!tokens.contains("für"));
    }

    #[test]
    fn full_overlap_scores_one() {
        let question = significant_tokens("refund policy");
        assert_eq!(lexical_score(&question, "our refund policy is generous"), 1.0);
    }

    #[test]
    fn no_overlap_scores_zero() {
        let question = significant_tokens("refund policy");
        assert_eq!(lexical_score(&question, "shipping takes three days"), 0.0);
    }

    #[test]
    fn partial_overlap_is_fractional() {
        let question = significant_tokens("refund policy window");
        let score = lexical_score(&question, "the refund window");
        assert!((score - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn stop_word_only_question_scores_zero() {
        let question = significant_tokens("what is the");
        assert_eq!(lexical_score(&question, "anything at all"), 0.0);
    }
}
