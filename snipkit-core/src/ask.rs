//! Ask/refine request and result contracts.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::snippet::Snippet;

/// Which snippets are eligible for a given ask.
///
/// Exactly one variant is active per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "values", rename_all = "snake_case")]
pub enum Scope {
    /// Every snippet (subject to language and translation filters).
    All,
    /// Snippets whose `group` is in the given set.
    Groups(BTreeSet<String>),
    /// Exactly the given snippet ids.
    Snippets(BTreeSet<String>),
}

impl Default for Scope {
    fn default() -> Self {
        Scope::All
    }
}

impl Scope {
    /// Scope restricted to the named groups.
    pub fn groups<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Scope::Groups(names.into_iter().map(Into::into).collect())
    }

    /// Scope restricted to the given snippet ids.
    pub fn snippets<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Scope::Snippets(ids.into_iter().map(Into::into).collect())
    }
}

/// A natural-language question plus retrieval controls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    /// The question to answer.
    pub question: String,
    /// Which snippets are eligible.
    #[serde(default)]
    pub scope: Scope,
    /// Language filter; empty means all languages.
    #[serde(default)]
    pub languages: BTreeSet<String>,
    /// Paraphrase-vs-quote control in [0,1]: 0 = free synthesis,
    /// 1 = near-verbatim extraction.
    #[serde(default = "default_closeness")]
    pub answer_closeness: f32,
    /// Embed a generated hypothetical answer instead of the raw question.
    #[serde(default)]
    pub use_hyde: bool,
    /// Blend a lexical overlap score into the ranking.
    #[serde(default = "default_true")]
    pub use_keyword_rerank: bool,
    /// Include snippets produced by automatic translation.
    #[serde(default)]
    pub include_generated_translations: bool,
}

fn default_closeness() -> f32 {
    0.5
}

fn default_true() -> bool {
    true
}

impl AskRequest {
    /// A request with the given question and default controls
    /// (all snippets, closeness 0.5, keyword rerank on, HyDE off).
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            scope: Scope::All,
            languages: BTreeSet::new(),
            answer_closeness: default_closeness(),
            use_hyde: false,
            use_keyword_rerank: true,
            include_generated_translations: false,
        }
    }

    /// Restrict the request to a scope.
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Restrict the request to the given languages.
    pub fn with_languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.languages = languages.into_iter().map(Into::into).collect();
        self
    }

    /// Set the answer closeness in [0,1].
    pub fn with_closeness(mut self, closeness: f32) -> Self {
        self.answer_closeness = closeness;
        self
    }

    /// Enable or disable hypothetical-document expansion.
    pub fn with_hyde(mut self, on: bool) -> Self {
        self.use_hyde = on;
        self
    }

    /// Enable or disable the keyword reranking pass.
    pub fn with_keyword_rerank(mut self, on: bool) -> Self {
        self.use_keyword_rerank = on;
        self
    }

    /// Include generated translations in retrieval.
    pub fn with_generated_translations(mut self, on: bool) -> Self {
        self.include_generated_translations = on;
        self
    }
}

/// One retrieved source backing an answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceItem {
    /// The owning snippet id.
    pub id: String,
    /// The snippet text.
    pub text: String,
    /// Display title, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Display section label, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_label: Option<String>,
    /// Calibrated per-source confidence in [0,1].
    pub snippet_confidence: f32,
    /// Language code echo.
    #[serde(default)]
    pub language: String,
    /// Metadata echo.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    /// Metadata echo.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Metadata echo.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Translation counterparts of this snippet.
    #[serde(default)]
    pub linked_snippets: BTreeSet<String>,
    /// Whether this snippet was produced by automatic translation.
    #[serde(default)]
    pub is_generated_translation: bool,
    /// Reference to the original uploaded document, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_document_url: Option<String>,
}

impl SourceItem {
    /// Build a source item from a snippet and its confidence.
    pub fn from_snippet(snippet: &Snippet, confidence: f32) -> Self {
        Self {
            id: snippet.id.clone(),
            text: snippet.text.clone(),
            title: snippet.title.clone(),
            section_label: snippet.section_label.clone(),
            snippet_confidence: confidence,
            language: snippet.language.clone(),
            heading: snippet.heading.clone(),
            category: snippet.category.clone(),
            group: snippet.group.clone(),
            linked_snippets: snippet.linked_snippets.clone(),
            is_generated_translation: snippet.is_generated_translation,
            source_document_url: snippet.source_document_url.clone(),
        }
    }
}

/// A synthesized answer with ranked sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResult {
    /// The answer text.
    pub answer: String,
    /// Sources ranked by non-increasing confidence.
    pub sources: Vec<SourceItem>,
    /// Aggregate answer confidence in [0,1].
    pub answer_confidence: f32,
}

/// Input for re-synthesizing an existing answer.
///
/// Refinement never re-ranks or re-retrieves: the caller passes back the
/// original sources and the engine is a pure function of this request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefineRequest {
    /// The question the original answer responded to.
    pub original_question: String,
    /// The answer being refined.
    pub original_answer: String,
    /// Natural-language transformation directive.
    pub instruction: String,
    /// Sources to ground the refinement on; empty means all of `sources`.
    #[serde(default)]
    pub selected_source_ids: BTreeSet<String>,
    /// The full source list from the original result.
    pub sources: Vec<SourceItem>,
    /// Paraphrase-vs-quote control in [0,1].
    #[serde(default = "default_closeness")]
    pub answer_closeness: f32,
}

/// The outcome of a refinement.
///
/// `sources` is by contract identical (ids and order) to the list passed in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefineResult {
    /// The refined answer text.
    pub answer: String,
    /// The unchanged source list.
    pub sources: Vec<SourceItem>,
    /// Aggregate confidence of the refined answer in [0,1].
    pub answer_confidence: f32,
}

/// UI confidence tier for a [0,1] confidence value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl ConfidenceTier {
    /// Tier cuts: >= 0.70 high, >= 0.40 medium, below low.
    pub fn from_confidence(confidence: f32) -> Self {
        if confidence >= 0.70 {
            ConfidenceTier::High
        } else if confidence >= 0.40 {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }
}

/// Presentation helper: confidence as a whole percentage.
pub fn confidence_percent(confidence: f32) -> u8 {
    (confidence.clamp(0.0, 1.0) * 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_cuts() {
        assert_eq!(ConfidenceTier::from_confidence(0.70), ConfidenceTier::High);
        assert_eq!(ConfidenceTier::from_confidence(0.69), ConfidenceTier::Medium);
        assert_eq!(ConfidenceTier::from_confidence(0.40), ConfidenceTier::Medium);
        assert_eq!(ConfidenceTier::from_confidence(0.39), ConfidenceTier::Low);
    }

    #[test]
    fn percent_rounds() {
        assert_eq!(confidence_percent(0.854), 85);
        assert_eq!(confidence_percent(1.2), 100);
        assert_eq!(confidence_percent(-0.1), 0);
    }

    #[test]
    fn scope_serde_round_trip() {
        let scope = Scope::groups(["faq", "billing"]);
        let json = serde_json::to_string(&scope).unwrap();
        let back: Scope = serde_json::from_str(&json).unwrap();
        assert_eq!(scope, back);
    }
}
