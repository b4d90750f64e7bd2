//! Snippet records and mutation inputs.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A unit of retrievable knowledge.
///
/// The `text` field is both the retrieval key and the answer material.
/// `example_questions` are additional retrieval keys whose matches always
/// resolve to this snippet; they are never shown as sources themselves.
/// `linked_snippets` is an undirected relation: when A links B, the index
/// materializes the back-reference at write time, so the linked-snippet
/// lookup finds the pair from either side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snippet {
    /// Unique, immutable, opaque identifier.
    pub id: String,
    /// The content used both for retrieval and as answer material.
    pub text: String,
    /// Optional display title, not used in ranking.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Optional display section label, not used in ranking.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_label: Option<String>,
    /// Optional scope-filter dimension. Unordered, not hierarchical.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// ISO-like language code; empty means unspecified.
    #[serde(default)]
    pub language: String,
    /// Free-text metadata, not a ranking input.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    /// Free-text metadata, not a ranking input.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Additional retrieval keys pointing at this snippet.
    #[serde(default)]
    pub example_questions: Vec<String>,
    /// Ids of snippets considered translations/counterparts of this one.
    #[serde(default)]
    pub linked_snippets: BTreeSet<String>,
    /// Marks a snippet produced by automatic translation. Excluded from
    /// default retrieval unless the caller opts in.
    #[serde(default)]
    pub is_generated_translation: bool,
    /// Where a translated snippet came from (e.g. "generated").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation_source: Option<String>,
    /// Optional reference to an original uploaded document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_document_url: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a snippet. The engine assigns the id and timestamps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnippetDraft {
    /// The snippet content.
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default)]
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub example_questions: Vec<String>,
    #[serde(default)]
    pub linked_snippets: BTreeSet<String>,
    #[serde(default)]
    pub is_generated_translation: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_document_url: Option<String>,
}

impl SnippetDraft {
    /// Create a draft with the given text and all other fields empty.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), ..Self::default() }
    }

    /// Set the display title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the scope-filter group.
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Set the language code.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Set the example questions used as extra retrieval keys.
    pub fn with_example_questions<I, S>(mut self, questions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.example_questions = questions.into_iter().map(Into::into).collect();
        self
    }

    /// Link this snippet to translation counterparts by id.
    pub fn with_linked_snippets<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.linked_snippets = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Mark this snippet as a generated translation.
    pub fn as_generated_translation(mut self, source: impl Into<String>) -> Self {
        self.is_generated_translation = true;
        self.translation_source = Some(source.into());
        self
    }
}

/// Partial update for a snippet. `None` fields are left unchanged.
///
/// Changing `text` or `example_questions` invalidates the affected
/// embeddings; the engine re-embeds through a content-hash keyed cache, so
/// unchanged content never recomputes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnippetPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_label: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example_questions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked_snippets: Option<BTreeSet<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_document_url: Option<Option<String>>,
}

impl SnippetPatch {
    /// Create an empty patch (a no-op update).
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snippet text.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Replace the title (`None` clears it).
    pub fn title(mut self, title: Option<String>) -> Self {
        self.title = Some(title);
        self
    }

    /// Replace the group (`None` clears it).
    pub fn group(mut self, group: Option<String>) -> Self {
        self.group = Some(group);
        self
    }

    /// Replace the language code.
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Replace the example questions.
    pub fn example_questions<I, S>(mut self, questions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.example_questions = Some(questions.into_iter().map(Into::into).collect());
        self
    }

    /// Replace the linked-snippet set.
    pub fn linked_snippets<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.linked_snippets = Some(ids.into_iter().map(Into::into).collect());
        self
    }
}
