//! Scope resolution: from a request's scope selector to a candidate filter.

use std::collections::BTreeSet;

use snipkit_core::Scope;

use crate::index::CandidateFilter;

/// Build the candidate filter for an ask.
///
/// `Snippets` scopes intersect with the language filter; an empty
/// intersection stays empty rather than falling back to `All`. Ids of
/// deleted snippets simply match nothing in the index.
pub fn candidate_filter(
    scope: &Scope,
    languages: &BTreeSet<String>,
    include_generated_translations: bool,
) -> CandidateFilter {
    let languages = if languages.is_empty() { None } else { Some(languages.clone()) };
    let mut filter = CandidateFilter {
        groups: None,
        ids: None,
        languages,
        include_generated_translations,
    };
    match scope {
        Scope::All => {}
        Scope::Groups(names) => filter.groups = Some(names.clone()),
        Scope::Snippets(ids) => filter.ids = Some(ids.clone()),
    }
    filter
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use snipkit_core::Snippet;

    fn snippet(id: &str, group: Option<&str>, language: &str, generated: bool) -> Snippet {
        let now = Utc::now();
        Snippet {
            id: id.to_string(),
            text: "text".into(),
            title: None,
            section_label: None,
            group: group.map(String::from),
            language: language.to_string(),
            heading: None,
            category: None,
            example_questions: Vec::new(),
            linked_snippets: BTreeSet::new(),
            is_generated_translation: generated,
            translation_source: None,
            source_document_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn all_scope_applies_language_filter() {
        let filter = candidate_filter(&Scope::All, &set(&["de"]), false);
        assert!(filter.matches(&snippet("a", None, "de", false)));
        assert!(!filter.matches(&snippet("b", None, "en", false)));
        // Unspecified language passes any language filter.
        assert!(filter.matches(&snippet("c", None, "", false)));
    }

    #[test]
    fn groups_scope_unions_named_groups() {
        let filter = candidate_filter(&Scope::groups(["faq", "billing"]), &BTreeSet::new(), false);
        assert!(filter.matches(&snippet("a", Some("faq"), "", false)));
        assert!(filter.matches(&snippet("b", Some("billing"), "", false)));
        assert!(!filter.matches(&snippet("c", Some("other"), "", false)));
        assert!(!filter.matches(&snippet("d", None, "", false)));
    }

    #[test]
    fn snippet_scope_intersects_language() {
        let filter = candidate_filter(&Scope::snippets(["a", "b"]), &set(&["en"]), false);
        assert!(filter.matches(&snippet("a", None, "en", false)));
        assert!(!filter.matches(&snippet("a", None, "de", false)));
        assert!(!filter.matches(&snippet("c", None, "en", false)));
    }

    #[test]
    fn generated_translations_need_opt_in() {
        let closed = candidate_filter(&Scope::All, &BTreeSet::new(), false);
        let open = candidate_filter(&Scope::All, &BTreeSet::new(), true);
        let generated = snippet("a", None, "fr", true);
        assert!(!closed.matches(&generated));
        assert!(open.matches(&generated));
    }
}
