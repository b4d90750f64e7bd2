//! Property tests for in-memory index search ordering.

use std::collections::BTreeSet;

use chrono::Utc;
use proptest::prelude::*;
use snipkit_core::Snippet;
use snipkit_engine::index::{IndexedSnippet, SnippetIndex};
use snipkit_engine::memory::InMemoryIndex;

/// Generate a non-zero L2-normalized embedding of the given dimension.
fn arb_normalized_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim).prop_filter_map(
        "non-zero embedding",
        |mut v| {
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm < 1e-8 {
                return None;
            }
            for val in &mut v {
                *val /= norm;
            }
            Some(v)
        },
    )
}

fn snippet(id: String, text: String) -> Snippet {
    let now = Utc::now();
    Snippet {
        id,
        text,
        title: None,
        section_label: None,
        group: None,
        language: String::new(),
        heading: None,
        category: None,
        example_questions: Vec::new(),
        linked_snippets: BTreeSet::new(),
        is_generated_translation: false,
        translation_source: None,
        source_document_url: None,
        created_at: now,
        updated_at: now,
    }
}

/// Generate an indexed snippet with a normalized text embedding.
fn arb_entry(dim: usize) -> impl Strategy<Value = IndexedSnippet> {
    ("[a-z]{3,8}", "[a-z ]{5,30}", arb_normalized_embedding(dim)).prop_map(
        |(id, text, embedding)| IndexedSnippet {
            snippet: snippet(id, text),
            text_embedding: embedding,
            example_question_embeddings: Vec::new(),
        },
    )
}

/// For any set of indexed snippets, searching with a query embedding returns
/// results ordered by descending cosine similarity (ties broken by ascending
/// id), at most `limit` of them, and with no id repeated.
mod prop_search_ordering {
    use super::*;

    const DIM: usize = 16;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn search_is_ordered_deduped_and_bounded(
            entries in proptest::collection::vec(arb_entry(DIM), 1..20),
            query in arb_normalized_embedding(DIM),
            limit in 1usize..10,
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            runtime.block_on(async {
                let index = InMemoryIndex::new();
                for entry in &entries {
                    index.upsert(entry.clone()).await.unwrap();
                }
                let candidates: BTreeSet<String> =
                    entries.iter().map(|e| e.snippet.id.clone()).collect();

                let hits = index.search(&query, &candidates, limit).await.unwrap();

                prop_assert!(hits.len() <= limit);

                let mut seen = BTreeSet::new();
                for hit in &hits {
                    prop_assert!(seen.insert(hit.snippet_id.clone()));
                }

                for pair in hits.windows(2) {
                    prop_assert!(
                        pair[0].similarity > pair[1].similarity
                            || (pair[0].similarity == pair[1].similarity
                                && pair[0].snippet_id < pair[1].snippet_id)
                    );
                }
                Ok(())
            })?;
        }
    }
}
