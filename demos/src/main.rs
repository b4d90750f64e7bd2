//! End-to-end walkthrough over the in-memory index with mock providers:
//! seed a small bilingual collection, ask, then refine.

use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use snipkit_core::{AskRequest, RefineRequest, Scope, SnippetDraft};
use snipkit_engine::{AnswerEngine, EngineConfig, InMemoryIndex};
use snipkit_model::MockEmbedding;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

    let engine = AnswerEngine::builder()
        .config(EngineConfig::builder().top_k(4).build()?)
        .index(Arc::new(InMemoryIndex::new()))
        .embedding_provider(Arc::new(MockEmbedding::new()))
        .build()?;

    let refund = engine
        .add_snippet(
            SnippetDraft::new("Refund window is 30 days from the delivery date.")
                .with_title("Refunds")
                .with_group("policies")
                .with_language("en")
                .with_example_questions(["How long do I have to return an item?"]),
        )
        .await?;
    engine
        .add_snippet(
            SnippetDraft::new("Die Rückgabefrist beträgt 30 Tage ab Lieferdatum.")
                .with_title("Rückgaben")
                .with_group("policies")
                .with_language("de")
                .with_linked_snippets([refund.id.clone()]),
        )
        .await?;
    engine
        .add_snippet(
            SnippetDraft::new("Standard shipping takes 3-5 business days.")
                .with_title("Shipping")
                .with_group("logistics")
                .with_language("en"),
        )
        .await?;

    let groups = engine.list_groups().await?;
    info!(?groups, "collection seeded");

    let result = engine
        .ask(
            AskRequest::new("What is the refund policy?")
                .with_scope(Scope::groups(["policies"]))
                .with_languages(["en"]),
        )
        .await?;
    println!("answer: {}", result.answer);
    println!("confidence: {:.2}", result.answer_confidence);
    for source in &result.sources {
        println!(
            "  [{}] {:.2}  {}",
            source.title.as_deref().unwrap_or("-"),
            source.snippet_confidence,
            source.text
        );
    }

    let linked = engine.linked_snippets(&refund.id).await?;
    println!("translations of the top snippet: {}", linked.len());

    let refined = engine
        .refine(RefineRequest {
            original_question: "What is the refund policy?".into(),
            original_answer: result.answer.clone(),
            instruction: "Make it one sentence.".into(),
            selected_source_ids: BTreeSet::new(),
            sources: result.sources.clone(),
            answer_closeness: 0.8,
        })
        .await?;
    println!("refined answer: {}", refined.answer);
    println!("refined confidence: {:.2}", refined.answer_confidence);

    Ok(())
}
