//! Command handlers. Results go to stdout, diagnostics to the log.

use newsrag_rag::{AnswerRequest, Intent, RagError};

use crate::Pipeline;

/// Explicit flags win over the intent inferred from the question text.
pub(crate) fn choose_intent(question: &str, freeform: bool, grounded: bool) -> Intent {
    if freeform {
        Intent::Freeform
    } else if grounded {
        Intent::SentimentGrounded
    } else {
        Intent::classify(question)
    }
}

pub(crate) async fn run_index(pipeline: &Pipeline, company: &str) -> anyhow::Result<()> {
    let corpus = pipeline.corpus(company).await?;
    println!(
        "{}: {} chunks, dimension {} ({})",
        corpus.key,
        corpus.chunks.len(),
        corpus.index.dimension(),
        if corpus.reused { "reused" } else { "built" }
    );
    Ok(())
}

pub(crate) async fn run_search(
    pipeline: &Pipeline,
    company: &str,
    query: &str,
    k: usize,
) -> anyhow::Result<()> {
    let result = pipeline.retrieve(company, query, k).await?;
    if result.is_empty() {
        println!("no matching chunks");
    }
    for (rank, hit) in result.hits.iter().enumerate() {
        println!(
            "{:>2}. [chunk {}] distance={:.4}\n    {}",
            rank + 1,
            hit.chunk_index,
            hit.distance,
            hit.text
        );
    }
    Ok(())
}

pub(crate) async fn run_outlook(pipeline: &Pipeline, company: &str) -> anyhow::Result<()> {
    let answer = pipeline
        .answer(company, &AnswerRequest::outlook(company))
        .await?;
    println!("{}\n", answer.text.trim());

    match answer.sentiment_score() {
        Ok(score) => println!("sentiment score: {score:.2}"),
        Err(RagError::MissingScore) => {
            tracing::warn!(company, "model answer has no sentiment score");
            println!("sentiment score: unavailable");
        }
        Err(e) => return Err(e.into()),
    }
    println!("grounded in {} passages", answer.sources.len());
    Ok(())
}

pub(crate) async fn run_ask(
    pipeline: &Pipeline,
    company: &str,
    question: &str,
    intent: Intent,
) -> anyhow::Result<()> {
    let answer = pipeline
        .answer(company, &AnswerRequest::new(intent, question))
        .await?;
    println!("{}", answer.text.trim());
    Ok(())
}
