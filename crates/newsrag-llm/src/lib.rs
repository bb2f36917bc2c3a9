//! Language-model boundary for the news RAG pipeline.
//!
//! [`LanguageModel`] is the narrow seam the answer assembler depends on: one
//! prompt in, one free-form completion out. [`ChatClient`] implements it
//! against any OpenAI-compatible `/chat/completions` endpoint (Groq by default).

pub mod client;
pub mod error;
pub mod types;

use std::future::Future;

pub use client::ChatClient;
pub use error::LlmError;

/// A text-completion collaborator.
///
/// Implementations return the model's free-form answer to `prompt`. No schema
/// is enforced on the output.
pub trait LanguageModel {
    fn complete(&self, prompt: &str) -> impl Future<Output = Result<String, LlmError>> + Send;
}
