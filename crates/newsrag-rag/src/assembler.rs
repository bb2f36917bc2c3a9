//! Grounded answers: retrieval, prompt assembly, and the model call.

use std::fmt::Write as _;

use newsrag_llm::LanguageModel;

use crate::builder::{CorpusIndex, IndexBuilder};
use crate::dump::ArticleSource;
use crate::embeddings::Embedder;
use crate::error::RagError;
use crate::retriever::{search, RetrievalResult, RetrievedChunk};
use crate::score::extract_score;

/// Question prefix that marks a news-and-outlook request.
pub const OUTLOOK_TEMPLATE: &str = "What are the latest news and outlook for";

/// Default number of chunks placed in a grounded prompt.
pub const DEFAULT_TOP_K: usize = 5;

/// What the caller wants from the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Analyst answer grounded in retrieved news, ending in `Score: X`.
    SentimentGrounded,
    /// The question goes to the model verbatim, without context.
    Freeform,
}

impl Intent {
    /// Infers the intent from free text: outlook-template questions are
    /// grounded, everything else is freeform.
    #[must_use]
    pub fn classify(query: &str) -> Self {
        if query.contains(OUTLOOK_TEMPLATE) {
            Self::SentimentGrounded
        } else {
            Self::Freeform
        }
    }
}

/// A question plus the explicit intent to answer it with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRequest {
    pub intent: Intent,
    pub question: String,
}

impl AnswerRequest {
    #[must_use]
    pub fn new(intent: Intent, question: impl Into<String>) -> Self {
        Self {
            intent,
            question: question.into(),
        }
    }

    /// The canonical outlook question for `company`.
    #[must_use]
    pub fn outlook(company: &str) -> Self {
        Self::new(
            Intent::SentimentGrounded,
            format!("{OUTLOOK_TEMPLATE} {company}?"),
        )
    }

    /// A request whose intent is inferred with [`Intent::classify`].
    #[must_use]
    pub fn classified(question: impl Into<String>) -> Self {
        let question = question.into();
        Self::new(Intent::classify(&question), question)
    }
}

/// The model's answer and the passages it was grounded in.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub intent: Intent,
    pub text: String,
    /// Empty for [`Intent::Freeform`].
    pub sources: Vec<RetrievedChunk>,
}

impl Answer {
    /// The `Score: X` value in the answer.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::MissingScore`] when the model left it out.
    pub fn sentiment_score(&self) -> Result<f32, RagError> {
        extract_score(&self.text)
    }
}

/// Renders the analyst prompt around the retrieved passages.
#[must_use]
pub fn grounded_prompt(company: &str, question: &str, passages: &RetrievalResult) -> String {
    let mut prompt = String::from("You are a professional financial analyst.\n\n");
    let _ = write!(prompt, "Here is the user's question:\n{question}\n\n");
    let _ = writeln!(
        prompt,
        "Below is a collection of news articles related to the company \"{company}\":"
    );
    for (rank, passage) in passages.texts().enumerate() {
        let _ = writeln!(prompt, "[{}] {passage}", rank + 1);
    }
    prompt.push_str(
        "\nPlease answer the question based on the information above in a clear, \
         professional, and well-reasoned manner.\n\
         And give a score between -1 and 1, where -1 means \"strongly negative\" and 1 \
         means \"strongly positive\", in the format \"Score: X\", where X is the score.\n",
    );
    prompt
}

/// Answers company questions with a retrieval-grounded language model.
///
/// All collaborators are injected: `S` locates the article dump, `E` embeds
/// chunks and queries (through the [`IndexBuilder`]), `L` writes the answer.
pub struct Assembler<E, L, S> {
    builder: IndexBuilder<E>,
    llm: L,
    source: S,
    top_k: usize,
}

impl<E, L, S> Assembler<E, L, S>
where
    E: Embedder,
    L: LanguageModel,
    S: ArticleSource,
{
    #[must_use]
    pub fn new(builder: IndexBuilder<E>, llm: L, source: S) -> Self {
        Self {
            builder,
            llm,
            source,
            top_k: DEFAULT_TOP_K,
        }
    }

    #[must_use]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Locates the fresh dump for `query_id` and builds or loads its index.
    ///
    /// # Errors
    ///
    /// Propagates [`ArticleSource`] and [`IndexBuilder::build_or_load`] errors.
    pub async fn corpus(&self, query_id: &str) -> Result<CorpusIndex, RagError> {
        let dump = self.source.latest_dump(query_id).await?;
        self.builder.build_or_load(&dump).await
    }

    /// Top-`k` chunks of `query_id`'s corpus for `query`.
    ///
    /// # Errors
    ///
    /// Propagates corpus and retrieval errors.
    pub async fn retrieve(
        &self,
        query_id: &str,
        query: &str,
        k: usize,
    ) -> Result<RetrievalResult, RagError> {
        let corpus = self.corpus(query_id).await?;
        search(self.builder.embedder(), &corpus, query, k).await
    }

    /// Answers `request` about `query_id`.
    ///
    /// Both intents build or load the company index first. Only
    /// [`Intent::SentimentGrounded`] embeds the question and places the top
    /// chunks in the prompt; [`Intent::Freeform`] sends the question as-is.
    ///
    /// # Errors
    ///
    /// Any dump, index, embedding, or model failure aborts the answer.
    pub async fn answer(
        &self,
        query_id: &str,
        request: &AnswerRequest,
    ) -> Result<Answer, RagError> {
        let corpus = self.corpus(query_id).await?;

        let (prompt, sources) = match request.intent {
            Intent::SentimentGrounded => {
                let passages =
                    search(self.builder.embedder(), &corpus, &request.question, self.top_k)
                        .await?;
                let prompt = grounded_prompt(query_id, &request.question, &passages);
                (prompt, passages.hits)
            }
            Intent::Freeform => (request.question.clone(), Vec::new()),
        };

        tracing::info!(
            query = query_id,
            intent = ?request.intent,
            sources = sources.len(),
            "requesting answer"
        );
        let text = self.llm.complete(&prompt).await?;

        Ok(Answer {
            intent: request.intent,
            text,
            sources,
        })
    }

    /// Answers a plain question, inferring the intent from its wording.
    ///
    /// # Errors
    ///
    /// Same as [`Assembler::answer`].
    pub async fn answer_text(&self, query_id: &str, query: &str) -> Result<String, RagError> {
        let answer = self
            .answer(query_id, &AnswerRequest::classified(query))
            .await?;
        Ok(answer.text)
    }
}
