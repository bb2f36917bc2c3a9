//! Retrieval-augmented answering over company news dumps.
//!
//! Reads a newline-delimited JSON article dump, normalizes and chunks each
//! article on sentence boundaries, embeds the chunks via TEI, and keeps an
//! exact L2 index on disk keyed by the dump identity. The [`Assembler`]
//! retrieves the nearest chunks for a question, grounds a language-model
//! prompt in them, and extracts the model's `Score: X` sentiment line.

pub mod assembler;
pub mod builder;
pub mod cache;
pub mod chunker;
pub mod dump;
pub mod embeddings;
pub mod error;
pub mod index;
pub mod normalize;
pub mod retriever;
pub mod score;

pub use assembler::{Answer, AnswerRequest, Assembler, Intent};
pub use builder::{CorpusIndex, IndexBuilder};
pub use cache::CacheKey;
pub use chunker::{chunk_by_sentence, split_sentences};
pub use dump::{ArticleSource, DumpDirectory, DumpFile};
pub use embeddings::{Embedder, TeiEmbedder};
pub use error::RagError;
pub use index::FlatL2Index;
pub use normalize::normalize_article;
pub use retriever::{search, RetrievalResult, RetrievedChunk};
pub use score::extract_score;
