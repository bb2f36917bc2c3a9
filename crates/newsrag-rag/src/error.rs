use std::path::PathBuf;

use newsrag_llm::LlmError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RagError {
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed article on line {line} of {}: {source}", .path.display())]
    DumpParse {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("dump file name \"{0}\" does not match <query>_<epoch_ms>.jsonl")]
    InvalidDumpName(String),

    #[error("no fresh article dump for \"{query_id}\" in {}", .dir.display())]
    NoFreshDump { query_id: String, dir: PathBuf },

    /// Nothing to embed: an index cannot have zero rows.
    #[error("no chunks to embed for {key}; the dump holds no usable article text")]
    EmptyCorpus { key: String },

    #[error("embedding error: {0}")]
    Embedding(String),

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("corrupt index file: {0}")]
    CorruptIndex(String),

    #[error("index returned chunk {chunk_index} but only {chunk_count} chunks are loaded")]
    IndexOutOfSync {
        chunk_index: usize,
        chunk_count: usize,
    },

    /// The model answer carried no `Score: X` line.
    #[error("no sentiment score found in model response")]
    MissingScore,

    #[error("language model error: {0}")]
    Llm(#[from] LlmError),
}

impl RagError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
