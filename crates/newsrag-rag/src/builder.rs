//! Build-or-load of the per-dump vector index.

use std::path::{Path, PathBuf};

use newsrag_core::RawArticle;

use crate::cache::CacheKey;
use crate::chunker::chunk_by_sentence;
use crate::dump::DumpFile;
use crate::embeddings::Embedder;
use crate::error::RagError;
use crate::index::{chunk_digest, FlatL2Index};
use crate::normalize::normalize_article;

/// Default word budget per chunk.
pub const DEFAULT_MAX_CHUNK_WORDS: usize = 150;

/// An index together with the chunk list it was built from.
///
/// `chunks[i]` is the text of index row `i`.
#[derive(Debug, Clone)]
pub struct CorpusIndex {
    pub key: CacheKey,
    pub index: FlatL2Index,
    pub chunks: Vec<String>,
    /// `true` when the index came from disk instead of a fresh embedding run.
    pub reused: bool,
}

/// Normalizes and chunks every article, flattening in dump order.
#[must_use]
pub fn corpus_chunks(articles: &[RawArticle], max_words: usize) -> Vec<String> {
    articles
        .iter()
        .flat_map(|article| chunk_by_sentence(&normalize_article(&article.text), max_words))
        .collect()
}

/// Owns index construction and persistence for one embedding model.
pub struct IndexBuilder<E> {
    embedder: E,
    index_dir: PathBuf,
    max_chunk_words: usize,
}

impl<E: Embedder> IndexBuilder<E> {
    #[must_use]
    pub fn new(embedder: E, index_dir: impl Into<PathBuf>) -> Self {
        Self {
            embedder,
            index_dir: index_dir.into(),
            max_chunk_words: DEFAULT_MAX_CHUNK_WORDS,
        }
    }

    #[must_use]
    pub fn with_max_chunk_words(mut self, max_chunk_words: usize) -> Self {
        self.max_chunk_words = max_chunk_words.max(1);
        self
    }

    /// The embedder indexes are built with; queries must use the same one.
    #[must_use]
    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    #[must_use]
    pub fn index_dir(&self) -> &Path {
        &self.index_dir
    }

    /// Returns the index and chunk list for `dump`, embedding only when no
    /// matching index is persisted.
    ///
    /// The chunk list is always re-derived from the dump. A persisted index is
    /// reused only if its row count and chunk digest match that list; a
    /// mismatched or unreadable file is rebuilt and overwritten.
    ///
    /// # Errors
    ///
    /// - [`RagError::EmptyCorpus`] if the dump yields no chunks. Nothing is written.
    /// - [`RagError::Io`] / [`RagError::DumpParse`] if the dump cannot be read.
    /// - [`RagError::Embedding`] / [`RagError::DimensionMismatch`] from the embedder.
    pub async fn build_or_load(&self, dump: &DumpFile) -> Result<CorpusIndex, RagError> {
        let key = dump.cache_key();
        let articles = dump.read_articles().await?;
        let chunks = corpus_chunks(&articles, self.max_chunk_words);

        if chunks.is_empty() {
            return Err(RagError::EmptyCorpus {
                key: key.to_string(),
            });
        }

        let path = key.index_path(&self.index_dir);
        match FlatL2Index::load(&path).await {
            Ok(Some(index)) if index.matches_chunks(&chunks) => {
                tracing::info!(
                    key = %key,
                    chunks = chunks.len(),
                    path = %path.display(),
                    "reusing persisted index"
                );
                return Ok(CorpusIndex {
                    key,
                    index,
                    chunks,
                    reused: true,
                });
            }
            Ok(Some(index)) => {
                tracing::warn!(
                    key = %key,
                    persisted = index.len(),
                    derived = chunks.len(),
                    "persisted index does not match chunk list; rebuilding"
                );
            }
            Ok(None) => {
                tracing::debug!(key = %key, "no persisted index");
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "unreadable persisted index; rebuilding");
            }
        }

        let index = self.embed_chunks(&chunks).await?;

        tokio::fs::create_dir_all(&self.index_dir)
            .await
            .map_err(|e| RagError::io(&self.index_dir, e))?;
        index.save(&path).await?;

        tracing::info!(
            key = %key,
            articles = articles.len(),
            chunks = chunks.len(),
            dimension = index.dimension(),
            path = %path.display(),
            "built and persisted index"
        );

        Ok(CorpusIndex {
            key,
            index,
            chunks,
            reused: false,
        })
    }

    async fn embed_chunks(&self, chunks: &[String]) -> Result<FlatL2Index, RagError> {
        let texts: Vec<&str> = chunks.iter().map(String::as_str).collect();
        let vectors = self.embedder.embed(&texts).await?;

        if vectors.len() != chunks.len() {
            return Err(RagError::Embedding(format!(
                "embedder returned {} vectors for {} chunks",
                vectors.len(),
                chunks.len()
            )));
        }

        FlatL2Index::from_vectors(&vectors, chunk_digest(chunks))
    }
}
