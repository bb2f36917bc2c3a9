//! Top-k semantic retrieval over a [`CorpusIndex`].

use crate::builder::CorpusIndex;
use crate::embeddings::Embedder;
use crate::error::RagError;
use crate::index::FlatL2Index;

/// A retrieved chunk with its squared L2 distance to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedChunk {
    pub distance: f32,
    pub chunk_index: usize,
    pub text: String,
}

/// Hits in ascending distance order, best match first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrievalResult {
    pub hits: Vec<RetrievedChunk>,
}

impl RetrievalResult {
    #[must_use]
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Chunk texts in rank order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.hits.iter().map(|h| h.text.as_str())
    }
}

/// Embeds `query` and returns the `k` nearest chunks of `corpus`.
///
/// `embedder` must be the one the index was built with. Asking for more hits
/// than the corpus holds returns the whole corpus.
///
/// # Errors
///
/// Returns [`RagError::Embedding`] if the query cannot be embedded, or
/// [`RagError::DimensionMismatch`] if its vector does not fit the index.
pub async fn search<E: Embedder>(
    embedder: &E,
    corpus: &CorpusIndex,
    query: &str,
    k: usize,
) -> Result<RetrievalResult, RagError> {
    if k == 0 {
        return Ok(RetrievalResult::default());
    }

    let query_vector = embedder
        .embed(&[query])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| RagError::Embedding("embedder returned no vector for query".into()))?;

    let result = retrieve(&corpus.index, &corpus.chunks, &query_vector, k)?;
    tracing::debug!(
        key = %corpus.key,
        k,
        hits = result.len(),
        best = result.hits.first().map(|h| h.distance),
        "retrieved chunks"
    );
    Ok(result)
}

/// Searches `index` with an already embedded query and maps rows to `chunks`.
///
/// # Errors
///
/// Returns [`RagError::DimensionMismatch`] for a wrong-sized query, or
/// [`RagError::IndexOutOfSync`] if a row has no chunk.
pub fn retrieve(
    index: &FlatL2Index,
    chunks: &[String],
    query_vector: &[f32],
    k: usize,
) -> Result<RetrievalResult, RagError> {
    let hits = index
        .search(query_vector, k)?
        .into_iter()
        .map(|neighbor| {
            let text = chunks
                .get(neighbor.index)
                .ok_or(RagError::IndexOutOfSync {
                    chunk_index: neighbor.index,
                    chunk_count: chunks.len(),
                })?;
            Ok(RetrievedChunk {
                distance: neighbor.distance,
                chunk_index: neighbor.index,
                text: text.clone(),
            })
        })
        .collect::<Result<Vec<_>, RagError>>()?;

    Ok(RetrievalResult { hits })
}
