//! Embedding boundary and its TEI (Text Embeddings Inference) client.

use std::future::Future;
use std::time::Duration;

use serde::Serialize;

use crate::error::RagError;

/// Default number of texts per /embed call.
pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Turns texts into fixed-dimension vectors.
///
/// Implementations return exactly one vector per input, in input order, and
/// must be deterministic for a fixed model. The same embedder has to be used
/// for building an index and for querying it.
pub trait Embedder {
    fn embed(&self, texts: &[&str]) -> impl Future<Output = Result<Vec<Vec<f32>>, RagError>> + Send;
}

/// TEI HTTP client.
pub struct TeiEmbedder {
    client: reqwest::Client,
    url: String,
    batch_size: usize,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    inputs: &'a [&'a str],
}

impl TeiEmbedder {
    /// Create a client for the TEI server at `tei_url`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Embedding`] if the HTTP client cannot be built.
    pub fn new(tei_url: &str, batch_size: usize, timeout_secs: u64) -> Result<Self, RagError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| RagError::Embedding(format!("failed to build TEI client: {e}")))?;

        Ok(Self {
            client,
            url: format!("{}/embed", tei_url.trim_end_matches('/')),
            batch_size: batch_size.max(1),
        })
    }
}

impl Embedder for TeiEmbedder {
    /// Texts are sent in groups of `batch_size`, one request at a time.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Embedding`] if a request fails, the response cannot
    /// be parsed, or TEI returns a different number of vectors than inputs.
    async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, RagError> {
        let mut all_embeddings = Vec::with_capacity(texts.len());

        for (batch_no, batch) in texts.chunks(self.batch_size).enumerate() {
            let request = EmbedRequest { inputs: batch };
            let response = self
                .client
                .post(&self.url)
                .json(&request)
                .send()
                .await
                .map_err(|e| RagError::Embedding(format!("TEI request failed: {e}")))?;

            if !response.status().is_success() {
                return Err(RagError::Embedding(format!(
                    "TEI returned status {}",
                    response.status()
                )));
            }

            let embeddings: Vec<Vec<f32>> = response
                .json()
                .await
                .map_err(|e| RagError::Embedding(format!("TEI response parse error: {e}")))?;

            if embeddings.len() != batch.len() {
                return Err(RagError::Embedding(format!(
                    "TEI returned {} embeddings for {} inputs",
                    embeddings.len(),
                    batch.len()
                )));
            }

            tracing::debug!(batch = batch_no, size = batch.len(), "embedded batch");
            all_embeddings.extend(embeddings);
        }

        Ok(all_embeddings)
    }
}
