//! Exact (flat) squared-L2 vector index with a compact on-disk format.
//!
//! Layout, all little-endian:
//!
//! | Offset | Size | Field                              |
//! |--------|------|------------------------------------|
//! | 0      | 4    | magic `NRIX`                       |
//! | 4      | 4    | format version (`u32`)             |
//! | 8      | 4    | dimension (`u32`)                  |
//! | 12     | 8    | vector count (`u64`)               |
//! | 20     | 32   | SHA-256 digest of the chunk list   |
//! | 52     | ...  | `count * dimension` `f32`, row-major |

use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::RagError;

const MAGIC: &[u8; 4] = b"NRIX";
const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 4 + 4 + 4 + 8 + 32;

/// SHA-256 over the chunk list, length-prefixed so chunk boundaries count.
#[must_use]
pub fn chunk_digest(chunks: &[String]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for chunk in chunks {
        hasher.update((chunk.len() as u64).to_le_bytes());
        hasher.update(chunk.as_bytes());
    }
    hasher.finalize().into()
}

/// One search hit: squared Euclidean distance and row number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub distance: f32,
    pub index: usize,
}

/// Flat index over equally sized vectors. Row `i` is the vector of chunk `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatL2Index {
    dimension: usize,
    data: Vec<f32>,
    chunk_digest: [u8; 32],
}

impl FlatL2Index {
    /// Builds an index from `vectors`, stamped with the digest of the chunk
    /// list they were computed from.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::DimensionMismatch`] if the vectors differ in length,
    /// [`RagError::Embedding`] for zero-length vectors, and
    /// [`RagError::CorruptIndex`] if `vectors` is empty.
    pub fn from_vectors(vectors: &[Vec<f32>], chunk_digest: [u8; 32]) -> Result<Self, RagError> {
        let Some(first) = vectors.first() else {
            return Err(RagError::CorruptIndex(
                "cannot build an index with zero vectors".into(),
            ));
        };
        let dimension = first.len();
        if dimension == 0 || u32::try_from(dimension).is_err() {
            return Err(RagError::Embedding(format!(
                "unsupported embedding dimension {dimension}"
            )));
        }

        let mut data = Vec::with_capacity(vectors.len() * dimension);
        for vector in vectors {
            if vector.len() != dimension {
                return Err(RagError::DimensionMismatch {
                    expected: dimension,
                    actual: vector.len(),
                });
            }
            data.extend_from_slice(vector);
        }

        Ok(Self {
            dimension,
            data,
            chunk_digest,
        })
    }

    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of stored vectors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len() / self.dimension
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[must_use]
    pub fn chunk_digest(&self) -> &[u8; 32] {
        &self.chunk_digest
    }

    /// Whether this index was built from exactly `chunks`.
    #[must_use]
    pub fn matches_chunks(&self, chunks: &[String]) -> bool {
        self.len() == chunks.len() && self.chunk_digest == chunk_digest(chunks)
    }

    /// Row `i`, if present.
    #[must_use]
    pub fn vector(&self, i: usize) -> Option<&[f32]> {
        self.data.chunks_exact(self.dimension).nth(i)
    }

    /// Exact k-nearest-neighbour search by squared L2 distance.
    ///
    /// Results are ascending by distance, ties broken by lower row number.
    /// Returns at most `min(k, len)` hits.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::DimensionMismatch`] if `query` has the wrong length.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, RagError> {
        if query.len() != self.dimension {
            return Err(RagError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut hits: Vec<Neighbor> = self
            .data
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(index, row)| Neighbor {
                distance: squared_l2(row, query),
                index,
            })
            .collect();

        hits.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.index.cmp(&b.index))
        });
        hits.truncate(k);
        Ok(hits)
    }

    /// Serializes the index into the `.nrix` layout.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.data.len() * 4);
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        // Dimension is checked against u32 at construction.
        let dimension = u32::try_from(self.dimension).unwrap_or(u32::MAX);
        out.extend_from_slice(&dimension.to_le_bytes());
        out.extend_from_slice(&(self.len() as u64).to_le_bytes());
        out.extend_from_slice(&self.chunk_digest);
        for value in &self.data {
            out.extend_from_slice(&value.to_le_bytes());
        }
        out
    }

    /// Parses the `.nrix` layout.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::CorruptIndex`] for a short header, wrong magic,
    /// unsupported version, zero dimension or count, or a payload whose size
    /// disagrees with the header.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RagError> {
        let corrupt = |reason: &str| RagError::CorruptIndex(reason.to_string());

        if bytes.len() < HEADER_LEN {
            return Err(corrupt("file shorter than header"));
        }
        if &bytes[0..4] != MAGIC {
            return Err(corrupt("bad magic"));
        }

        let version = u32::from_le_bytes(le_array(&bytes[4..8]));
        if version != FORMAT_VERSION {
            return Err(RagError::CorruptIndex(format!(
                "unsupported format version {version}"
            )));
        }

        let dimension = u32::from_le_bytes(le_array(&bytes[8..12])) as usize;
        let count = usize::try_from(u64::from_le_bytes(le_array(&bytes[12..20])))
            .map_err(|_| corrupt("vector count overflows usize"))?;
        if dimension == 0 || count == 0 {
            return Err(corrupt("empty index"));
        }

        let mut chunk_digest = [0u8; 32];
        chunk_digest.copy_from_slice(&bytes[20..HEADER_LEN]);

        let expected_payload = count
            .checked_mul(dimension)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| corrupt("payload size overflows usize"))?;
        let payload = &bytes[HEADER_LEN..];
        if payload.len() != expected_payload {
            return Err(RagError::CorruptIndex(format!(
                "payload is {} bytes, header promises {expected_payload}",
                payload.len()
            )));
        }

        let data = payload
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes(le_array(b)))
            .collect();

        Ok(Self {
            dimension,
            data,
            chunk_digest,
        })
    }

    /// Writes the index to `path` atomically (temp file, then rename).
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Io`] if writing or renaming fails.
    pub async fn save(&self, path: &Path) -> Result<(), RagError> {
        let tmp = path.with_extension(format!("nrix.tmp-{}", std::process::id()));
        tokio::fs::write(&tmp, self.to_bytes())
            .await
            .map_err(|e| RagError::io(&tmp, e))?;
        if let Err(e) = tokio::fs::rename(&tmp, path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(RagError::io(path, e));
        }
        Ok(())
    }

    /// Loads the index at `path`; `Ok(None)` if no file exists.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Io`] if the file exists but cannot be read, or
    /// [`RagError::CorruptIndex`] if it does not parse.
    pub async fn load(path: &Path) -> Result<Option<Self>, RagError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Self::from_bytes(&bytes).map(Some).map_err(|e| match e {
                RagError::CorruptIndex(reason) => {
                    RagError::CorruptIndex(format!("{}: {reason}", path.display()))
                }
                other => other,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(RagError::io(path, e)),
        }
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Copies a slice of known length into a fixed array.
fn le_array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    out
}

#[cfg(test)]
#[path = "index_test.rs"]
mod tests;
