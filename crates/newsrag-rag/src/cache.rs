//! Cache identity for persisted indexes.

use std::fmt::{self, Write as _};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

/// File extension of persisted indexes.
pub const INDEX_EXTENSION: &str = "nrix";

/// Identity of one built index: the logical query plus the build timestamp of
/// the dump it was built from.
///
/// Two dumps for the same query never share a key, so an index can only be
/// reused against the dump that produced its chunk list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    query_id: String,
    built_at_ms: i64,
}

impl CacheKey {
    #[must_use]
    pub fn new(query_id: impl Into<String>, built_at_ms: i64) -> Self {
        Self {
            query_id: query_id.into(),
            built_at_ms,
        }
    }

    #[must_use]
    pub fn query_id(&self) -> &str {
        &self.query_id
    }

    #[must_use]
    pub fn built_at_ms(&self) -> i64 {
        self.built_at_ms
    }

    /// Filesystem-safe stem, `{slug}-{hash}_{built_at_ms}`.
    ///
    /// The slug keeps file names readable; `hash` is the first 8 hex digits
    /// of the SHA-256 of the exact query id, so queries that slug alike
    /// still get distinct files.
    #[must_use]
    pub fn file_stem(&self) -> String {
        format!(
            "{}-{}_{}",
            slug(&self.query_id),
            query_hash(&self.query_id),
            self.built_at_ms
        )
    }

    /// Path of the persisted index for this key under `index_dir`.
    #[must_use]
    pub fn index_path(&self, index_dir: &Path) -> PathBuf {
        index_dir.join(format!("{}.{INDEX_EXTENSION}", self.file_stem()))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.query_id, self.built_at_ms)
    }
}

/// Lowercase ASCII-alphanumeric slug with single `-` separators.
///
/// Falls back to `query` when nothing alphanumeric survives.
fn slug(query_id: &str) -> String {
    let slug = query_id
        .to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    if slug.is_empty() {
        "query".to_string()
    } else {
        slug
    }
}

fn query_hash(query_id: &str) -> String {
    let digest = Sha256::digest(query_id.as_bytes());
    digest[..4].iter().fold(String::with_capacity(8), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}
