//! Raw article dumps: naming, freshness lookup, and NDJSON reading.
//!
//! A dump is `{query}_{epoch_ms}.jsonl`, one [`RawArticle`] per line. The
//! scraper that writes dumps is not part of this crate; [`ArticleSource`] is
//! the seam through which the pipeline asks for a fresh one.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use newsrag_core::RawArticle;

use crate::cache::CacheKey;
use crate::error::RagError;

const DUMP_EXTENSION: &str = "jsonl";

/// Supplies the freshest article dump for a query.
pub trait ArticleSource {
    fn latest_dump(
        &self,
        query_id: &str,
    ) -> impl Future<Output = Result<DumpFile, RagError>> + Send;
}

/// A dump file on disk together with the identity encoded in its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpFile {
    pub query_id: String,
    pub built_at_ms: i64,
    pub path: PathBuf,
}

impl DumpFile {
    /// Parses `{query}_{epoch_ms}.jsonl` out of the final path component.
    ///
    /// The timestamp is taken after the last `_`, so queries may contain
    /// underscores themselves.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidDumpName`] if the name does not follow the
    /// pattern.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self, RagError> {
        let path = path.into();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| RagError::InvalidDumpName(path.display().to_string()))?;

        let invalid = || RagError::InvalidDumpName(name.to_string());

        let stem = name
            .strip_suffix(DUMP_EXTENSION)
            .and_then(|s| s.strip_suffix('.'))
            .ok_or_else(invalid)?;
        let (query_id, timestamp) = stem.rsplit_once('_').ok_or_else(invalid)?;

        if query_id.is_empty()
            || timestamp.is_empty()
            || !timestamp.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }
        let built_at_ms = timestamp.parse::<i64>().map_err(|_| invalid())?;

        Ok(Self {
            query_id: query_id.to_string(),
            built_at_ms,
            path,
        })
    }

    /// Cache identity of indexes built from this dump.
    #[must_use]
    pub fn cache_key(&self) -> CacheKey {
        CacheKey::new(self.query_id.clone(), self.built_at_ms)
    }

    /// Reads every article in the dump. Blank lines are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Io`] if the file cannot be read as UTF-8, or
    /// [`RagError::DumpParse`] for the first line that is not a valid article.
    pub async fn read_articles(&self) -> Result<Vec<RawArticle>, RagError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| RagError::io(&self.path, e))?;
        parse_articles(&content, &self.path)
    }
}

fn parse_articles(content: &str, path: &Path) -> Result<Vec<RawArticle>, RagError> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str::<RawArticle>(line).map_err(|source| RagError::DumpParse {
                path: path.to_path_buf(),
                line: idx + 1,
                source,
            })
        })
        .collect()
}

/// A directory of dumps with a freshness window.
#[derive(Debug, Clone)]
pub struct DumpDirectory {
    dir: PathBuf,
    max_age: Duration,
}

impl DumpDirectory {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, max_age: Duration) -> Self {
        Self {
            dir: dir.into(),
            max_age,
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Finds the newest dump for `query_id` built within the freshness window
    /// ending at `now_ms`.
    ///
    /// The query part of the file name must equal `query_id` exactly. A missing
    /// directory counts as holding no dumps.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::NoFreshDump`] if nothing qualifies, or
    /// [`RagError::Io`] if the directory cannot be listed.
    pub async fn find_fresh(&self, query_id: &str, now_ms: i64) -> Result<DumpFile, RagError> {
        let max_age_ms = i64::try_from(self.max_age.as_millis()).unwrap_or(i64::MAX);
        let cutoff = now_ms.saturating_sub(max_age_ms);

        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(self.no_fresh_dump(query_id));
            }
            Err(e) => return Err(RagError::io(&self.dir, e)),
        };

        let mut newest: Option<DumpFile> = None;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| RagError::io(&self.dir, e))?
        {
            let Ok(dump) = DumpFile::from_path(entry.path()) else {
                continue;
            };
            if dump.query_id != query_id || dump.built_at_ms < cutoff {
                continue;
            }
            if newest
                .as_ref()
                .is_none_or(|current| dump.built_at_ms > current.built_at_ms)
            {
                newest = Some(dump);
            }
        }

        match newest {
            Some(dump) => {
                tracing::debug!(
                    query = query_id,
                    path = %dump.path.display(),
                    built_at_ms = dump.built_at_ms,
                    "found fresh article dump"
                );
                Ok(dump)
            }
            None => Err(self.no_fresh_dump(query_id)),
        }
    }

    fn no_fresh_dump(&self, query_id: &str) -> RagError {
        RagError::NoFreshDump {
            query_id: query_id.to_string(),
            dir: self.dir.clone(),
        }
    }
}

impl ArticleSource for DumpDirectory {
    async fn latest_dump(&self, query_id: &str) -> Result<DumpFile, RagError> {
        self.find_fresh(query_id, chrono::Utc::now().timestamp_millis()).await
    }
}

#[cfg(test)]
#[path = "dump_test.rs"]
mod tests;
