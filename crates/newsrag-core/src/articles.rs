use serde::{Deserialize, Serialize};

/// One line of a raw article dump.
///
/// Only `text` feeds the retrieval pipeline; the remaining fields are carried
/// so dumps written by the scraper deserialize without loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawArticle {
    pub text: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    /// ISO-8601 as written by the scraper; may lack a UTC offset.
    pub publish_date: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
}
