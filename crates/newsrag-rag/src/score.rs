//! Extraction of the `Score: X` sentiment line from model output.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::RagError;

static SCORE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\*{0,2}score\*{0,2}\s*:\s*([-+]?\d*\.?\d+)").expect("valid score regex")
});

/// Parses the first `score: <number>` in `text`, case-insensitively.
///
/// Markdown bold around the label (`**Score**: 0.4`, `**Score: 0.4**`) is
/// accepted. The value is returned as written and is not clamped.
///
/// # Errors
///
/// Returns [`RagError::MissingScore`] if no score is present.
pub fn extract_score(text: &str) -> Result<f32, RagError> {
    SCORE_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f32>().ok())
        .ok_or(RagError::MissingScore)
}
