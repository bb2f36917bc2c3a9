//! Sentence-aligned chunking under a word budget.
//!
//! Sentences come from Unicode sentence boundaries (UAX #29), with breaks
//! after common English abbreviations undone. Chunks are built greedily and
//! never split a sentence, so a sentence longer than the budget becomes a
//! chunk of its own.

use unicode_segmentation::UnicodeSegmentation;

/// Titles and company suffixes that UAX #29 treats as sentence ends when a
/// capitalised word follows.
const ABBREVIATIONS: &[&str] = &[
    "Mr.", "Mrs.", "Ms.", "Dr.", "Prof.", "Sr.", "Jr.", "St.", "Inc.", "Corp.", "Co.", "Ltd.",
    "vs.",
];

fn ends_with_abbreviation(piece: &str) -> bool {
    piece
        .split_whitespace()
        .next_back()
        .map(|word| word.trim_start_matches(|c: char| !c.is_alphanumeric()))
        .is_some_and(|word| ABBREVIATIONS.contains(&word))
}

/// Splits `text` into trimmed, non-empty sentences in reading order.
///
/// A boundary right after an abbreviation such as `Mr.` or `Corp.` is not a
/// sentence end; the piece is joined with what follows it. Each returned
/// sentence is a slice of `text`.
#[must_use]
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start: Option<usize> = None;

    for (offset, piece) in text.split_sentence_bound_indices() {
        let begin = *start.get_or_insert(offset);
        let sentence = text[begin..offset + piece.len()].trim();

        if sentence.is_empty() {
            start = None;
        } else if !ends_with_abbreviation(sentence) {
            sentences.push(sentence);
            start = None;
        }
    }

    if let Some(begin) = start {
        let rest = text[begin..].trim();
        if !rest.is_empty() {
            sentences.push(rest);
        }
    }

    sentences
}

/// Groups the sentences of `text` into chunks of at most `max_words` words.
///
/// Sentences inside a chunk are joined with a single space. A chunk exceeds
/// the budget only when it holds exactly one sentence that is itself longer
/// than `max_words`. Empty or whitespace-only input yields no chunks.
#[must_use]
pub fn chunk_by_sentence(text: &str, max_words: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_words = 0usize;

    for sentence in split_sentences(text) {
        let sentence_words = sentence.split_whitespace().count();

        if !current.is_empty() && current_words + sentence_words > max_words {
            chunks.push(current.join(" "));
            current.clear();
            current_words = 0;
        }

        current.push(sentence);
        current_words += sentence_words;
    }

    if !current.is_empty() {
        chunks.push(current.join(" "));
    }

    chunks
}

#[cfg(test)]
#[path = "chunker_test.rs"]
mod tests;
