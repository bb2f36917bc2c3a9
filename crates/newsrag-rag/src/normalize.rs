//! Whitespace cleanup applied to each article body before chunking.

/// Normalizes raw article text.
///
/// Trims the ends, turns literal `\n` escape sequences (a backslash followed
/// by `n`) into line breaks, and collapses runs of spaces and tabs into one
/// space. Real newline characters pass through untouched.
#[must_use]
pub fn normalize_article(raw: &str) -> String {
    let unescaped = raw.trim().replace("\\n", "\n");

    let mut out = String::with_capacity(unescaped.len());
    let mut in_run = false;
    for c in unescaped.chars() {
        if c == ' ' || c == '\t' {
            if !in_run {
                out.push(' ');
                in_run = true;
            }
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_escaped_newline_and_collapses_spaces() {
        assert_eq!(normalize_article("Hello\\nWorld   end"), "Hello\nWorld end");
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(normalize_article("  \t Revenue grew.\n "), "Revenue grew.");
    }

    #[test]
    fn tabs_and_spaces_collapse_together() {
        assert_eq!(normalize_article("a \t\t b\tc"), "a b c");
    }

    #[test]
    fn real_newlines_are_preserved() {
        assert_eq!(normalize_article("line one\n\nline two"), "line one\n\nline two");
    }

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(normalize_article(""), "");
        assert_eq!(normalize_article(" \t "), "");
    }

    #[test]
    fn is_idempotent() {
        let once = normalize_article("  Shares\\nfell   5%\tafter   the call. ");
        assert_eq!(normalize_article(&once), once);
    }
}
