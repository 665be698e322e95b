//! Shared tokenizer for the inverted index and the BM25 ranker.
//!
//! Kept in one place and one place only: the index and the ranker must
//! never disagree on what counts as a token, so `githound-index` depends
//! on this module rather than duplicating it.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w+\b").expect("static regex"));

static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
        "from", "as", "is",
    ]
    .into_iter()
    .collect()
});

/// Lowercase, extract word tokens, drop tokens of length ≤2 and stopwords.
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    WORD_RE
        .find_iter(&lower)
        .map(|m| m.as_str().to_string())
        .filter(|t| t.chars().count() > 2 && !STOPWORDS.contains(t.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_short_tokens_and_stopwords() {
        let tokens = tokenize("Fix the bug in a parser for CI");
        assert_eq!(
            tokens,
            vec!["fix".to_string(), "bug".to_string(), "parser".to_string()]
        );
    }

    #[test]
    fn lowercases_and_extracts_word_boundaries() {
        let tokens = tokenize("HTTPClient::connect_timeout");
        assert_eq!(
            tokens,
            vec!["httpclient".to_string(), "connect_timeout".to_string()]
        );
    }

    #[test]
    fn empty_text_yields_no_tokens() {
        assert!(tokenize("").is_empty());
    }
}
