//! The line-level content matcher collaborator (§6): scans a byte buffer
//! for a pattern and reports `(line_number, text, column_range)` hits.
//! An external matcher (e.g. `ripgrep`) could sit behind this same
//! contract; this crate ships only the in-process regex fallback.

use regex::RegexBuilder;

/// One match within one line of a scanned buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineMatch {
    pub line_number: usize,
    pub text: String,
    pub column_start: usize,
    pub column_end: usize,
}

/// Scan `buffer` (assumed to be UTF-8, lossily decoded otherwise) for
/// `pattern`. Falls back to a plain substring search if `pattern` isn't
/// a valid regex, case-folded according to `case_sensitive`.
#[must_use]
pub fn scan_buffer(buffer: &[u8], pattern: &str, case_sensitive: bool) -> Vec<LineMatch> {
    let text = String::from_utf8_lossy(buffer);

    let regex = RegexBuilder::new(pattern).case_insensitive(!case_sensitive).build().ok();

    let mut matches = Vec::new();
    for (line_idx, line) in text.lines().enumerate() {
        if let Some(re) = &regex {
            for m in re.find_iter(line) {
                matches.push(LineMatch {
                    line_number: line_idx + 1,
                    text: line.to_string(),
                    column_start: m.start(),
                    column_end: m.end(),
                });
            }
        } else {
            let (haystack, needle) = if case_sensitive {
                (line.to_string(), pattern.to_string())
            } else {
                (line.to_lowercase(), pattern.to_lowercase())
            };
            if let Some(start) = haystack.find(&needle) {
                matches.push(LineMatch {
                    line_number: line_idx + 1,
                    text: line.to_string(),
                    column_start: start,
                    column_end: start + needle.len(),
                });
            }
        }
    }
    matches
}

/// Whether `pattern` occurs anywhere in `buffer`, case-folded per
/// `case_sensitive`, without building the full per-line match list.
#[must_use]
pub fn contains_pattern(buffer: &[u8], pattern: &str, case_sensitive: bool) -> bool {
    let text = String::from_utf8_lossy(buffer);
    if let Ok(re) = RegexBuilder::new(pattern).case_insensitive(!case_sensitive).build() {
        re.is_match(&text)
    } else if case_sensitive {
        text.contains(pattern)
    } else {
        text.to_lowercase().contains(&pattern.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_case_insensitive_match() {
        let matches = scan_buffer(b"hello\nTODO fix this\nbye", "todo fix", false);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].line_number, 2);
    }

    #[test]
    fn falls_back_to_substring_on_invalid_regex() {
        let matches = scan_buffer(b"a(b line\nother", "a(b", false);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].line_number, 1);
    }

    #[test]
    fn respects_case_sensitivity() {
        assert!(contains_pattern(b"TODO fix", "todo", false));
        assert!(!contains_pattern(b"TODO fix", "todo", true));
    }
}
