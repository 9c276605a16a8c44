//! Utility functions for logging previews, JSON error classification, and
//! HTML stripping.
//!
//! This module provides helper functions used throughout the application:
//! - String truncation for logging model responses
//! - JSON error detection for handling LLM response truncation
//! - HTML tag stripping for news API snippets

use scraper::Html;

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to `max` characters with an ellipsis and
/// byte count indicator appended.
///
/// # Arguments
///
/// * `s` - The string to potentially truncate
/// * `max` - Maximum number of bytes to keep
///
/// # Returns
///
/// The original string if shorter than `max`, otherwise a truncated version
/// with `"…(+N bytes)"` appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut cut = max;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
    }
}

/// Detect if a serde_json error indicates truncated/incomplete JSON.
///
/// When the LLM response is cut off (e.g., due to token limits), the
/// resulting JSON will fail to parse with an EOF error. This function
/// helps identify such cases for retry logic.
pub fn looks_truncated(e: &serde_json::Error) -> bool {
    use serde_json::error::Category;
    matches!(e.classify(), Category::Eof)
}

/// Strip HTML tags from a snippet, decoding entities along the way.
///
/// The news search API returns titles and descriptions with `<b>` query
/// highlighting and `&quot;`-style entities baked in; both are removed
/// before the text is used as generation context.
pub fn strip_tags(s: &str) -> String {
    let fragment = Html::parse_fragment(s);
    fragment.root_element().text().collect::<String>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_for_log_short_string() {
        let s = "Hello, world!";
        assert_eq!(truncate_for_log(s, 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_respects_char_boundaries() {
        let s = "국민연금".repeat(50);
        let result = truncate_for_log(&s, 10);
        assert!(result.contains("…(+"));
    }

    #[test]
    fn test_looks_truncated() {
        let json_eof = r#"{"field": "value"#; // missing closing brace
        let result: Result<serde_json::Value, _> = serde_json::from_str(json_eof);
        if let Err(e) = result {
            assert!(looks_truncated(&e));
        }
    }

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_tags("<b>국민연금</b> 개혁"), "국민연금 개혁");
        assert_eq!(strip_tags("&quot;연금&quot; 인상"), "\"연금\" 인상");
        assert_eq!(strip_tags("태그 없는 제목"), "태그 없는 제목");
    }
}
