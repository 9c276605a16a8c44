//! Assembly of typed fragments into a Gutenberg document.
//!
//! Some generation runs return discrete typed fragments instead of a
//! pre-formatted document. This stage wraps each fragment in its block
//! marker pair and concatenates them with blank-line separators, producing
//! the same marker-delimited string the segmenter consumes.

use serde::Deserialize;
use tracing::debug;

/// Phrases that mark an opening paragraph as a greeting or
/// self-introduction. The publishing style bans these outright, so a first
/// Paragraph containing one is dropped. Policy, not sanitization; expected
/// to change over time.
pub const GREETING_PATTERNS: &[&str] = &[
    "안녕하세요",
    "안녕하십니까",
    "반갑습니다",
    "인사드립니다",
    "소개해 드리겠습니다",
];

fn default_heading_level() -> u8 {
    2
}

/// One typed content fragment from the generation response.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Fragment {
    Heading {
        #[serde(default = "default_heading_level")]
        level: u8,
        content: String,
    },
    Paragraph {
        content: String,
    },
    List {
        content: String,
    },
}

impl Fragment {
    fn render(&self) -> String {
        match self {
            Fragment::Heading { level, content } => {
                let level = (*level).clamp(1, 6);
                format!(
                    "<!-- wp:heading {{\"level\":{level}}} -->\n<h{level} class=\"wp-block-heading\">{content}</h{level}>\n<!-- /wp:heading -->"
                )
            }
            Fragment::Paragraph { content } => {
                format!("<!-- wp:paragraph -->\n<p>{content}</p>\n<!-- /wp:paragraph -->")
            }
            Fragment::List { content } => {
                format!(
                    "<!-- wp:list -->\n<ul class=\"wp-block-list\">\n{}\n</ul>\n<!-- /wp:list -->",
                    normalize_list_items(content)
                )
            }
        }
    }
}

/// Wrap list content into `<li>` items unless it already is a bullet list.
fn normalize_list_items(content: &str) -> String {
    if content.contains("<li>") {
        return content.trim().to_string();
    }
    content
        .lines()
        .map(|line| line.trim().trim_start_matches(['-', '*', '•']).trim_start())
        .filter(|line| !line.is_empty())
        .map(|line| format!("<li>{line}</li>"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_greeting(content: &str) -> bool {
    GREETING_PATTERNS.iter().any(|p| content.contains(p))
}

/// Convert an ordered fragment list into a marker-delimited document.
///
/// A leading Paragraph matching the greeting patterns is dropped; all other
/// fragments are kept in input order.
pub fn assemble(fragments: &[Fragment]) -> String {
    let mut rendered = Vec::with_capacity(fragments.len());

    for (i, fragment) in fragments.iter().enumerate() {
        if i == 0 {
            if let Fragment::Paragraph { content } = fragment {
                if is_greeting(content) {
                    debug!("Dropping greeting opener from generated fragments");
                    continue;
                }
            }
        }
        rendered.push(fragment.render());
    }

    rendered.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_paragraph_and_heading() {
        let fragments = vec![
            Fragment::Heading { level: 2, content: "보험료율 인상".to_string() },
            Fragment::Paragraph { content: "2026년부터 보험료율이 오릅니다.".to_string() },
        ];
        let doc = assemble(&fragments);
        assert!(doc.starts_with("<!-- wp:heading {\"level\":2} -->"));
        assert!(doc.contains("<h2 class=\"wp-block-heading\">보험료율 인상</h2>"));
        assert!(doc.contains("<p>2026년부터 보험료율이 오릅니다.</p>"));
        assert!(doc.contains("\n\n<!-- wp:paragraph -->"));
    }

    #[test]
    fn test_assemble_normalizes_plain_lines_into_list() {
        let fragments = vec![Fragment::List {
            content: "- 보험료율 13% 인상\n- 소득대체율 43% 조정\n\n수급 연령 65세".to_string(),
        }];
        let doc = assemble(&fragments);
        assert!(doc.contains("<li>보험료율 13% 인상</li>"));
        assert!(doc.contains("<li>소득대체율 43% 조정</li>"));
        assert!(doc.contains("<li>수급 연령 65세</li>"));
    }

    #[test]
    fn test_assemble_keeps_existing_list_items() {
        let fragments = vec![Fragment::List {
            content: "<li>이미 목록</li>".to_string(),
        }];
        assert!(assemble(&fragments).contains("<ul class=\"wp-block-list\">\n<li>이미 목록</li>\n</ul>"));
    }

    #[test]
    fn test_assemble_drops_greeting_opener() {
        let fragments = vec![
            Fragment::Paragraph { content: "안녕하세요, 연금 전문가입니다.".to_string() },
            Fragment::Paragraph { content: "본론으로 들어가겠습니다.".to_string() },
        ];
        let doc = assemble(&fragments);
        assert!(!doc.contains("안녕하세요"));
        assert!(doc.contains("본론으로"));
    }

    #[test]
    fn test_assemble_keeps_greeting_phrase_past_first_fragment() {
        let fragments = vec![
            Fragment::Paragraph { content: "본론입니다.".to_string() },
            Fragment::Paragraph { content: "창구에서 \"안녕하세요\"라고 인사한 뒤 상담이 시작됩니다.".to_string() },
        ];
        assert!(assemble(&fragments).contains("안녕하세요"));
    }

    #[test]
    fn test_fragment_deserializes_from_model_json() {
        let json = r#"[
            {"type": "heading", "content": "요약"},
            {"type": "paragraph", "content": "내용"},
            {"type": "list", "content": "하나\n둘"}
        ]"#;
        let fragments: Vec<Fragment> = serde_json::from_str(json).unwrap();
        assert_eq!(fragments.len(), 3);
        match &fragments[0] {
            Fragment::Heading { level, .. } => assert_eq!(*level, 2),
            other => panic!("expected heading, got {other:?}"),
        }
    }
}
