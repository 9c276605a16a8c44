//! Data models for the generation pipeline.
//!
//! This module defines the structures exchanged with the collaborator
//! services:
//! - [`NewsItem`]: a cleaned news search result used as generation context
//! - [`GeneratedPost`]: the model's article response
//! - [`StoredLink`]: a curated destination from the persisted link store
//!
//! The generation response is expected to honor the
//! `{title, content|blocks, excerpt, tags}` schema, but deserialization
//! tolerates violations: everything except the title is optional, and the
//! decision to abort on a missing or short body belongs to the caller, not
//! to the sanitizer.

use std::error::Error;
use std::path::Path;

use serde::Deserialize;
use tokio::fs;
use tracing::instrument;

use crate::sanitize::assemble::{Fragment, assemble};

/// One news search hit, tags already stripped.
#[derive(Debug, Clone)]
pub struct NewsItem {
    pub title: String,
    pub description: String,
}

/// The generative model's article response.
#[derive(Debug, Deserialize)]
pub struct GeneratedPost {
    /// The article title/headline.
    pub title: String,
    /// Pre-formatted Gutenberg document, when the model returned one.
    #[serde(default)]
    pub content: Option<String>,
    /// Typed fragments, when the model returned discrete blocks instead.
    #[serde(default)]
    pub blocks: Option<Vec<Fragment>>,
    /// Short summary used as the post excerpt.
    #[serde(default)]
    pub excerpt: String,
    /// Comma-separated tag names.
    #[serde(default)]
    pub tags: String,
}

impl GeneratedPost {
    /// The raw document body: the pre-formatted content when present,
    /// otherwise the assembled fragment list.
    pub fn body(&self) -> Option<String> {
        match (&self.content, &self.blocks) {
            (Some(content), _) if !content.trim().is_empty() => Some(content.clone()),
            (_, Some(blocks)) if !blocks.is_empty() => Some(assemble(blocks)),
            _ => None,
        }
    }

    /// Tag names split out of the comma-separated field, empties dropped.
    pub fn tag_names(&self) -> Vec<String> {
        self.tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// A curated destination from the persisted link store file.
#[derive(Debug, Clone, Deserialize)]
pub struct StoredLink {
    pub title: String,
    pub url: String,
}

/// Load the persisted link store (a JSON array of `{title, url}` records).
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn load_link_store(path: &Path) -> Result<Vec<StoredLink>, Box<dyn Error>> {
    let raw = fs::read_to_string(path).await?;
    let links: Vec<StoredLink> = serde_json::from_str(&raw)?;
    Ok(links)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_post_deserializes_full_schema() {
        let json = r#"{
            "title": "국민연금 보험료율 인상, 무엇이 달라지나",
            "content": "<!-- wp:paragraph --><p>본문</p><!-- /wp:paragraph -->",
            "excerpt": "보험료율 인상 일정과 체감 영향을 정리했습니다.",
            "tags": "국민연금, 연금개혁, 보험료율"
        }"#;

        let post: GeneratedPost = serde_json::from_str(json).unwrap();
        assert_eq!(post.title, "국민연금 보험료율 인상, 무엇이 달라지나");
        assert!(post.body().unwrap().contains("<p>본문</p>"));
        assert_eq!(post.tag_names(), vec!["국민연금", "연금개혁", "보험료율"]);
    }

    #[test]
    fn test_generated_post_tolerates_missing_fields() {
        let post: GeneratedPost = serde_json::from_str(r#"{"title": "제목만"}"#).unwrap();
        assert!(post.body().is_none());
        assert!(post.tag_names().is_empty());
        assert_eq!(post.excerpt, "");
    }

    #[test]
    fn test_generated_post_assembles_blocks_when_content_missing() {
        let json = r#"{
            "title": "블록 응답",
            "blocks": [
                {"type": "heading", "level": 2, "content": "요약"},
                {"type": "paragraph", "content": "본문 문단입니다."}
            ]
        }"#;

        let post: GeneratedPost = serde_json::from_str(json).unwrap();
        let body = post.body().unwrap();
        assert!(body.contains("<!-- wp:heading {\"level\":2} -->"));
        assert!(body.contains("<p>본문 문단입니다.</p>"));
    }

    #[test]
    fn test_generated_post_prefers_content_over_blocks() {
        let json = r#"{
            "title": "둘 다",
            "content": "<!-- wp:paragraph --><p>본문</p><!-- /wp:paragraph -->",
            "blocks": [{"type": "paragraph", "content": "무시될 블록"}]
        }"#;

        let post: GeneratedPost = serde_json::from_str(json).unwrap();
        assert!(!post.body().unwrap().contains("무시될 블록"));
    }

    #[test]
    fn test_tag_names_trims_and_drops_empties() {
        let post: GeneratedPost =
            serde_json::from_str(r#"{"title": "t", "tags": " 연금 , , 개혁 "}"#).unwrap();
        assert_eq!(post.tag_names(), vec!["연금", "개혁"]);
    }

    #[test]
    fn test_stored_link_deserializes() {
        let links: Vec<StoredLink> = serde_json::from_str(
            r#"[{"title": "가입 안내", "url": "https://www.nps.or.kr/guide"}]"#,
        )
        .unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url, "https://www.nps.or.kr/guide");
    }
}
