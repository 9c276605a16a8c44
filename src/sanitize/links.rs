//! Placeholder-token link resolution.
//!
//! The model is asked to reference curated destinations through opaque
//! placeholder tokens instead of writing URLs itself. It is unreliable
//! about leaving those placeholders alone: a token frequently comes back
//! "completed" into a fake URL (`href="https://example.com/@@wplink:..@@"`).
//! Resolution therefore runs in two phases per token: first every anchor
//! value that merely *ends* with the token is normalized back to the bare
//! token, then the bare form is replaced with the real destination.
//!
//! After this stage no token string survives anywhere in the document.

use rand::{Rng, rng};
use regex::Regex;
use tracing::debug;

/// Where a link candidate came from. Caller bookkeeping only; resolution
/// treats both origins identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOrigin {
    /// One of the blog's own recent posts.
    Internal,
    /// A curated destination from the persisted link store.
    External,
}

/// One token → destination entry.
#[derive(Debug, Clone)]
pub struct LinkEntry {
    pub token: String,
    pub title: String,
    pub destination: String,
    pub origin: LinkOrigin,
}

/// The per-document token table, built once before sanitization and read
/// only afterwards.
#[derive(Debug, Default)]
pub struct LinkMapping {
    entries: Vec<LinkEntry>,
}

impl LinkMapping {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn from_entries(entries: Vec<LinkEntry>) -> Self {
        Self { entries }
    }

    /// Mint a fresh token for `destination` and record the entry.
    pub fn insert(&mut self, title: &str, destination: &str, origin: LinkOrigin) -> &LinkEntry {
        let entry = LinkEntry {
            token: mint_token(),
            title: title.to_string(),
            destination: destination.to_string(),
            origin,
        };
        self.entries.push(entry);
        self.entries.last().unwrap()
    }

    pub fn entries(&self) -> &[LinkEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Random hex suffix keeps tokens out of natural prose.
fn mint_token() -> String {
    format!("@@wplink:{:016x}@@", rng().random::<u64>())
}

/// Replace every placeholder token in `doc` with its mapped destination.
///
/// Per entry, in order:
/// 1. `href="<junk>TOKEN"` is rewritten to `href="TOKEN"`, discarding any
///    scheme/domain/path fragments the model prepended.
/// 2. `href="TOKEN"` is replaced with `href="<destination>"`, exactly once
///    per occurrence, never partially.
/// 3. Any residual bare occurrence (a token the model pasted outside an
///    anchor) is rewritten to the destination so no token survives.
///
/// A token absent from the document is a silent no-op.
pub fn resolve_links(doc: &str, mapping: &LinkMapping) -> String {
    let mut out = doc.to_string();

    for entry in mapping.entries() {
        let escaped = regex::escape(&entry.token);
        // Unwrap is safe: the pattern is built from an escaped literal.
        let prefixed = Regex::new(&format!(r#"href="[^"]*{escaped}""#)).unwrap();
        let bare = format!(r#"href="{}""#, entry.token);

        out = prefixed.replace_all(&out, bare.as_str()).into_owned();
        out = out.replace(&bare, &format!(r#"href="{}""#, entry.destination));

        if out.contains(&entry.token) {
            debug!(token = %entry.token, "Token found outside an anchor; rewriting in place");
            out = out.replace(&entry.token, &entry.destination);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(token: &str, destination: &str) -> LinkMapping {
        LinkMapping::from_entries(vec![LinkEntry {
            token: token.to_string(),
            title: "테스트 링크".to_string(),
            destination: destination.to_string(),
            origin: LinkOrigin::External,
        }])
    }

    #[test]
    fn test_minted_tokens_are_unique_and_opaque() {
        let mut m = LinkMapping::new();
        let a = m.insert("a", "https://a.example", LinkOrigin::Internal).token.clone();
        let b = m.insert("b", "https://b.example", LinkOrigin::External).token.clone();
        assert_ne!(a, b);
        assert!(a.starts_with("@@wplink:"));
        assert_eq!(m.len(), 2);
    }

    #[test]
    fn test_resolve_bare_token() {
        let m = mapping("@@wplink:00c0ffee00c0ffee@@", "https://real.site/page");
        let doc = r#"<a href="@@wplink:00c0ffee00c0ffee@@">지난 글</a>"#;
        assert_eq!(
            resolve_links(doc, &m),
            r#"<a href="https://real.site/page">지난 글</a>"#
        );
    }

    #[test]
    fn test_resolve_prefixed_token() {
        let m = mapping("ABC123TOKEN", "https://real.site/page");
        let doc = r#"<a href="https://example.com/ABC123TOKEN">글</a>"#;
        assert_eq!(
            resolve_links(doc, &m),
            r#"<a href="https://real.site/page">글</a>"#
        );
    }

    #[test]
    fn test_no_residual_tokens() {
        let m = mapping("@@wplink:deadbeefdeadbeef@@", "https://real.site/page");
        let doc = concat!(
            r#"<a href="https://junk/@@wplink:deadbeefdeadbeef@@">a</a>"#,
            " 본문에 흘러나온 @@wplink:deadbeefdeadbeef@@ 도 있습니다."
        );
        let out = resolve_links(doc, &m);
        assert!(!out.contains("@@wplink:deadbeefdeadbeef@@"));
    }

    #[test]
    fn test_exact_substitution_count() {
        let m = mapping("@@wplink:0123456789abcdef@@", "https://real.site/page");
        let doc = r#"<a href="@@wplink:0123456789abcdef@@">1</a> <a href="@@wplink:0123456789abcdef@@">2</a>"#;
        let out = resolve_links(doc, &m);
        assert_eq!(out.matches(r#"href="https://real.site/page""#).count(), 2);
        assert_eq!(out.matches("<a ").count(), 2);
    }

    #[test]
    fn test_absent_token_is_a_no_op() {
        let m = mapping("@@wplink:feedfacefeedface@@", "https://real.site");
        let doc = "<p>링크 없는 문단.</p>";
        assert_eq!(resolve_links(doc, &m), doc);
    }

    #[test]
    fn test_unrelated_hrefs_untouched() {
        let m = mapping("@@wplink:feedfacefeedface@@", "https://real.site");
        let doc = r#"<a href="https://other.example/page">다른 링크</a>"#;
        assert_eq!(resolve_links(doc, &m), doc);
    }
}
