//! Defensive URL repair for anchor attributes.
//!
//! Model-authored hrefs arrive with a recognizable family of defects:
//! a second copy of the protocol or domain glued in front of the real URL,
//! the site's own authority repeated as a path segment, stray TLD fragments
//! from botched string concatenation, doubled separators. [`repair_url`]
//! normalizes each value into a single well-formed absolute URL, or the
//! non-navigating fallback `#` when nothing recoverable remains. It is pure
//! and total: no input makes it fail or return an empty string.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use url::Url;

/// Safe, structurally valid href substituted when no URL can be recovered.
pub const FALLBACK_HREF: &str = "#";

/// Path segments that are artifacts of malformed concatenation when they
/// appear on their own, with no accompanying authority.
const STRAY_TLD_SUFFIXES: &[&str] = &["com", "net", "org", "co", "kr", "www"];

static SCHEME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://").unwrap());

static HREF_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"href="([^"]*)""#).unwrap());

/// Repair a single raw href value.
///
/// The rightmost `scheme://` candidate in `raw` is taken as the intended
/// destination, since model-prepended junk accumulates in front of the
/// genuine URL. The surviving URL is reassembled from its parsed parts with
/// self-referential and stray-TLD path segments removed, consecutive
/// duplicate segments collapsed, and the trailing separator stripped.
pub fn repair_url(raw: &str) -> String {
    let Some(candidate) = last_absolute_candidate(raw) else {
        return FALLBACK_HREF.to_string();
    };

    let parsed = match Url::parse(candidate) {
        Ok(u) => u,
        Err(_) => return FALLBACK_HREF.to_string(),
    };
    let Some(host) = parsed.host_str() else {
        return FALLBACK_HREF.to_string();
    };

    let mut segments: Vec<&str> = parsed.path().split('/').filter(|s| !s.is_empty()).collect();
    segments.retain(|s| !s.eq_ignore_ascii_case(host));
    segments.retain(|s| !STRAY_TLD_SUFFIXES.contains(&s.to_ascii_lowercase().as_str()));
    segments.dedup();

    let mut out = match parsed.port() {
        Some(port) => format!("{}://{}:{}", parsed.scheme(), host, port),
        None => format!("{}://{}", parsed.scheme(), host),
    };
    if !segments.is_empty() {
        out.push('/');
        out.push_str(&segments.join("/"));
    }
    if let Some(query) = parsed.query() {
        out.push('?');
        out.push_str(query);
    }
    if let Some(fragment) = parsed.fragment() {
        out.push('#');
        out.push_str(fragment);
    }

    out
}

/// Run [`repair_url`] over every `href="..."` attribute value in `doc`.
pub fn repair_anchors(doc: &str) -> String {
    HREF_RE
        .replace_all(doc, |caps: &Captures| format!(r#"href="{}""#, repair_url(&caps[1])))
        .into_owned()
}

/// The substring starting at the last `scheme://` occurrence, cut at the
/// first character that cannot appear in a URL.
fn last_absolute_candidate(raw: &str) -> Option<&str> {
    let start = SCHEME_RE.find_iter(raw).last()?.start();
    let rest = &raw[start..];
    let end = rest
        .find(|c: char| c.is_whitespace() || matches!(c, '"' | '\'' | '<' | '>'))
        .unwrap_or(rest.len());
    Some(&rest[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicated_protocol() {
        assert_eq!(repair_url("https://a.com/https://a.com/page"), "https://a.com/page");
    }

    #[test]
    fn test_self_referential_path() {
        assert_eq!(repair_url("https://a.com/blog/a.com/blog"), "https://a.com/blog");
    }

    #[test]
    fn test_unfixable_input_falls_back() {
        assert_eq!(repair_url("not a url at all"), "#");
        assert_eq!(repair_url(""), "#");
        assert_eq!(repair_url("#"), "#");
        assert_eq!(repair_url("https://"), "#");
    }

    #[test]
    fn test_well_formed_url_passes_through() {
        assert_eq!(
            repair_url("https://www.nps.or.kr/jsppage/info/easy/easy_01_01.jsp"),
            "https://www.nps.or.kr/jsppage/info/easy/easy_01_01.jsp"
        );
    }

    #[test]
    fn test_query_and_fragment_preserved() {
        assert_eq!(
            repair_url("https://a.com/search?q=연금#results"),
            "https://a.com/search?q=%EC%97%B0%EA%B8%88#results"
        );
    }

    #[test]
    fn test_consecutive_separators_collapsed() {
        assert_eq!(repair_url("https://a.com//blog///post"), "https://a.com/blog/post");
    }

    #[test]
    fn test_trailing_separator_stripped() {
        assert_eq!(repair_url("https://a.com/blog/"), "https://a.com/blog");
    }

    #[test]
    fn test_stray_tld_segment_removed() {
        assert_eq!(repair_url("https://a.com/com/page"), "https://a.com/page");
    }

    #[test]
    fn test_repair_is_idempotent() {
        for raw in [
            "https://a.com/https://a.com/page",
            "https://a.com/blog/a.com/blog",
            "not a url at all",
            "https://a.com//blog///post?x=1",
            "https://a.com",
        ] {
            let once = repair_url(raw);
            assert_eq!(repair_url(&once), once, "not idempotent for {raw:?}");
        }
    }

    #[test]
    fn test_repair_anchors_rewrites_every_href() {
        let doc = concat!(
            r#"<a href="https://a.com/https://a.com/page">중복</a> "#,
            r#"<a href="깨진 값">불량</a>"#
        );
        let out = repair_anchors(doc);
        assert_eq!(
            out,
            concat!(
                r#"<a href="https://a.com/page">중복</a> "#,
                r##"<a href="#">불량</a>"##
            )
        );
    }
}
