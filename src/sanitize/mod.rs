//! Post-generation content sanitization.
//!
//! The generative model returns a Gutenberg block document that is almost,
//! but not quite, publishable: blocks get repeated wholesale, single
//! sentences get repeated across the document, link placeholders come back
//! mangled into fake URLs, and hrefs accumulate duplicated protocol and
//! path fragments. Each stage here is a pure string transformation, run in
//! a fixed order:
//!
//! | Stage | Module | Job |
//! |-------|--------|-----|
//! | 0 | [`strip_markdown_noise`] | drop stray markdown the prompt bans |
//! | 1 | [`segment`] | lex markers vs content |
//! | 2 | [`dedupe`] | drop repeated blocks by fingerprint |
//! | 3 | [`dedupe::collapse_units`] | drop repeated sentences document-wide |
//! | 4 | [`links`] | resolve placeholder tokens to destinations |
//! | 5 | [`repair`] | repair every href, `#` fallback |
//! | 6 | [`assemble`] | typed fragments → marker document (when used) |
//!
//! Nothing here performs I/O or touches shared state; one document in, one
//! sanitized document out.

pub mod assemble;
pub mod dedupe;
pub mod links;
pub mod repair;
pub mod segment;

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

pub use links::{LinkEntry, LinkMapping, LinkOrigin};

use segment::SegmentKind;

static BOLD_NOISE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*").unwrap());

// Line-anchored so fallback hrefs and in-URL fragments keep their `#`.
static HEADING_NOISE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*#{1,6}[ \t]*").unwrap());

/// Remove markdown artifacts the model emits despite being told not to:
/// `**` emphasis pairs and line-leading `#` heading prefixes. Gutenberg
/// comment markers are untouched.
pub fn strip_markdown_noise(text: &str) -> String {
    let text = BOLD_NOISE_RE.replace_all(text, "");
    HEADING_NOISE_RE.replace_all(&text, "").trim().to_string()
}

/// Run the full sanitization pipeline over a generated document.
///
/// Stages run in the fixed order above; the sentence collapser threads one seen-set
/// across every content segment so repetition is removed document-wide
/// without disturbing block markers. An empty input sanitizes to an empty
/// string.
pub fn sanitize_document(doc: &str, mapping: &LinkMapping) -> String {
    let cleaned = strip_markdown_noise(doc);

    let segments = dedupe::dedupe(segment::segment(&cleaned));

    let mut seen = HashSet::new();
    let mut flattened = String::with_capacity(cleaned.len());
    for seg in &segments {
        match seg.kind {
            SegmentKind::Marker => flattened.push_str(&seg.raw),
            SegmentKind::Content => flattened.push_str(&dedupe::collapse_units(&seg.raw, &mut seen)),
        }
    }

    let resolved = links::resolve_links(&flattened, mapping);
    let repaired = repair::repair_anchors(&resolved);

    debug!(
        input_bytes = doc.len(),
        output_bytes = repaired.len(),
        segments = segments.len(),
        links = mapping.len(),
        "Sanitized document"
    );
    repaired
}
