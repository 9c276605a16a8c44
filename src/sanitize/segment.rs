//! Block segmentation for Gutenberg documents.
//!
//! The generated article arrives as one string in which Gutenberg block
//! comments (`<!-- wp:paragraph -->`, `<!-- /wp:heading -->`, ...) delimit
//! content blocks. Rather than splitting and rejoining around markers ad hoc,
//! this module lexes the document once into a typed stream of [`Segment`]s
//! that the later dedup stages operate on.
//!
//! Concatenating the `raw` fields of the produced segments in order yields
//! the input string byte-for-byte; a document with no markers at all lexes
//! to a single `Content` segment.

use once_cell::sync::Lazy;
use regex::Regex;

/// Matches one Gutenberg block comment, opening or closing, with or without
/// a JSON attribute object (`<!-- wp:heading {"level":2} -->`).
static MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<!--\s*/?wp:[a-z][a-z0-9-]*(?:\s+\{[^}]*\})?\s*/?-->").unwrap()
});

/// Matches an inline HTML tag, used to project segment text for
/// fingerprinting.
static INLINE_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Whether a segment is a structural block marker or inter-marker content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// A Gutenberg block comment delimiter.
    Marker,
    /// Text between markers, possibly carrying inline markup.
    Content,
}

/// One unit of the lexed document.
#[derive(Debug, Clone)]
pub struct Segment {
    pub kind: SegmentKind,
    /// The exact substring of the input, markup included.
    pub raw: String,
}

impl Segment {
    pub fn marker(raw: &str) -> Self {
        Self { kind: SegmentKind::Marker, raw: raw.to_string() }
    }

    pub fn content(raw: &str) -> Self {
        Self { kind: SegmentKind::Content, raw: raw.to_string() }
    }

    /// `raw` with inline markup stripped. Used only for fingerprinting,
    /// never for display.
    pub fn projected_text(&self) -> String {
        INLINE_TAG_RE.replace_all(&self.raw, "").into_owned()
    }
}

/// Lex a document into alternating Marker/Content segments.
///
/// Every marker becomes its own segment; every non-empty run of text
/// between markers becomes a Content segment. Never fails, regardless of
/// how malformed the input markup is.
pub fn segment(doc: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut last = 0;

    for m in MARKER_RE.find_iter(doc) {
        if m.start() > last {
            segments.push(Segment::content(&doc[last..m.start()]));
        }
        segments.push(Segment::marker(m.as_str()));
        last = m.end();
    }
    if last < doc.len() {
        segments.push(Segment::content(&doc[last..]));
    }

    segments
}
