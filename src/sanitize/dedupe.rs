//! Duplicate detection over fingerprints.
//!
//! The generative model occasionally loops: it repeats an entire block, or
//! repeats one sentence many times across the document. Both failure modes
//! are collapsed here, at two granularities:
//!
//! - [`dedupe`] removes whole Content segments whose fingerprint was already
//!   seen, together with the now-orphaned opening marker in front of them.
//! - [`collapse_units`] walks sentence-sized units inside the surviving text
//!   and keeps only the first occurrence of each fingerprint.
//!
//! A fingerprint is the segment's projected text with everything but
//! letters and digits removed, lowercased, truncated to a fixed prefix. The
//! seen-set is an explicit value threaded through the calls so concurrent
//! documents never share state.

use std::collections::HashSet;

use super::segment::{Segment, SegmentKind};
use once_cell::sync::Lazy;
use regex::Regex;

/// Fingerprints are truncated to this many characters.
pub const FINGERPRINT_PREFIX_CHARS: usize = 60;

/// Content segments whose projection is shorter than this are exempt from
/// block-level dedup. A lone word or bullet marker is not a duplicate.
pub const BLOCK_MIN_CHARS: usize = 16;

/// Sentence units shorter than this are kept unconditionally so short
/// transitional phrases survive the collapse.
pub const SENTENCE_MIN_CHARS: usize = 8;

static INLINE_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Derive the dedup key for a piece of projected text.
///
/// Deterministic and side-effect free: identical input always yields the
/// identical fingerprint.
pub fn fingerprint(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .take(FINGERPRINT_PREFIX_CHARS)
        .collect()
}

/// Remove Content segments whose fingerprint has already been seen.
///
/// When a duplicate is dropped, the immediately preceding output segment is
/// dropped too if it is a Marker, removing the orphaned opening delimiter of
/// the duplicated block. A matching closing marker elsewhere is left in
/// place; callers must not depend on strict marker-pair balance after this
/// pass.
pub fn dedupe(segments: Vec<Segment>) -> Vec<Segment> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out: Vec<Segment> = Vec::with_capacity(segments.len());

    for seg in segments {
        if seg.kind == SegmentKind::Marker {
            out.push(seg);
            continue;
        }

        let fp = fingerprint(&seg.projected_text());
        if fp.chars().count() < BLOCK_MIN_CHARS {
            out.push(seg);
            continue;
        }

        if seen.insert(fp) {
            out.push(seg);
        } else if out.last().map(|s| s.kind) == Some(SegmentKind::Marker) {
            out.pop();
        }
    }

    out
}

/// Collapse repeated sentence units in `text`, threading `seen` so one set
/// can span every Content segment of a document.
///
/// Units are split at sentence-terminal punctuation with the punctuation
/// kept attached. The pass is a single forward walk: a unit survives only
/// if its fingerprint is new, unless it is shorter than
/// [`SENTENCE_MIN_CHARS`].
pub fn collapse_units(text: &str, seen: &mut HashSet<String>) -> String {
    let mut out = String::with_capacity(text.len());

    for unit in split_units(text) {
        let projected = INLINE_TAG_RE.replace_all(unit, "");
        let fp = fingerprint(&projected);
        if fp.chars().count() < SENTENCE_MIN_CHARS || seen.insert(fp) {
            out.push_str(unit);
        }
    }

    out
}

/// Document-wide repetition collapse over flat text with a fresh seen-set.
pub fn collapse_repeats(text: &str) -> String {
    let mut seen = HashSet::new();
    collapse_units(text, &mut seen)
}

fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '…' | '。')
}

/// Split text into sentence-like units, each ending after its run of
/// terminal punctuation. A run only closes a unit when followed by
/// whitespace or end of input, so dots inside URLs and attribute values
/// never split one. The trailing partial unit, if any, is included.
fn split_units(text: &str) -> Vec<&str> {
    let mut units = Vec::new();
    let mut start = 0;
    let mut iter = text.char_indices().peekable();

    while let Some((i, c)) = iter.next() {
        if !is_terminal(c) {
            continue;
        }
        let mut end = i + c.len_utf8();
        while let Some(&(j, c2)) = iter.peek() {
            if !is_terminal(c2) {
                break;
            }
            end = j + c2.len_utf8();
            iter.next();
        }
        let at_boundary = match iter.peek() {
            None => true,
            Some(&(_, next)) => next.is_whitespace(),
        };
        if at_boundary {
            units.push(&text[start..end]);
            start = end;
        }
    }
    if start < text.len() {
        units.push(&text[start..]);
    }

    units
}
