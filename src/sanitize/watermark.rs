//! Invisible provenance watermark codec
//!
//! Appends a fixed three-code-point zero-width sequence to sanitized output.
//! The marker survives copy/paste but is invisible under normal rendering,
//! so downstream copies of protected content can be traced without altering
//! what the reader perceives.

/// Zero-width space, non-joiner, joiner.
pub const MARKER: &str = "\u{200B}\u{200C}\u{200D}";

/// Append the traceability marker to non-empty text.
///
/// Empty text passes through unchanged. Embedding is not deduplicating:
/// calling this twice appends two copies, so callers embed at most once
/// per output.
pub fn embed(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let mut out = String::with_capacity(text.len() + MARKER.len());
    out.push_str(text);
    out.push_str(MARKER);
    out
}

/// Check whether the marker sequence occurs anywhere in the text.
///
/// A pure containment check, not a round-trip decode.
pub fn detect(text: &str) -> bool {
    text.contains(MARKER)
}
