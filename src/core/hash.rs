//! core::hash
//!
//! Normalized content hashing.
//!
//! # Design
//!
//! Source artifacts are vector documents that get re-encoded by exporters:
//! the same visual content can arrive with different whitespace or embedded
//! comments. The digest is therefore computed over a normalized form so a
//! cosmetic re-encoding never registers as a change, while any structural
//! difference (an attribute, a path segment) still does.
//!
//! Normalization:
//! 1. Strip `<!-- ... -->` comments (unterminated comments are stripped to
//!    end of input rather than erroring — existing content is not trusted)
//! 2. Collapse every run of whitespace to a single space
//! 3. Trim leading/trailing whitespace

use sha2::{Digest, Sha256};

use super::types::ContentHash;

/// Normalize content for hashing.
///
/// # Example
///
/// ```
/// use glyphsync::core::hash::normalize;
///
/// assert_eq!(
///     normalize("<svg>\n  <!-- exported -->  <path d=\"M0 0\"/>\n</svg>"),
///     "<svg> <path d=\"M0 0\"/> </svg>"
/// );
/// ```
pub fn normalize(content: &str) -> String {
    let stripped = strip_comments(content);

    let mut out = String::with_capacity(stripped.len());
    let mut in_whitespace = false;
    for c in stripped.chars() {
        if c.is_whitespace() {
            in_whitespace = true;
            continue;
        }
        if in_whitespace && !out.is_empty() {
            out.push(' ');
        }
        in_whitespace = false;
        out.push(c);
    }
    out
}

/// Compute the normalized digest of content.
pub fn digest(content: &str) -> ContentHash {
    let normalized = normalize(content);
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    ContentHash::from_digest(hex::encode(hasher.finalize()))
}

fn strip_comments(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut rest = content;
    while let Some(start) = rest.find("<!--") {
        out.push_str(&rest[..start]);
        match rest[start + 4..].find("-->") {
            Some(end) => rest = &rest[start + 4 + end + 3..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}
