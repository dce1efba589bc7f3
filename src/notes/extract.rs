//! Locating the release notes inside generator output.
//!
//! Models often open with a sentence like "Here are the release notes:" even
//! when told not to. The notes themselves start at a level-2 markdown header,
//! ideally one naming the release version, so everything before that header is
//! dropped. Nothing is ever added: the result is always a suffix of the input.

use std::sync::LazyLock;

use regex_lite::Regex;
use tracing::debug;

/// Any line-anchored level-2 header.
static ANY_H2: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^##\s+").expect("Invalid level-2 header regex"));

/// Return the part of `text` that starts at the release-notes header.
///
/// Prefers a `## <version>` header (the version matched literally, followed by
/// a word boundary), then the first `## ` header of any kind, and otherwise
/// returns `text` unchanged.
pub fn extract_release_notes<'a>(text: &'a str, version: &str) -> &'a str {
    if let Some(start) = find_version_header(text, version) {
        debug!(offset = start, "Found release header for version {}", version);
        return &text[start..];
    }

    if let Some(start) = find_first_h2(text) {
        debug!(offset = start, "Using first level-2 header as release notes start");
        return &text[start..];
    }

    text
}

fn find_version_header(text: &str, version: &str) -> Option<usize> {
    // regex_lite::escape handles backslashes and every metacharacter in one
    // pass, so `1.0.0` cannot match `1a0b0` and `\` cannot break the pattern.
    let pattern = format!(r"(?m)^##\s+{}\b", regex_lite::escape(version));
    match Regex::new(&pattern) {
        Ok(re) => re.find(text).map(|m| m.start()),
        Err(e) => {
            debug!("Could not build version header pattern: {}", e);
            None
        }
    }
}

fn find_first_h2(text: &str) -> Option<usize> {
    ANY_H2.find(text).map(|m| m.start())
}
