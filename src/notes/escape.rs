//! Shell quoting for release notes handed to shell-based publish steps.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// How generated notes are escaped before being returned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EscapingMode {
    /// Wrap the notes in single quotes so they form one POSIX shell word.
    Shell,
    /// Return the notes untouched.
    #[default]
    None,
}

/// Quote `text` as a single POSIX shell word.
///
/// Inside single quotes the shell treats every character literally, so the
/// only thing to handle is the single quote itself: close the quote, emit an
/// escaped quote, and reopen (`can't` becomes `'can'\''t'`).
pub fn escape_for_shell(text: &str) -> String {
    if text.is_empty() {
        return "''".to_string();
    }

    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('\'');
    quoted.push_str(&text.replace('\'', r"'\''"));
    quoted.push('\'');
    quoted
}

/// Escape `text` according to `mode`.
pub fn escape_text(text: &str, mode: EscapingMode) -> Cow<'_, str> {
    match mode {
        EscapingMode::Shell => Cow::Owned(escape_for_shell(text)),
        EscapingMode::None => Cow::Borrowed(text),
    }
}
