//! Post-processing of generated release notes.

pub mod escape;
pub mod extract;

pub use escape::{EscapingMode, escape_for_shell, escape_text};
pub use extract::extract_release_notes;
