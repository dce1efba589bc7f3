//! Placeholder coverage checks for custom prompt templates.

use crate::logger::NotesLogger;

use super::template::{
    COMMITS_PLACEHOLDER, CONTEXT_OPEN_TAG, DATE_PLACEHOLDER, REPO_NAME_PLACEHOLDER,
    VERSION_PLACEHOLDER,
};

/// What a custom template is missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateDiagnostics {
    /// `{{commits}}` is absent, so the model never sees the changes.
    pub missing_commits: bool,
    /// Optional placeholders that are absent, in template order.
    pub missing_optional: Vec<&'static str>,
    /// Context was supplied but there is no `{{#additionalContext}}` block.
    pub context_without_block: bool,
}

impl TemplateDiagnostics {
    pub fn is_clean(&self) -> bool {
        !self.missing_commits && self.missing_optional.is_empty() && !self.context_without_block
    }
}

/// Check a custom template and log what it lacks. Never fails.
pub fn validate_template(
    template: &str,
    has_additional_context: bool,
    logger: &dyn NotesLogger,
) -> TemplateDiagnostics {
    let mut diagnostics = TemplateDiagnostics::default();

    if !template.contains(COMMITS_PLACEHOLDER) {
        diagnostics.missing_commits = true;
        logger.warn(
            "Custom prompt template is missing {{commits}} placeholder. \
             Commit data will not be included in the prompt.",
        );
    }

    diagnostics.missing_optional = [VERSION_PLACEHOLDER, DATE_PLACEHOLDER, REPO_NAME_PLACEHOLDER]
        .into_iter()
        .filter(|placeholder| !template.contains(*placeholder))
        .collect();

    if !diagnostics.missing_optional.is_empty() {
        logger.log(&format!(
            "Custom prompt template does not use: {}",
            diagnostics.missing_optional.join(", ")
        ));
    }

    if has_additional_context && !template.contains(CONTEXT_OPEN_TAG) {
        diagnostics.context_without_block = true;
        logger.warn(
            "additionalContext is configured but the custom prompt template has no \
             {{#additionalContext}} block. The context will be inserted automatically.",
        );
    }

    diagnostics
}
