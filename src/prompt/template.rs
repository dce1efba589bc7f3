//! Prompt template rendering.
//!
//! Templates are plain text with `{{placeholder}}` tokens. They are never
//! parsed into a tree: substitution is textual and the conditional
//! `{{#additionalContext}}` block is handled with explicit index searches, so
//! rendering stays linear in the template size whatever the input looks like.

use crate::logger::NotesLogger;

use super::context::RenderContext;

pub const VERSION_PLACEHOLDER: &str = "{{version}}";
pub const DATE_PLACEHOLDER: &str = "{{date}}";
pub const REPO_NAME_PLACEHOLDER: &str = "{{repoName}}";
pub const COMMITS_PLACEHOLDER: &str = "{{commits}}";
pub const CONTEXT_OPEN_TAG: &str = "{{#additionalContext}}";
pub const CONTEXT_CLOSE_TAG: &str = "{{/additionalContext}}";

/// Marker in front of the instructions section of most templates.
const INSTRUCTIONS_MARKER: &str = "IMPORTANT:";

const CODE_FENCE: &str = "```";

/// Built-in prompt used when no custom template is configured.
pub const DEFAULT_PROMPT_TEMPLATE: &str = r#"
Generate release notes for version {{version}} (released on {{date}}) of the {{repoName}} project.

Here are the commits that were included in this release:

```json
{{commits}}
```

IMPORTANT: Your response must contain ONLY the release notes in Markdown format, with no additional text, commentary, or explanations about your process.

The release notes should:

1. Group changes by type (features, improvements, bug fixes, etc.)
2. Translate technical commit messages into user-friendly descriptions
3. Highlight important changes that users should be aware of
4. Be concise but informative
5. Use Markdown formatting

Focus on explaining what's new or changed from an end-user perspective, rather than implementation details. Omit commits that are purely technical (e.g., "fix typo", "merge branch", etc.) unless they fix important user-facing issues.

Format the notes with a clean structure using Markdown, starting with a brief summary of the release. Do not include any introductory statements like "here are the release notes" or explanations of your process.

AGAIN: Your response must only contain the final release notes in Markdown format - nothing else.
"#;

/// Render `template` with the values in `ctx`.
///
/// Each of `{{version}}`, `{{date}}`, `{{repoName}}` and `{{commits}}` is
/// replaced at its first occurrence only; later repeats stay as raw tokens.
pub fn render_prompt(template: &str, ctx: &RenderContext, logger: &dyn NotesLogger) -> String {
    let prompt = template
        .replacen(VERSION_PLACEHOLDER, &ctx.version, 1)
        .replacen(DATE_PLACEHOLDER, &ctx.date, 1)
        .replacen(REPO_NAME_PLACEHOLDER, &ctx.repo_name, 1);

    // Remember where the commits JSON lands so the fence that closes the
    // commits block can be found without scanning the JSON itself, which may
    // contain backticks from commit messages.
    let commits_end = prompt
        .find(COMMITS_PLACEHOLDER)
        .map(|pos| pos + ctx.commits_json.len());
    let prompt = prompt.replacen(COMMITS_PLACEHOLDER, &ctx.commits_json, 1);

    match &ctx.additional_context {
        Some(context) => {
            let context_json = serde_json::to_string_pretty(context).unwrap_or_default();
            if prompt.contains(CONTEXT_OPEN_TAG) {
                replace_context_block(&prompt, &context_json)
            } else {
                inject_context(prompt, &context_json, commits_end, logger)
            }
        }
        None => strip_context_blocks(&prompt),
    }
}

/// Replace the first `{{#additionalContext}}…{{/additionalContext}}` span with
/// the rendered context. Leaves `prompt` unchanged when the span is unclosed.
fn replace_context_block(prompt: &str, context_json: &str) -> String {
    let Some(start) = prompt.find(CONTEXT_OPEN_TAG) else {
        return prompt.to_string();
    };
    let Some(close) = prompt[start..].find(CONTEXT_CLOSE_TAG) else {
        return prompt.to_string();
    };
    let end = start + close + CONTEXT_CLOSE_TAG.len();

    format!(
        "{}Additional context information:\n\n```json\n{}\n```{}",
        &prompt[..start],
        context_json,
        &prompt[end..]
    )
}

/// Place the context in a template that has no conditional block.
///
/// Tries after the fence closing the commits block, then before the
/// instructions marker, then the end of the prompt.
fn inject_context(
    mut prompt: String,
    context_json: &str,
    commits_end: Option<usize>,
    logger: &dyn NotesLogger,
) -> String {
    logger.log("Custom template without additionalContext placeholder, appending context");

    let block = format!("\nAdditional context information:\n\n```json\n{context_json}\n```\n");

    if let Some(end) = commits_end {
        if let Some(fence) = prompt[end..].find(CODE_FENCE) {
            let insert_at = end + fence + CODE_FENCE.len();
            prompt.insert_str(insert_at, &block);
            return prompt;
        }
        logger.log("Could not find the end of the commits block.");
    }

    if let Some(pos) = prompt.find(INSTRUCTIONS_MARKER) {
        logger.log("Using fallback placement: Adding additional context before instructions.");
        prompt.insert_str(pos, &block);
        return prompt;
    }

    logger.log(
        "Could not find suitable location for additional context. Appending to the end of the prompt.",
    );
    prompt.push_str(&block);
    prompt
}

/// Remove every closed `{{#additionalContext}}…{{/additionalContext}}` region.
///
/// Scans left to right without overlap. An opening tag with no closing tag is
/// kept along with everything after it.
fn strip_context_blocks(prompt: &str) -> String {
    let mut result = String::with_capacity(prompt.len());
    let mut pos = 0;

    while let Some(offset) = prompt[pos..].find(CONTEXT_OPEN_TAG) {
        let start = pos + offset;
        result.push_str(&prompt[pos..start]);

        let after_open = start + CONTEXT_OPEN_TAG.len();
        match prompt[after_open..].find(CONTEXT_CLOSE_TAG) {
            Some(close) => pos = after_open + close + CONTEXT_CLOSE_TAG.len(),
            None => {
                pos = start;
                break;
            }
        }
    }

    result.push_str(&prompt[pos..]);
    result
}
