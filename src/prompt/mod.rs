//! Prompt construction for Claude.

pub mod context;
pub mod template;
pub mod validate;

pub use context::{CommitRecord, RenderContext, repo_name_from_url};
pub use template::{DEFAULT_PROMPT_TEMPLATE, render_prompt};
pub use validate::{TemplateDiagnostics, validate_template};
