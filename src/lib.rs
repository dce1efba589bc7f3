//! relnotes - Generate shell-safe release notes from git commits with Claude.
//!
//! # Overview
//!
//! relnotes renders a prompt from a release's commits, runs the Claude Code
//! CLI in headless streaming mode, recovers the final answer from its
//! `stream-json` output, strips any preamble before the release-notes header
//! and escapes the result for embedding in a shell command.
//!
//! [`NotesPipeline`] drives one run; the modules below are its stages.

pub mod claude;
pub mod config;
pub mod error;
pub mod git;
pub mod logger;
pub mod notes;
pub mod pipeline;
pub mod prompt;

// Re-export commonly used types
pub use claude::{ClaudeExecutor, CliExecutor, StreamCapture};
pub use config::NotesConfig;
pub use error::{ClaudeError, ConfigError, GitError, PipelineError};
pub use git::{CommitSource, GitCommitSource, SourceCommit};
pub use logger::{NotesLogger, TracingLogger};
pub use notes::EscapingMode;
pub use pipeline::{FALLBACK_NOTES, NotesPipeline, PipelineState, ReleaseInfo};
