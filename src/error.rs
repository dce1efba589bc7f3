//! Error types for relnotes modules using thiserror.

use thiserror::Error;

/// Errors from git operations.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Failed to open repository: {0}")]
    OpenRepository(#[source] git2::Error),

    #[error("Failed to find reference '{0}': {1}")]
    ReferenceNotFound(String, #[source] git2::Error),

    #[error("Failed to parse commit: {0}")]
    ParseCommit(#[source] git2::Error),

    #[error("Failed to walk commit history: {0}")]
    RevwalkError(#[source] git2::Error),

    #[error("Commit {hash} has invalid timestamp (seconds={seconds})")]
    InvalidTimestamp { hash: String, seconds: i64 },
}

/// Errors from Claude CLI operations.
#[derive(Error, Debug)]
pub enum ClaudeError {
    #[error("Claude Code CLI not found at '{0}'. Install with: npm install -g @anthropic-ai/claude-code")]
    NotInstalled(String),

    #[error("Failed to spawn Claude process: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("Claude process did not expose a stdout pipe")]
    StdoutUnavailable,

    #[error("Failed to read Claude output stream: {0}")]
    StreamRead(#[source] std::io::Error),

    #[error("Failed to wait for Claude process: {0}")]
    WaitFailed(#[source] std::io::Error),

    #[error("Claude CLI exited with code {code}")]
    NonZeroExit { code: i32 },
}

/// Errors from loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ParseFailed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors that move the notes pipeline into its failed state.
///
/// These never reach callers of `NotesPipeline::generate`; they are logged and
/// replaced by the fallback notes. Only the timeout wrapper surfaces one.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to serialize commit data: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error("Failed to create prompt file: {0}")]
    PromptFile(#[source] std::io::Error),

    #[error(transparent)]
    Claude(#[from] ClaudeError),

    #[error("Claude produced no usable output after failing: {0}")]
    NoUsableOutput(#[source] ClaudeError),

    #[error("Release notes generation timed out after {0} seconds")]
    Timeout(u64),
}
