//! Release-notes pipeline: commits → prompt → Claude → cleaned, escaped notes.
//!
//! [`NotesPipeline::generate`] never fails. Anything that goes wrong after the
//! commits are collected is logged and replaced by [`FALLBACK_NOTES`], so a
//! release job always gets text it can publish.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::claude::{AnswerSource, ClaudeExecutor, extract_final_answer};
use crate::config::NotesConfig;
use crate::error::PipelineError;
use crate::git::{CommitSource, get_commits};
use crate::logger::NotesLogger;
use crate::notes::{EscapingMode, escape_text, extract_release_notes};
use crate::prompt::{
    CommitRecord, DEFAULT_PROMPT_TEMPLATE, RenderContext, render_prompt, repo_name_from_url,
    validate_template,
};

/// Notes returned when generation fails.
pub const FALLBACK_NOTES: &str = "## Release Notes\n\nNo release notes generated due to an error.";

/// Version used when the host does not know the next release version.
const UNKNOWN_VERSION: &str = "unknown";

/// The release being described.
#[derive(Debug, Clone, Default)]
pub struct ReleaseInfo {
    /// Version of the upcoming release.
    pub version: Option<String>,
    /// Repository URL; its last path segment becomes the project name.
    pub repository_url: Option<String>,
}

impl ReleaseInfo {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: Some(version.into()),
            repository_url: None,
        }
    }

    pub fn with_repository_url(mut self, url: impl Into<String>) -> Self {
        self.repository_url = Some(url.into());
        self
    }

    fn version(&self) -> &str {
        self.version.as_deref().unwrap_or(UNKNOWN_VERSION)
    }

    fn repo_name(&self) -> String {
        self.repository_url
            .as_deref()
            .map(repo_name_from_url)
            .unwrap_or_default()
    }
}

/// Stages of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    CommitsFetched,
    PromptBuilt,
    ProcessRunning,
    StreamCollected,
    Parsed,
    Cleaned,
    Escaped,
    Done,
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Idle => "idle",
            PipelineState::CommitsFetched => "commits-fetched",
            PipelineState::PromptBuilt => "prompt-built",
            PipelineState::ProcessRunning => "process-running",
            PipelineState::StreamCollected => "stream-collected",
            PipelineState::Parsed => "parsed",
            PipelineState::Cleaned => "cleaned",
            PipelineState::Escaped => "escaped",
            PipelineState::Done => "done",
            PipelineState::Failed => "failed",
        };
        f.write_str(name)
    }
}

fn enter(state: PipelineState) {
    debug!(%state, "Release notes pipeline state");
}

/// Prompt written to a uniquely named temp file for the CLI to read.
///
/// The file is deleted when the guard is dropped; [`PromptFile::release`]
/// does the same but reports a failed delete.
struct PromptFile {
    file: NamedTempFile,
}

impl PromptFile {
    fn write(prompt: &str) -> Result<Self, PipelineError> {
        let file = tempfile::Builder::new()
            .prefix("claude-prompt-")
            .suffix(".txt")
            .tempfile()
            .map_err(PipelineError::PromptFile)?;
        std::fs::write(file.path(), prompt).map_err(PipelineError::PromptFile)?;
        Ok(Self { file })
    }

    fn path(&self) -> &Path {
        self.file.path()
    }

    fn release(self, logger: &dyn NotesLogger) {
        if let Err(e) = self.file.close() {
            logger.error("Failed to remove temporary prompt file", &e);
        }
    }
}

/// Drives one release-notes generation.
pub struct NotesPipeline<'a, E: ?Sized> {
    config: &'a NotesConfig,
    executor: &'a E,
    logger: &'a dyn NotesLogger,
}

impl<'a, E> NotesPipeline<'a, E>
where
    E: ClaudeExecutor + ?Sized,
{
    pub fn new(config: &'a NotesConfig, executor: &'a E, logger: &'a dyn NotesLogger) -> Self {
        Self {
            config,
            executor,
            logger,
        }
    }

    /// Generate release notes for `release` from the commits in `source`.
    ///
    /// Returns `""` when there are no commits, [`FALLBACK_NOTES`] when
    /// generation fails, and the cleaned, escaped notes otherwise.
    pub async fn generate<S>(&self, source: &S, release: &ReleaseInfo) -> String
    where
        S: CommitSource + ?Sized,
    {
        enter(PipelineState::Idle);
        let commits = get_commits(source, self.config.max_commits, self.logger);

        if commits.is_empty() {
            self.logger.log("No commits found, using empty release notes");
            enter(PipelineState::Done);
            return String::new();
        }
        enter(PipelineState::CommitsFetched);

        let records: Vec<CommitRecord> = commits.iter().map(CommitRecord::from).collect();

        match self.run(&records, release).await {
            Ok(notes) => {
                enter(PipelineState::Done);
                notes
            }
            Err(e) => {
                enter(PipelineState::Failed);
                self.logger
                    .error("Error generating release notes with Claude", &e);
                FALLBACK_NOTES.to_string()
            }
        }
    }

    /// Like [`generate`](Self::generate), but gives up after `limit`.
    ///
    /// Dropping the in-flight run kills the CLI process.
    pub async fn generate_with_timeout<S>(
        &self,
        source: &S,
        release: &ReleaseInfo,
        limit: Duration,
    ) -> Result<String, PipelineError>
    where
        S: CommitSource + ?Sized,
    {
        tokio::time::timeout(limit, self.generate(source, release))
            .await
            .map_err(|_| PipelineError::Timeout(limit.as_secs()))
    }

    async fn run(&self, records: &[CommitRecord], release: &ReleaseInfo) -> Result<String, PipelineError> {
        let version = release.version();
        let prompt = self.build_prompt(records, release)?;
        enter(PipelineState::PromptBuilt);

        self.logger.log("Generating release notes with Claude...");
        let prompt_file = PromptFile::write(&prompt)?;
        enter(PipelineState::ProcessRunning);

        let outcome = self.executor.run(prompt_file.path()).await;
        prompt_file.release(self.logger);
        let capture = outcome?;
        enter(PipelineState::StreamCollected);

        if let Some(failure) = &capture.failure {
            self.logger
                .error("Subprocess execution resulted in an error:", failure);
        }

        let answer = extract_final_answer(&capture.stdout);
        match answer.source {
            AnswerSource::FinalResult { index } => self
                .logger
                .log(&format!("Found final result message at index {index}.")),
            AnswerSource::AssistantMessage { index } => self.logger.log(&format!(
                "Found 'end_turn' assistant message with text content at index {index}."
            )),
            AnswerSource::Fallback => {
                if let Some(failure) = capture.failure {
                    return Err(PipelineError::NoUsableOutput(failure));
                }
                self.logger
                    .log("No valid response found, using fallback message");
            }
        }
        self.logger.log("Successfully generated release notes");
        enter(PipelineState::Parsed);

        let cleaned = if self.config.clean_output {
            self.logger
                .log("Cleaned release notes to remove any AI preamble");
            extract_release_notes(&answer.text, version).trim()
        } else {
            self.logger
                .log("Skipping output cleaning (disabled by configuration)");
            answer.text.trim()
        };
        enter(PipelineState::Cleaned);

        let escaped = escape_text(cleaned, self.config.escaping);
        if self.config.escaping == EscapingMode::Shell {
            self.logger.log("Applied shell escaping to release notes");
        }
        enter(PipelineState::Escaped);

        Ok(escaped.into_owned())
    }

    fn build_prompt(&self, records: &[CommitRecord], release: &ReleaseInfo) -> Result<String, PipelineError> {
        let date = Utc::now().format("%Y-%m-%d").to_string();
        let ctx = RenderContext::new(
            release.version(),
            &date,
            &release.repo_name(),
            records,
            self.config.additional_context.clone(),
        )?;

        let template = match self.config.prompt_template.as_deref() {
            Some(custom) => {
                validate_template(custom, ctx.additional_context.is_some(), self.logger);
                custom
            }
            None => DEFAULT_PROMPT_TEMPLATE,
        };

        Ok(render_prompt(template, &ctx, self.logger))
    }
}
