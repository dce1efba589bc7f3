//! Claude CLI spawning.

use std::env;
use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::{debug, error, info, warn};

use crate::error::ClaudeError;

/// Environment variable the Claude CLI reads its API key from.
const API_KEY_ENV_VAR: &str = "ANTHROPIC_API_KEY";

/// Read buffer size for the stdout pipe.
const CHUNK_SIZE: usize = 8 * 1024;

/// Everything the CLI wrote to stdout, plus how the run ended.
///
/// A failed run still carries its partial output: the stream may already
/// contain a usable final message before the process died.
#[derive(Debug, Default)]
pub struct StreamCapture {
    pub stdout: String,
    pub failure: Option<ClaudeError>,
}

impl StreamCapture {
    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }
}

/// Trait for executing the Claude CLI against a prompt file.
///
/// This abstraction allows mocking the Claude subprocess in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClaudeExecutor: Send + Sync {
    /// Run Claude on the prompt stored at `prompt_file`.
    ///
    /// Returns `Err` only when the process could not be started at all.
    async fn run(&self, prompt_file: &Path) -> Result<StreamCapture, ClaudeError>;
}

/// Executor that runs the real Claude Code CLI in headless streaming mode.
#[derive(Debug, Clone)]
pub struct CliExecutor {
    program: String,
}

impl CliExecutor {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait]
impl ClaudeExecutor for CliExecutor {
    /// Spawns `<program> -p --verbose --output-format stream-json @<file>`.
    ///
    /// Stdin is closed and stderr goes straight to ours so the operator sees
    /// CLI diagnostics live. Stdout chunks are appended to the capture in the
    /// order they arrive. The child is killed if this future is dropped.
    async fn run(&self, prompt_file: &Path) -> Result<StreamCapture, ClaudeError> {
        info!("Running Claude Code CLI in headless mode with streaming output");

        let mut child = Command::new(&self.program)
            .arg("-p")
            .arg("--verbose")
            .arg("--output-format")
            .arg("stream-json")
            .arg(format!("@{}", prompt_file.display()))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(ClaudeError::SpawnFailed)?;

        let mut stdout = child.stdout.take().ok_or(ClaudeError::StdoutUnavailable)?;

        let mut buffer = Vec::new();
        let mut chunk = vec![0u8; CHUNK_SIZE];
        let mut failure = None;

        loop {
            match stdout.read(&mut chunk).await {
                Ok(0) => break,
                Ok(n) => {
                    debug!("Claude output: {}", String::from_utf8_lossy(&chunk[..n]));
                    buffer.extend_from_slice(&chunk[..n]);
                }
                Err(e) => {
                    error!("Claude stdout stream error during data collection: {}", e);
                    failure = Some(ClaudeError::StreamRead(e));
                    break;
                }
            }
        }

        // Close our end first so a child still writing gets EPIPE instead of
        // blocking on a full pipe while we wait for it.
        drop(stdout);

        match child.wait().await {
            Ok(status) if status.success() => {}
            Ok(status) => {
                failure.get_or_insert(ClaudeError::NonZeroExit {
                    code: status.code().unwrap_or(-1),
                });
            }
            Err(e) => {
                failure.get_or_insert(ClaudeError::WaitFailed(e));
            }
        }

        // Decode once at the end so multi-byte characters split across
        // chunks survive.
        Ok(StreamCapture {
            stdout: String::from_utf8_lossy(&buffer).into_owned(),
            failure,
        })
    }
}

/// Check if the Claude Code CLI is installed and accessible.
///
/// Uses the `which` crate for cross-platform executable detection, then
/// confirms the binary answers `-v` (or `--version` on builds that reject
/// the short flag). Returns the reported version string.
pub async fn check_claude_installed(program: &str) -> Result<String, ClaudeError> {
    if which::which(program).is_err() {
        return Err(ClaudeError::NotInstalled(program.to_string()));
    }

    let mut spawn_error = None;
    for flag in ["-v", "--version"] {
        match Command::new(program).arg(flag).output().await {
            Ok(output) if output.status.success() => {
                let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
                info!("Verified Claude Code CLI: {}", version);
                return Ok(version);
            }
            Ok(output) => {
                debug!(
                    "'{} {}' exited with {:?}",
                    program,
                    flag,
                    output.status.code()
                );
                spawn_error = None;
            }
            Err(e) => {
                debug!("Could not run '{} {}': {}", program, flag, e);
                spawn_error = Some(e);
            }
        }
    }

    // Only the last attempt decides which error is reported.
    match spawn_error {
        Some(e) => Err(ClaudeError::SpawnFailed(e)),
        None => Err(ClaudeError::NotInstalled(program.to_string())),
    }
}

/// Warn when the API key the CLI needs is not in the environment.
///
/// Returns whether the key is set. The CLI may still authenticate another
/// way, so a missing key is not an error.
pub fn check_api_key() -> bool {
    match env::var(API_KEY_ENV_VAR) {
        Ok(v) if !v.is_empty() => {
            debug!("{} environment variable is set.", API_KEY_ENV_VAR);
            true
        }
        _ => {
            warn!(
                "{} environment variable is not set. Make sure the API key is available when running Claude Code CLI.",
                API_KEY_ENV_VAR
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_api_key_set() {
        temp_env::with_var(API_KEY_ENV_VAR, Some("sk-test"), || {
            assert!(check_api_key());
        });
    }

    #[test]
    fn test_check_api_key_unset_or_empty() {
        temp_env::with_var_unset(API_KEY_ENV_VAR, || {
            assert!(!check_api_key());
        });
        temp_env::with_var(API_KEY_ENV_VAR, Some(""), || {
            assert!(!check_api_key());
        });
    }

    #[tokio::test]
    async fn test_check_installed_missing_program() {
        let result = check_claude_installed("nonexistent_claude_12345").await;
        assert!(matches!(result, Err(ClaudeError::NotInstalled(_))));
    }

    /// `echo` accepts any flag and exits 0, standing in for a working CLI.
    #[tokio::test]
    #[cfg(unix)]
    async fn test_check_installed_reports_version_output() {
        let version = check_claude_installed("echo").await.unwrap();
        assert_eq!(version, "-v");
    }

    /// `false` exists but fails for every flag.
    #[tokio::test]
    #[cfg(unix)]
    async fn test_check_installed_version_failure() {
        let result = check_claude_installed("false").await;
        assert!(matches!(result, Err(ClaudeError::NotInstalled(_))));
    }

    #[tokio::test]
    async fn test_spawn_failure_is_error() {
        let executor = CliExecutor::new("nonexistent_claude_12345");
        let result = executor.run(Path::new("/tmp/prompt.txt")).await;
        assert!(matches!(result, Err(ClaudeError::SpawnFailed(_))));
    }

    /// `echo` prints its arguments, which shows the exact CLI invocation.
    #[tokio::test]
    #[cfg(unix)]
    async fn test_run_passes_streaming_flags_and_prompt_file() {
        let executor = CliExecutor::new("echo");
        let capture = executor.run(Path::new("/tmp/p.txt")).await.unwrap();

        assert!(capture.succeeded());
        assert_eq!(
            capture.stdout,
            "-p --verbose --output-format stream-json @/tmp/p.txt\n"
        );
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn test_run_non_zero_exit_keeps_output() {
        let executor = CliExecutor::new("false");
        let capture = executor.run(Path::new("/tmp/p.txt")).await.unwrap();

        assert!(matches!(
            capture.failure,
            Some(ClaudeError::NonZeroExit { code: 1 })
        ));
        assert!(capture.stdout.is_empty());
    }
}
