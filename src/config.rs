//! Pipeline configuration.
//!
//! Every field is optional in the JSON config file; missing keys fall back to
//! the defaults in [`NotesConfig::default`]. CLI flags are applied on top by
//! the binary.

use std::env;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;
use crate::notes::EscapingMode;

/// Default executable name for the Claude Code CLI.
pub const DEFAULT_EXECUTABLE: &str = "claude";

/// Default cap on commits included in the prompt.
pub const DEFAULT_MAX_COMMITS: usize = 100;

/// Default timeout for a whole pipeline run (5 minutes).
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Environment variable to override the default timeout.
const TIMEOUT_ENV_VAR: &str = "RELNOTES_TIMEOUT";

/// Configuration for a release-notes run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NotesConfig {
    /// Path or name of the Claude Code CLI executable.
    #[serde(alias = "claudePath")]
    pub executable_path: String,

    /// Custom prompt template. `None` selects the built-in template.
    pub prompt_template: Option<String>,

    pub max_commits: usize,

    /// Extra data (PRs, issues, CI metadata) rendered into the prompt.
    pub additional_context: Option<serde_json::Value>,

    /// Strip any preamble before the release-notes header.
    pub clean_output: bool,

    #[serde(alias = "escapingMode")]
    pub escaping: EscapingMode,
}

impl Default for NotesConfig {
    fn default() -> Self {
        Self {
            executable_path: DEFAULT_EXECUTABLE.to_string(),
            prompt_template: None,
            max_commits: DEFAULT_MAX_COMMITS,
            additional_context: None,
            clean_output: true,
            escaping: EscapingMode::Shell,
        }
    }
}

impl NotesConfig {
    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::ParseFailed {
            path: path.display().to_string(),
            source,
        })
    }
}

/// Get the configured pipeline timeout.
///
/// Reads from RELNOTES_TIMEOUT environment variable if set,
/// otherwise uses the default of 300 seconds.
///
/// Logs a warning if the environment variable is set but contains
/// an invalid value (non-numeric, empty, or negative).
pub fn get_timeout() -> Duration {
    match env::var(TIMEOUT_ENV_VAR) {
        Ok(v) if !v.is_empty() => match v.parse::<u64>() {
            Ok(secs) => Duration::from_secs(secs),
            Err(_) => {
                warn!(
                    "Invalid {} value '{}', using default {}s",
                    TIMEOUT_ENV_VAR, v, DEFAULT_TIMEOUT_SECS
                );
                Duration::from_secs(DEFAULT_TIMEOUT_SECS)
            }
        },
        _ => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = NotesConfig::default();
        assert_eq!(config.executable_path, "claude");
        assert_eq!(config.max_commits, 100);
        assert!(config.prompt_template.is_none());
        assert!(config.additional_context.is_none());
        assert!(config.clean_output);
        assert_eq!(config.escaping, EscapingMode::Shell);
    }

    #[test]
    fn test_empty_json_uses_defaults() {
        let config: NotesConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, NotesConfig::default());
    }

    #[test]
    fn test_camel_case_keys_and_aliases() {
        let json = r#"{
            "claudePath": "/opt/bin/claude",
            "maxCommits": 5,
            "cleanOutput": false,
            "escapingMode": "none",
            "additionalContext": {"prs": [12, 14]}
        }"#;
        let config: NotesConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.executable_path, "/opt/bin/claude");
        assert_eq!(config.max_commits, 5);
        assert!(!config.clean_output);
        assert_eq!(config.escaping, EscapingMode::None);
        assert_eq!(config.additional_context.unwrap()["prs"][1], 14);
    }

    #[test]
    fn test_unknown_escaping_mode_is_rejected() {
        let result = serde_json::from_str::<NotesConfig>(r#"{"escaping": "powershell"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relnotes.json");
        std::fs::write(&path, r#"{"executablePath": "claude-dev"}"#).unwrap();

        let config = NotesConfig::load(&path).unwrap();
        assert_eq!(config.executable_path, "claude-dev");
        assert_eq!(config.max_commits, DEFAULT_MAX_COMMITS);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = NotesConfig::load(Path::new("/nonexistent/relnotes.json"));
        assert!(matches!(result, Err(ConfigError::ReadFailed { .. })));
    }

    #[test]
    fn test_load_invalid_json_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relnotes.json");
        std::fs::write(&path, "maxCommits = 3").unwrap();

        let result = NotesConfig::load(&path);
        assert!(matches!(result, Err(ConfigError::ParseFailed { .. })));
    }

    #[test]
    fn test_get_timeout_default() {
        temp_env::with_var_unset(TIMEOUT_ENV_VAR, || {
            assert_eq!(get_timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        });
    }

    #[test]
    fn test_get_timeout_from_env() {
        temp_env::with_var(TIMEOUT_ENV_VAR, Some("60"), || {
            assert_eq!(get_timeout(), Duration::from_secs(60));
        });
    }

    #[test]
    fn test_get_timeout_invalid_env_uses_default() {
        temp_env::with_var(TIMEOUT_ENV_VAR, Some("-5"), || {
            assert_eq!(get_timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        });
    }

    #[test]
    fn test_get_timeout_empty_env_uses_default() {
        temp_env::with_var(TIMEOUT_ENV_VAR, Some(""), || {
            assert_eq!(get_timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        });
    }
}
