//! Data rendered into the prompt template.

use serde::Serialize;

use crate::error::PipelineError;
use crate::git::SourceCommit;

/// Length of the abbreviated commit hash shown to the model.
const SHORT_HASH_LEN: usize = 7;

/// Commit as presented to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitRecord {
    pub message: String,
    pub hash: String,
    pub date: String,
    pub author: String,
}

impl From<&SourceCommit> for CommitRecord {
    fn from(commit: &SourceCommit) -> Self {
        Self {
            message: commit.message.clone(),
            hash: commit.hash.chars().take(SHORT_HASH_LEN).collect(),
            date: commit.committer_date.clone(),
            author: commit
                .committer_name
                .clone()
                .unwrap_or_else(|| "Unknown".to_string()),
        }
    }
}

/// Values substituted into the prompt template for one run.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub version: String,
    /// Release date as `YYYY-MM-DD`.
    pub date: String,
    pub repo_name: String,
    /// Commit records as pretty-printed JSON.
    pub commits_json: String,
    pub additional_context: Option<serde_json::Value>,
}

impl RenderContext {
    pub fn new(
        version: &str,
        date: &str,
        repo_name: &str,
        commits: &[CommitRecord],
        additional_context: Option<serde_json::Value>,
    ) -> Result<Self, PipelineError> {
        let commits_json =
            serde_json::to_string_pretty(commits).map_err(PipelineError::Serialization)?;

        Ok(Self {
            version: version.to_string(),
            date: date.to_string(),
            repo_name: repo_name.to_string(),
            commits_json,
            additional_context,
        })
    }
}

/// Derive the repository name from its URL.
///
/// Takes the last path segment and drops the first `.git`, so both
/// `https://github.com/acme/widgets.git` and `git@github.com:acme/widgets`
/// give `widgets`.
pub fn repo_name_from_url(url: &str) -> String {
    url.rsplit('/')
        .next()
        .unwrap_or_default()
        .replacen(".git", "", 1)
}
