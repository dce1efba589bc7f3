//! Commit fetching and the commit-source seam used by the pipeline.

use chrono::{SecondsFormat, TimeZone, Utc};
use git2::{Commit, Oid, Repository};
use serde::{Deserialize, Serialize};

use super::range::ReleaseRange;
use crate::error::GitError;
use crate::logger::NotesLogger;

/// A commit as provided by the host, before it is trimmed for the prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCommit {
    /// Full commit id.
    pub hash: String,
    pub message: String,
    pub committer_name: Option<String>,
    /// Committer timestamp, RFC 3339.
    pub committer_date: String,
}

impl SourceCommit {
    /// Create a SourceCommit from a git2 Commit.
    pub fn from_git2_commit(commit: &Commit) -> Result<Self, GitError> {
        let hash = commit.id().to_string();
        let seconds = commit.committer().when().seconds();
        let timestamp = Utc
            .timestamp_opt(seconds, 0)
            .single()
            .ok_or_else(|| GitError::InvalidTimestamp {
                hash: hash.clone(),
                seconds,
            })?;

        Ok(Self {
            hash,
            message: commit.message().unwrap_or("").to_string(),
            committer_name: commit.committer().name().map(str::to_string),
            committer_date: timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
        })
    }
}

/// Ordered list of commits going into a release, newest first.
pub trait CommitSource: Send + Sync {
    fn commits(&self) -> &[SourceCommit];
}

impl CommitSource for Vec<SourceCommit> {
    fn commits(&self) -> &[SourceCommit] {
        self
    }
}

impl CommitSource for [SourceCommit] {
    fn commits(&self) -> &[SourceCommit] {
        self
    }
}

/// Commits loaded from a git repository range.
#[derive(Debug, Clone, Default)]
pub struct GitCommitSource {
    commits: Vec<SourceCommit>,
}

impl GitCommitSource {
    /// Load the commits in `range`.
    pub fn load(repo: &Repository, range: &ReleaseRange) -> Result<Self, GitError> {
        Ok(Self {
            commits: fetch_commits(repo, range.since, range.until)?,
        })
    }
}

impl CommitSource for GitCommitSource {
    fn commits(&self) -> &[SourceCommit] {
        &self.commits
    }
}

/// Take at most `max_commits` commits from `source`.
pub fn get_commits<'a, S>(
    source: &'a S,
    max_commits: usize,
    logger: &dyn NotesLogger,
) -> &'a [SourceCommit]
where
    S: CommitSource + ?Sized,
{
    let commits = source.commits();
    if commits.is_empty() {
        logger.log("No commits found");
        return commits;
    }

    let limited = &commits[..commits.len().min(max_commits)];
    logger.log(&format!("Found {} commits", limited.len()));
    limited
}

/// Fetch the commits reachable from `until` but not from `since`, newest
/// first. With no `since`, the walk runs to the root commit inclusive.
pub fn fetch_commits(
    repo: &Repository,
    since: Option<Oid>,
    until: Oid,
) -> Result<Vec<SourceCommit>, GitError> {
    let mut revwalk = repo.revwalk().map_err(GitError::RevwalkError)?;

    revwalk.push(until).map_err(GitError::RevwalkError)?;
    if let Some(since) = since {
        revwalk.hide(since).map_err(GitError::RevwalkError)?;
    }

    let mut commits = Vec::new();

    for oid_result in revwalk {
        let oid = oid_result.map_err(GitError::RevwalkError)?;
        let commit = repo.find_commit(oid).map_err(GitError::ParseCommit)?;
        commits.push(SourceCommit::from_git2_commit(&commit)?);
    }

    Ok(commits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::TracingLogger;

    fn commit(n: usize) -> SourceCommit {
        SourceCommit {
            hash: format!("{:040x}", n),
            message: format!("fix: change {}", n),
            committer_name: Some("Dev".to_string()),
            committer_date: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_get_commits_bounds_the_slice() {
        let source: Vec<_> = (0..5).map(commit).collect();
        let limited = get_commits(&source, 3, &TracingLogger);
        assert_eq!(limited.len(), 3);
        assert_eq!(limited[0], source[0]);
    }

    #[test]
    fn test_get_commits_under_limit_returns_all() {
        let source: Vec<_> = (0..2).map(commit).collect();
        assert_eq!(get_commits(&source, 100, &TracingLogger).len(), 2);
    }

    #[test]
    fn test_get_commits_empty_source() {
        let source: Vec<SourceCommit> = Vec::new();
        assert!(get_commits(&source, 100, &TracingLogger).is_empty());
    }

    #[test]
    fn test_get_commits_zero_limit() {
        let source: Vec<_> = (0..2).map(commit).collect();
        assert!(get_commits(&source, 0, &TracingLogger).is_empty());
    }
}
