//! Which commits belong to the release being described.
//!
//! A release covers everything reachable from `until` that is not reachable
//! from `since`. Without an explicit start, `since` is the newest stable
//! release tag reachable from `until`; a repository that has never been
//! released has no lower bound at all, so its first release includes the
//! root commit.

use std::fmt;

use git2::{Oid, Repository};
use tracing::debug;

use crate::error::GitError;

use super::tags::get_latest_reachable_tag;

/// Default end of the range.
const HEAD: &str = "HEAD";

/// Commits in `(since, until]`, with the names they were resolved from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseRange {
    /// Exclusive lower bound; `None` for a first release.
    pub since: Option<Oid>,
    pub since_label: Option<String>,
    /// Inclusive upper bound.
    pub until: Oid,
    pub until_label: String,
}

impl ReleaseRange {
    /// Whether the range reaches back to the start of history.
    pub fn is_first_release(&self) -> bool {
        self.since.is_none()
    }
}

impl fmt::Display for ReleaseRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.since_label {
            Some(since) => write!(f, "{}..{}", since, self.until_label),
            None => write!(f, "start of history..{}", self.until_label),
        }
    }
}

/// Resolve the range for a release.
///
/// `since` and `until` accept anything `git rev-parse` does (tags,
/// branches, hashes). `until` defaults to HEAD; `since` defaults to the
/// previous stable release, or no bound when there is none.
pub fn resolve_range(
    repo: &Repository,
    since: Option<&str>,
    until: Option<&str>,
) -> Result<ReleaseRange, GitError> {
    let until_label = until.unwrap_or(HEAD).to_string();
    let until_oid = peel_to_commit_id(repo, &until_label)?;

    let (since_oid, since_label) = match since {
        Some(name) => (Some(peel_to_commit_id(repo, name)?), Some(name.to_string())),
        None => match get_latest_reachable_tag(repo)? {
            Some(tag) => (Some(tag.oid), Some(tag.name)),
            None => {
                debug!("No previous release found; including full history");
                (None, None)
            }
        },
    };

    Ok(ReleaseRange {
        since: since_oid,
        since_label,
        until: until_oid,
        until_label,
    })
}

/// The commit a revision name points at, peeling annotated tags.
fn peel_to_commit_id(repo: &Repository, name: &str) -> Result<Oid, GitError> {
    let object = repo
        .revparse_single(name)
        .map_err(|e| GitError::ReferenceNotFound(name.to_string(), e))?;
    let commit = object.peel_to_commit().map_err(GitError::ParseCommit)?;
    Ok(commit.id())
}

/// URL of the `origin` remote, if the repository has one.
pub fn origin_url(repo: &Repository) -> Option<String> {
    let remote = repo.find_remote("origin").ok()?;
    remote.url().map(str::to_string)
}
