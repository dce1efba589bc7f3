//! Release tag detection.
//!
//! The previous release is the newest stable `vX.Y.Z` / `X.Y.Z` tag reachable
//! from HEAD. Pre-release and non-semver tags (`nightly-…`, `v2.0.0-rc.1`) are
//! not release boundaries.

use std::collections::HashMap;

use git2::{Oid, Repository, Sort};
use semver::Version;
use tracing::{debug, warn};

use crate::error::GitError;

/// A release tag and the commit it points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagInfo {
    pub name: String,
    pub oid: Oid,
    pub version: Version,
}

/// Parse a tag name as a stable release version.
///
/// Accepts `1.2.3` and `v1.2.3`; rejects pre-releases and build metadata.
pub fn get_version_from_tag(tag_name: &str) -> Option<Version> {
    let raw = tag_name.strip_prefix('v').unwrap_or(tag_name);
    let version = Version::parse(raw).ok()?;
    (version.pre.is_empty() && version.build.is_empty()).then_some(version)
}

/// Get the latest stable release tag reachable from HEAD.
///
/// Walks history from HEAD newest-first and returns the first commit carrying
/// a release tag; when one commit has several, the highest version wins.
pub fn get_latest_reachable_tag(repo: &Repository) -> Result<Option<TagInfo>, GitError> {
    let Some(head_oid) = repo.head().ok().and_then(|head| head.target()) else {
        return Ok(None);
    };

    let mut by_commit: HashMap<Oid, Vec<TagInfo>> = HashMap::new();
    for tag in release_tags(repo)? {
        by_commit.entry(tag.oid).or_default().push(tag);
    }

    if by_commit.is_empty() {
        debug!("No stable release tags found in repository");
        return Ok(None);
    }

    let mut revwalk = repo.revwalk().map_err(GitError::RevwalkError)?;
    revwalk.push(head_oid).map_err(GitError::RevwalkError)?;
    revwalk
        .set_sorting(Sort::TOPOLOGICAL | Sort::TIME)
        .map_err(GitError::RevwalkError)?;

    for oid in revwalk {
        let oid = oid.map_err(GitError::RevwalkError)?;
        if let Some(tags) = by_commit.remove(&oid)
            && let Some(tag) = tags.into_iter().max_by(|a, b| a.version.cmp(&b.version))
        {
            debug!(tag = %tag.name, "Found latest reachable release tag");
            return Ok(Some(tag));
        }
    }

    Ok(None)
}

/// Every stable release tag in the repository, peeled to its commit.
fn release_tags(repo: &Repository) -> Result<Vec<TagInfo>, GitError> {
    let mut tags = Vec::new();

    repo.tag_foreach(|oid, name_bytes| {
        let Ok(full_name) = std::str::from_utf8(name_bytes) else {
            warn!("Skipping tag with OID {} - name is not valid UTF-8", oid);
            return true;
        };
        let name = full_name.strip_prefix("refs/tags/").unwrap_or(full_name);

        if let Some(version) = get_version_from_tag(name) {
            // Annotated tags point at a tag object; lightweight ones at the commit.
            let target = repo.find_tag(oid).map(|t| t.target_id()).unwrap_or(oid);
            tags.push(TagInfo {
                name: name.to_string(),
                oid: target,
                version,
            });
        }
        true
    })
    .map_err(GitError::RevwalkError)?;

    Ok(tags)
}
