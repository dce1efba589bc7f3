//! Git operations using git2-rs.

pub mod commits;
pub mod range;
pub mod tags;

pub use commits::{CommitSource, GitCommitSource, SourceCommit, fetch_commits, get_commits};
pub use range::{ReleaseRange, origin_url, resolve_range};
pub use tags::{get_latest_reachable_tag, get_version_from_tag};
