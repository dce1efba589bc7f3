//! Shared test utilities for integration tests.
//!
//! Not all functions are used by every test file, but they're shared across tests.
#![allow(dead_code)]

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use git2::{Oid, Repository, Signature};
use relnotes::{NotesLogger, SourceCommit};

/// Get the path to test fixtures directory.
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Get the path to a recorded Claude stream fixture.
pub fn stream_fixture(name: &str) -> PathBuf {
    fixtures_dir().join("streams").join(name)
}

/// Read a fixture file as a string.
pub fn read_fixture(path: PathBuf) -> String {
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {:?}: {}", path, e))
}

/// Log level captured by [`RecordingLogger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Log,
    Warn,
    Error,
}

/// Logger that keeps every message for later assertions.
#[derive(Debug, Default)]
pub struct RecordingLogger {
    entries: Mutex<Vec<(Level, String)>>,
}

impl RecordingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(Level, String)> {
        self.entries.lock().unwrap().clone()
    }

    pub fn messages(&self, level: Level) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m)
            .collect()
    }

    /// Whether any message at `level` contains `needle`.
    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.messages(level).iter().any(|m| m.contains(needle))
    }

    /// Index of the first entry containing `needle`, at any level.
    pub fn position(&self, needle: &str) -> Option<usize> {
        self.entries().iter().position(|(_, m)| m.contains(needle))
    }

    fn push(&self, level: Level, message: String) {
        self.entries.lock().unwrap().push((level, message));
    }
}

impl NotesLogger for RecordingLogger {
    fn log(&self, message: &str) {
        self.push(Level::Log, message.to_string());
    }

    fn warn(&self, message: &str) {
        self.push(Level::Warn, message.to_string());
    }

    fn error(&self, message: &str, detail: &dyn Display) {
        self.push(Level::Error, format!("{}: {}", message, detail));
    }
}

/// A commit as a host would supply it.
pub fn source_commit(hash: &str, message: &str, committer: Option<&str>) -> SourceCommit {
    SourceCommit {
        hash: hash.to_string(),
        message: message.to_string(),
        committer_name: committer.map(str::to_string),
        committer_date: "2023-01-01T00:00:00Z".to_string(),
    }
}

/// Write an executable shell script standing in for the Claude CLI.
///
/// Returns the temp directory (keep it alive) and the script path.
#[cfg(unix)]
pub fn create_mock_script(script_content: &str) -> (tempfile::TempDir, PathBuf) {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp directory");
    let script_path = temp_dir.path().join("mock_claude.sh");

    std::fs::write(&script_path, script_content).expect("Failed to write mock script");

    let mut perms = std::fs::metadata(&script_path)
        .expect("Failed to get metadata")
        .permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&script_path, perms).expect("Failed to set permissions");

    (temp_dir, script_path)
}

/// A test git repository builder for integration tests.
pub struct TestRepo {
    pub dir: tempfile::TempDir,
    pub repo: Repository,
}

impl TestRepo {
    /// Create a new empty git repository in a temp directory.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let repo = Repository::init(dir.path()).expect("Failed to init git repo");
        Self { dir, repo }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Create a commit with the given message. Returns the commit OID.
    pub fn commit(&self, message: &str) -> Oid {
        self.commit_as("Test User", message)
    }

    /// Create a commit whose author and committer is `name`.
    pub fn commit_as(&self, name: &str, message: &str) -> Oid {
        let sig = Signature::now(name, "test@example.com").expect("Failed to create signature");

        // Each commit changes the file so the tree differs
        let file_path = self.dir.path().join("notes.txt");
        let previous = std::fs::read_to_string(&file_path).unwrap_or_default();
        std::fs::write(&file_path, format!("{}{}\n", previous, message))
            .expect("Failed to write test file");

        let mut index = self.repo.index().expect("Failed to get index");
        index.add_path(Path::new("notes.txt")).expect("Failed to add file");
        index.write().expect("Failed to write index");
        let tree_id = index.write_tree().expect("Failed to write tree");
        let tree = self.repo.find_tree(tree_id).expect("Failed to find tree");

        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .expect("Failed to create commit")
    }

    /// Create a lightweight tag pointing to the given OID.
    pub fn tag_lightweight(&self, name: &str, oid: Oid) {
        let obj = self.repo.find_object(oid, None).expect("Failed to find object");
        self.repo.tag_lightweight(name, &obj, false).expect("Failed to create lightweight tag");
    }

    /// Create an annotated tag pointing to the given OID.
    pub fn tag_annotated(&self, name: &str, oid: Oid, message: &str) {
        let sig = Signature::now("Test User", "test@example.com").expect("Failed to create signature");
        let obj = self.repo.find_object(oid, None).expect("Failed to find object");
        self.repo.tag(name, &obj, &sig, message, false).expect("Failed to create annotated tag");
    }

    /// Create a branch pointing to the given OID.
    pub fn branch(&self, name: &str, oid: Oid) {
        let commit = self.repo.find_commit(oid).expect("Failed to find commit");
        self.repo.branch(name, &commit, false).expect("Failed to create branch");
    }

    /// Add an `origin` remote.
    pub fn set_origin(&self, url: &str) {
        self.repo.remote("origin", url).expect("Failed to add remote");
    }
}
