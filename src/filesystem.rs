//! In-memory repository for tests and embedders

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{Error, Result};
use crate::git_file::{GitFile, GitFileOperation};
use crate::repository::{GitRepo, GitRepoFactory};

/// A commit recorded by [`MemoryRepo`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCommit {
    pub repo_uri: String,
    pub branch: String,
    pub message: String,
    pub files: Vec<GitFile>,
}

#[derive(Debug, Default)]
struct State {
    files: HashMap<String, String>,
    commits: Vec<RecordedCommit>,
    reads: Vec<String>,
}

/// Repository backed by a path -> content map.
///
/// Every commit is applied to the map and recorded, so tests can assert on
/// both the resulting files and the exact commit payloads. Cloning shares
/// the underlying state.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepo {
    state: Arc<Mutex<State>>,
}

impl MemoryRepo {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Add or replace a file.
    pub fn add_file(&self, path: impl Into<String>, content: impl Into<String>) {
        self.lock().files.insert(path.into(), content.into());
    }

    /// Builder-style [`MemoryRepo::add_file`].
    pub fn with_file(self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.add_file(path, content);
        self
    }

    pub fn remove_file(&self, path: &str) -> Option<String> {
        self.lock().files.remove(path)
    }

    pub fn file(&self, path: &str) -> Option<String> {
        self.lock().files.get(path).cloned()
    }

    pub fn exists(&self, path: &str) -> bool {
        self.lock().files.contains_key(path)
    }

    /// All paths, sorted.
    pub fn list_files(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.lock().files.keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Commits recorded so far, oldest first.
    pub fn commits(&self) -> Vec<RecordedCommit> {
        self.lock().commits.clone()
    }

    /// Paths requested through [`GitRepo::get_file_contents`], in order.
    pub fn reads(&self) -> Vec<String> {
        self.lock().reads.clone()
    }
}

impl GitRepo for MemoryRepo {
    fn get_file_contents(&self, path: &str, repo_uri: &str, branch: &str) -> Result<String> {
        let mut state = self.lock();
        state.reads.push(path.to_string());
        state
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| Error::FileNotFound {
                path: path.to_string(),
                repo_uri: repo_uri.to_string(),
                branch: branch.to_string(),
            })
    }

    fn commit_files(&self, files: &[GitFile], repo_uri: &str, branch: &str, message: &str) -> Result<()> {
        let mut state = self.lock();
        for file in files {
            match file.operation {
                GitFileOperation::Add => {
                    state.files.insert(file.file_path.clone(), file.content.clone());
                }
                GitFileOperation::Delete => {
                    state.files.remove(&file.file_path);
                }
            }
        }
        state.commits.push(RecordedCommit {
            repo_uri: repo_uri.to_string(),
            branch: branch.to_string(),
            message: message.to_string(),
            files: files.to_vec(),
        });
        Ok(())
    }
}

impl GitRepoFactory for MemoryRepo {
    fn create_client(&self, _repo_uri: &str) -> Arc<dyn GitRepo> {
        Arc::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_repo_basic_operations() {
        let repo = MemoryRepo::new().with_file("global.json", "{}");
        assert!(repo.exists("global.json"));
        assert_eq!(repo.get_file_contents("global.json", "r", "b").unwrap(), "{}");
        assert_eq!(repo.reads(), vec!["global.json".to_string()]);
        assert_eq!(repo.remove_file("global.json").as_deref(), Some("{}"));
        assert!(!repo.exists("global.json"));
    }

    #[test]
    fn test_memory_repo_missing_file() {
        let repo = MemoryRepo::new();
        let error = repo.get_file_contents("nuget.config", "r", "b").unwrap_err();
        assert!(error.is_not_found());
    }

    #[test]
    fn test_memory_repo_records_commits() {
        let repo = MemoryRepo::new().with_file("old.txt", "x");
        let files = vec![GitFile::new("new.txt", "y"), GitFile::deleted("old.txt")];
        repo.commit_files(&files, "uri", "main", "Swap files").unwrap();

        assert_eq!(repo.list_files(), vec!["new.txt".to_string()]);
        let commits = repo.commits();
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].message, "Swap files");
        assert_eq!(commits[0].branch, "main");
        assert_eq!(commits[0].files.len(), 2);
    }

    #[test]
    fn test_memory_repo_clones_share_state() {
        let repo = MemoryRepo::new();
        let client = repo.create_client("uri");
        client
            .commit_files(&[GitFile::new("a", "b")], "uri", "main", "msg")
            .unwrap();
        assert_eq!(repo.file("a").as_deref(), Some("b\n"));
    }
}
