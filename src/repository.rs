//! # Repository Collaborators
//!
//! The manifest engine never talks to a git host directly. It reads file
//! contents and submits commits through two small traits:
//!
//! - **`GitRepo`**: fetch one file by path and branch, and commit a list of
//!   [`GitFile`]s atomically. A missing file is reported as
//!   [`Error::FileNotFound`]; commit failures (for example a non-fast-forward
//!   push) are surfaced as [`Error::Commit`] and never retried here.
//!
//! - **`GitRepoFactory`**: hand out a `GitRepo` client for a repository URI.
//!
//! `LocalRepo` implements both against a working tree on disk. In tests,
//! [`crate::filesystem::MemoryRepo`] stands in for a remote repository.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info};

use crate::error::{Error, Result};
use crate::git_file::{GitFile, GitFileOperation};

/// Trait for repository access - allows mocking in tests
pub trait GitRepo: Send + Sync {
    /// Read the contents of `path` on `branch`.
    fn get_file_contents(&self, path: &str, repo_uri: &str, branch: &str) -> Result<String>;

    /// Write every file in one commit.
    fn commit_files(&self, files: &[GitFile], repo_uri: &str, branch: &str, message: &str) -> Result<()>;
}

/// Creates repository clients by URI.
pub trait GitRepoFactory: Send + Sync {
    fn create_client(&self, repo_uri: &str) -> Arc<dyn GitRepo>;
}

/// A factory that hands out the same client for every URI.
pub struct SingleRepoFactory {
    repo: Arc<dyn GitRepo>,
}

impl SingleRepoFactory {
    pub fn new(repo: Arc<dyn GitRepo>) -> Self {
        Self { repo }
    }
}

impl GitRepoFactory for SingleRepoFactory {
    fn create_client(&self, _repo_uri: &str) -> Arc<dyn GitRepo> {
        Arc::clone(&self.repo)
    }
}

/// A repository checked out on the local filesystem.
///
/// Reads come from the working tree regardless of branch. Commits write
/// the files into the working tree and, when enabled, record a git commit
/// with the system `git` command.
#[derive(Debug, Clone)]
pub struct LocalRepo {
    root: PathBuf,
    git_commit: bool,
}

impl LocalRepo {
    /// Operate on the working tree rooted at `root`, without creating git commits.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            git_commit: false,
        }
    }

    /// Also stage and commit written files with `git`.
    pub fn with_git_commit(mut self, git_commit: bool) -> Self {
        self.git_commit = git_commit;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write the content of an added file next to its destination.
    fn stage_file(&self, file: &GitFile) -> std::io::Result<PathBuf> {
        let full_path = self.root.join(&file.file_path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let staged = staged_path(&full_path);
        fs::write(&staged, &file.content)?;
        Ok(staged)
    }

    /// Stage every added file, then move them all into place and apply deletions.
    ///
    /// A failure while staging removes what was staged and leaves the tree untouched.
    fn write_files(&self, files: &[GitFile]) -> std::result::Result<(), (String, std::io::Error)> {
        let mut staged = Vec::new();
        for file in files.iter().filter(|f| f.operation == GitFileOperation::Add) {
            match self.stage_file(file) {
                Ok(path) => staged.push((path, self.root.join(&file.file_path), file)),
                Err(e) => {
                    for (path, _, _) in &staged {
                        let _ = fs::remove_file(path);
                    }
                    return Err((file.file_path.clone(), e));
                }
            }
        }

        for (path, destination, file) in staged {
            fs::rename(&path, &destination).map_err(|e| (file.file_path.clone(), e))?;
        }

        for file in files.iter().filter(|f| f.operation == GitFileOperation::Delete) {
            match fs::remove_file(self.root.join(&file.file_path)) {
                Err(e) if e.kind() != ErrorKind::NotFound => return Err((file.file_path.clone(), e)),
                _ => {}
            }
        }
        Ok(())
    }
}

fn staged_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".darc-staged");
    path.with_file_name(name)
}

impl GitRepo for LocalRepo {
    fn get_file_contents(&self, path: &str, repo_uri: &str, branch: &str) -> Result<String> {
        let full_path = self.root.join(path);
        debug!("Reading '{}'", full_path.display());
        fs::read_to_string(&full_path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => Error::FileNotFound {
                path: path.to_string(),
                repo_uri: repo_uri.to_string(),
                branch: branch.to_string(),
            },
            _ => Error::Io(e),
        })
    }

    fn commit_files(&self, files: &[GitFile], repo_uri: &str, branch: &str, message: &str) -> Result<()> {
        let commit_error = |message: String| Error::Commit {
            repo_uri: repo_uri.to_string(),
            branch: branch.to_string(),
            message,
        };

        self.write_files(files)
            .map_err(|(path, e)| commit_error(format!("{}: {}", path, e)))?;

        if self.git_commit {
            let paths: Vec<&str> = files.iter().map(|f| f.file_path.as_str()).collect();
            crate::git::add_and_commit(&self.root, &paths, message)
                .map_err(|e| commit_error(e.to_string()))?;
        }

        info!(
            "Wrote {} file(s) to '{}': {}",
            files.len(),
            self.root.display(),
            message
        );
        Ok(())
    }
}

impl GitRepoFactory for LocalRepo {
    fn create_client(&self, _repo_uri: &str) -> Arc<dyn GitRepo> {
        Arc::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_local_repo_missing_file_is_not_found() {
        let temp = TempDir::new().unwrap();
        let repo = LocalRepo::new(temp.path());
        let error = repo
            .get_file_contents("eng/Version.Details.xml", "repo", "main")
            .unwrap_err();
        assert!(error.is_not_found());
        assert!(error.to_string().contains("eng/Version.Details.xml"));
    }

    #[test]
    fn test_local_repo_commit_writes_and_deletes() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("stale.json"), "{}").unwrap();
        let repo = LocalRepo::new(temp.path());

        let files = vec![
            GitFile::new("eng/Versions.props", "<Project />"),
            GitFile::deleted("stale.json"),
            GitFile::deleted("never-existed.json"),
        ];
        repo.commit_files(&files, "repo", "main", "Update").unwrap();

        assert_eq!(
            repo.get_file_contents("eng/Versions.props", "repo", "main").unwrap(),
            "<Project />\n"
        );
        assert!(!temp.path().join("stale.json").exists());
    }

    #[test]
    fn test_local_repo_failed_commit_writes_nothing() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("blocker"), "not a directory").unwrap();
        let repo = LocalRepo::new(temp.path());

        let files = vec![
            GitFile::new("global.json", "{}"),
            GitFile::new("blocker/Versions.props", "<Project />"),
        ];
        let error = repo.commit_files(&files, "repo", "main", "Update").unwrap_err();

        assert!(matches!(error, Error::Commit { .. }));
        assert!(error.to_string().contains("blocker/Versions.props"));
        assert!(!temp.path().join("global.json").exists());
        let leftovers: Vec<_> = fs::read_dir(temp.path()).unwrap().collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn test_single_repo_factory_returns_same_client() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("global.json"), "{}").unwrap();
        let factory = SingleRepoFactory::new(Arc::new(LocalRepo::new(temp.path())));
        let client = factory.create_client("https://github.com/dotnet/any");
        assert_eq!(client.get_file_contents("global.json", "", "").unwrap(), "{}");
    }
}
