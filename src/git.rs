//! Thin wrappers around the system `git` command

use std::path::Path;
use std::process::Command;

use crate::error::{Error, Result};

fn run_git(repo_dir: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .current_dir(repo_dir)
        .args(args)
        .output()
        .map_err(|e| Error::Commit {
            repo_uri: repo_dir.display().to_string(),
            branch: String::new(),
            message: format!("failed to run git {}: {}", args.join(" "), e),
        })?;

    if !output.status.success() {
        return Err(Error::Commit {
            repo_uri: repo_dir.display().to_string(),
            branch: String::new(),
            message: format!(
                "git {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Stage `paths` (additions and deletions) and record a commit.
///
/// This uses the system git command, so identity and hooks come from the
/// user's git configuration.
pub fn add_and_commit(repo_dir: &Path, paths: &[&str], message: &str) -> Result<()> {
    let mut add_args = vec!["add", "--all", "--"];
    add_args.extend_from_slice(paths);
    run_git(repo_dir, &add_args)?;
    run_git(repo_dir, &["commit", "--quiet", "-m", message])?;
    Ok(())
}

/// Name of the branch currently checked out in `repo_dir`.
pub fn current_branch(repo_dir: &Path) -> Result<String> {
    run_git(repo_dir, &["rev-parse", "--abbrev-ref", "HEAD"]).map(|s| s.trim().to_string())
}
