//! # CLI Command Implementations
//!
//! Each subcommand of `darc-manifest` lives in its own file with:
//! - an `Args` struct derived with `clap`,
//! - an `execute` function that calls into the `darc_manifest` library.
//!
//! Commands that work on a repository receive a [`Context`] holding the
//! working tree location and the merged configuration.

pub mod add;
pub mod diff_json;
pub mod generate_props;
pub mod get;
pub mod remove;
pub mod verify;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use log::debug;

use darc_manifest::config::{self, Settings};
use darc_manifest::error::Error;
use darc_manifest::defaults::{DEFAULT_CONFIG_FILENAME, LOCAL_BRANCH, LOCAL_REPO_URI};
use darc_manifest::git;
use darc_manifest::manager::{DependencyFileManager, ManifestOptions};
use darc_manifest::models::VersionDetails;
use darc_manifest::repository::LocalRepo;
use darc_manifest::suggestions;

/// Repository location and settings shared by the repository commands.
#[derive(Debug)]
pub struct Context {
    pub repo_root: PathBuf,
    pub settings: Settings,
    pub branch: String,
}

impl Context {
    /// Load settings, letting `relative_base_path` from the command line win.
    pub fn load(repo_root: PathBuf, config_path: Option<PathBuf>, relative_base_path: Option<String>) -> Result<Self> {
        let mut settings = match config_path {
            Some(path) => {
                if !path.exists() {
                    return Err(suggestions::config_not_found(&path));
                }
                config::from_file(&path)
                    .with_context(|| format!("Failed to load config from {}", path.display()))?
            }
            None => {
                let path = repo_root.join(DEFAULT_CONFIG_FILENAME);
                config::load(&path)
                    .with_context(|| format!("Failed to load config from {}", path.display()))?
            }
        };

        if relative_base_path.is_some() {
            settings.relative_base_path = relative_base_path;
        }

        let branch = git::current_branch(&repo_root).unwrap_or_else(|e| {
            debug!("Could not determine the current branch: {}", e);
            LOCAL_BRANCH.to_string()
        });

        Ok(Self {
            repo_root,
            settings,
            branch,
        })
    }

    pub fn repo_uri(&self) -> &str {
        LOCAL_REPO_URI
    }

    pub fn base_path(&self) -> Option<&str> {
        self.settings.relative_base_path.as_deref()
    }

    pub fn options(&self) -> ManifestOptions {
        self.settings.manifest_options()
    }

    pub fn local_repo(&self, git_commit: bool) -> LocalRepo {
        LocalRepo::new(&self.repo_root).with_git_commit(git_commit)
    }

    pub fn manager(&self, git_commit: bool) -> DependencyFileManager {
        let manager = DependencyFileManager::with_factory(Arc::new(self.local_repo(git_commit)));
        match &self.settings.nuget_config_names {
            Some(names) => manager.with_nuget_config_names(names.clone()),
            None => manager,
        }
    }

    /// Parse the dependency manifest of the working tree.
    pub fn version_details(&self, include_pinned: bool) -> Result<VersionDetails> {
        self.manager(false)
            .parse_version_details_xml(self.repo_uri(), &self.branch, include_pinned, self.base_path())
            .map_err(|e| self.manifest_error(e))
    }

    /// Turn a library error into a CLI error, with a hint for missing files.
    pub fn manifest_error(&self, error: Error) -> anyhow::Error {
        match error {
            Error::FileNotFound { path, .. } => suggestions::manifest_not_found(&path, &self.repo_root),
            other => other.into(),
        }
    }
}
