//! # Add Command Implementation
//!
//! This module implements the `add` subcommand, which adds a dependency to
//! the repository or moves an existing one to a new build.
//!
//! ## Functionality
//!
//! - **Manifest update**: Writes the dependency into `eng/Version.Details.xml`.
//! - **Companion files**: Updates `eng/Versions.props` (or regenerates
//!   `eng/Version.Details.props` in a Virtual Mono Repo), `global.json` and
//!   `.config/dotnet-tools.json` to match.
//! - **Git commit**: With `--git-commit`, the written files are committed.
//!
//! Adding a dependency that already pins the same build is a no-op.

use anyhow::Result;
use clap::Args;

use darc_manifest::models::{DependencyDetail, DependencyType};
use darc_manifest::suggestions;

use super::Context;

/// Add a dependency or update an existing one
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Name of the package.
    #[arg(long, value_name = "NAME")]
    pub name: String,

    /// Version of the package.
    #[arg(long, value_name = "VERSION")]
    pub version: String,

    /// Commit the package was built from.
    #[arg(long, value_name = "SHA")]
    pub commit: String,

    /// Repository the package was built from.
    #[arg(long, value_name = "URI")]
    pub repo_uri: String,

    /// Dependency category: product or toolset.
    #[arg(long = "type", value_name = "TYPE", default_value = "product")]
    pub dependency_type: String,

    /// Exclude the dependency from automatic updates.
    #[arg(long)]
    pub pinned: bool,

    /// Track the dependency without writing version properties.
    #[arg(long)]
    pub skip_property: bool,

    /// Name of the dependency this one is coherent with.
    #[arg(long, value_name = "NAME")]
    pub coherent_parent: Option<String>,

    /// Only write eng/Version.Details.xml.
    #[arg(long)]
    pub version_details_only: bool,

    /// Commit the changed files with git.
    #[arg(long)]
    pub git_commit: bool,
}

/// Execute the `add` command.
pub fn execute(args: AddArgs, context: &Context) -> Result<()> {
    let dependency_type: DependencyType = args
        .dependency_type
        .parse()
        .map_err(|_| suggestions::unknown_dependency_type(&args.dependency_type))?;

    let mut dependency = DependencyDetail::new(args.name, args.version, args.commit, args.repo_uri)
        .with_type(dependency_type)
        .pinned(args.pinned)
        .skip_property(args.skip_property);
    dependency.coherent_parent_dependency_name = args.coherent_parent;

    let mut options = context.options();
    options.version_details_only |= args.version_details_only;

    let changed = context
        .manager(args.git_commit)
        .add_or_update(&dependency, context.repo_uri(), &context.branch, &options)
        .map_err(|e| context.manifest_error(e))?;

    if changed {
        println!("Updated {} to {}", dependency.name, dependency.version);
    } else {
        println!("{} {} is already up to date", dependency.name, dependency.version);
    }
    Ok(())
}
