//! # Remove Command Implementation
//!
//! This module implements the `remove` subcommand, which deletes a
//! dependency from `eng/Version.Details.xml` together with its version
//! properties and its `.config/dotnet-tools.json` entry.
//!
//! Removing a dependency that is not declared succeeds without touching
//! any file.

use anyhow::Result;
use clap::Args;
use log::warn;

use super::Context;

/// Remove a dependency and its version properties
#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Name of the dependency to remove.
    #[arg(long, value_name = "NAME")]
    pub name: String,

    /// Commit the changed files with git.
    #[arg(long)]
    pub git_commit: bool,
}

/// Execute the `remove` command.
pub fn execute(args: RemoveArgs, context: &Context) -> Result<()> {
    let removed = context
        .manager(args.git_commit)
        .remove(&args.name, context.repo_uri(), &context.branch, &context.options())
        .map_err(|e| context.manifest_error(e))?;

    if removed {
        println!("Removed {}", args.name);
    } else {
        warn!("No dependency named '{}' was found, nothing to remove", args.name);
    }
    Ok(())
}
