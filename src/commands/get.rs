//! # Get Command Implementation
//!
//! This module implements the `get` subcommand, which lists the dependencies
//! declared in `eng/Version.Details.xml`.
//!
//! ## Functionality
//!
//! - **Listing**: Prints every dependency with its version, source
//!   repository, commit and flags.
//! - **Lookup**: `--name` prints a single dependency, matched
//!   case-insensitively, and suggests close names when nothing matches.
//! - **Pinned filter**: `--no-pinned` hides dependencies that are excluded
//!   from automatic updates.
//!
//! This command is read-only.

use anyhow::Result;
use clap::Args;

use darc_manifest::models::DependencyDetail;
use darc_manifest::suggestions;

use super::Context;

/// List the dependencies declared in eng/Version.Details.xml
#[derive(Args, Debug)]
pub struct GetArgs {
    /// Only show the dependency with this name (case-insensitive).
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,

    /// Hide pinned dependencies.
    #[arg(long)]
    pub no_pinned: bool,
}

/// Execute the `get` command.
pub fn execute(args: GetArgs, context: &Context) -> Result<()> {
    let details = context.version_details(!args.no_pinned)?;

    if let Some(name) = &args.name {
        let Some(dependency) = details.find(name) else {
            let known: Vec<&str> = details.dependencies.iter().map(|d| d.name.as_str()).collect();
            return Err(suggestions::dependency_not_found(name, &known));
        };
        print!("{}", describe(dependency));
        return Ok(());
    }

    if details.dependencies.is_empty() {
        println!("No dependencies found.");
        return Ok(());
    }

    let listing: Vec<String> = details.dependencies.iter().map(describe).collect();
    print!("{}", listing.join("\n"));
    Ok(())
}

fn describe(dependency: &DependencyDetail) -> String {
    let mut out = String::new();
    out.push_str(&format!("Name:             {}\n", dependency.name));
    out.push_str(&format!("Version:          {}\n", dependency.version));
    out.push_str(&format!("Repo:             {}\n", dependency.repo_uri));
    out.push_str(&format!("Commit:           {}\n", dependency.commit));
    out.push_str(&format!("Type:             {}\n", dependency.dependency_type));
    out.push_str(&format!("Pinned:           {}\n", dependency.pinned));
    if dependency.skip_property {
        out.push_str("SkipProperty:     true\n");
    }
    if let Some(parent) = &dependency.coherent_parent_dependency_name {
        out.push_str(&format!("Coherent parent:  {}\n", parent));
    }
    if let Some(source_build) = &dependency.source_build {
        out.push_str(&format!("Source build:     {}\n", source_build.repo_name));
    }
    out
}
