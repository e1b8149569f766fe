//! # Generate Props Command Implementation
//!
//! This module implements the `generate-props` subcommand, which rebuilds
//! `eng/Version.Details.props` from `eng/Version.Details.xml`.
//!
//! ## Modes
//!
//! - **Write** (default): Writes the generated file into the working tree,
//!   optionally committing it with `--git-commit`.
//! - **Print** (`--stdout`): Prints the generated file instead of writing it.
//! - **Check** (`--check`): Fails when the file on disk differs from what
//!   would be generated.

use anyhow::Result;
use clap::Args;

use darc_manifest::git_file::GitFile;
use darc_manifest::path::{resolve, ManifestFile};
use darc_manifest::props_generator;
use darc_manifest::repository::GitRepo;

use super::Context;

/// Regenerate eng/Version.Details.props from eng/Version.Details.xml
#[derive(Args, Debug)]
pub struct GeneratePropsArgs {
    /// Print the generated file instead of writing it.
    #[arg(long, conflicts_with = "check")]
    pub stdout: bool,

    /// Fail if the file on disk is out of date.
    #[arg(long)]
    pub check: bool,

    /// Commit the generated file with git.
    #[arg(long, conflicts_with_all = ["stdout", "check"])]
    pub git_commit: bool,
}

/// Execute the `generate-props` command.
pub fn execute(args: GeneratePropsArgs, context: &Context) -> Result<()> {
    let details = context.version_details(true)?;
    let document = props_generator::generate(&details)?;
    let generated = document.to_xml_string()?;
    let path = resolve(ManifestFile::VersionDetailsProps, context.base_path());

    if args.stdout {
        print!("{}", generated);
        return Ok(());
    }

    let repo = context.local_repo(args.git_commit);

    if args.check {
        let current = match repo.get_file_contents(&path, context.repo_uri(), &context.branch) {
            Ok(current) => Some(current),
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(e.into()),
        };
        if current.as_deref() != Some(generated.as_str()) {
            anyhow::bail!("{} is out of date, run 'darc-manifest generate-props' to update it", path);
        }
        println!("{} is up to date", path);
        return Ok(());
    }

    let file = GitFile::new(path.clone(), &generated);
    repo.commit_files(
        &[file],
        context.repo_uri(),
        &context.branch,
        &format!("Regenerate {}", path),
    )?;
    println!("Wrote {}", path);
    Ok(())
}
