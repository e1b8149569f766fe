//! # Verify Command Implementation
//!
//! This module implements the `verify` subcommand, which checks that the
//! manifest files of the repository agree with each other:
//!
//! - no dependency is declared twice,
//! - every dependency has a matching version property,
//! - `global.json` and `.config/dotnet-tools.json` carry the declared versions.
//!
//! Individual problems are logged as they are found. The command exits with
//! a non-zero status when any check fails.

use anyhow::Result;
use clap::Args;

use super::Context;

/// Check that the manifest files agree with each other
#[derive(Args, Debug)]
pub struct VerifyArgs {}

/// Execute the `verify` command.
pub fn execute(_args: VerifyArgs, context: &Context) -> Result<()> {
    let valid = context
        .manager(false)
        .verify(context.repo_uri(), &context.branch, context.base_path());

    if !valid {
        anyhow::bail!("Dependency verification failed, see the log above for details");
    }
    println!("Dependency verification succeeded");
    Ok(())
}
