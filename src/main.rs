//! # darc-manifest CLI
//!
//! This is the binary entry point for the `darc-manifest` command-line tool.
//!
//! Its primary responsibilities are:
//! - Parsing command-line arguments using `clap`.
//! - Installing the logger requested by `--log-level` / `RUST_LOG`.
//! - Executing the appropriate command against the local working tree.
//!
//! The manifest logic lives in the `darc_manifest` library crate, so the
//! binary stays a thin wrapper around it.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
