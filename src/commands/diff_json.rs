//! # Diff JSON Command Implementation
//!
//! This module implements the `diff-json` subcommand, which flattens two
//! JSON files into `a:b:c` keys and prints the keys that were added,
//! updated or removed between them.
//!
//! With `--apply-to`, the changes are replayed onto a third document and the
//! result is printed. Replaying onto the old file reproduces the new one.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use clap::Args;

use darc_manifest::flat_json::{self, FlatJson};

/// Show the key-level differences between two JSON files
#[derive(Args, Debug)]
pub struct DiffJsonArgs {
    /// The earlier version of the document.
    #[arg(value_name = "OLD")]
    pub old: PathBuf,

    /// The later version of the document.
    #[arg(value_name = "NEW")]
    pub new: PathBuf,

    /// Replay the changes onto this document and print the result.
    #[arg(long, value_name = "FILE")]
    pub apply_to: Option<PathBuf>,
}

/// Execute the `diff-json` command.
pub fn execute(args: DiffJsonArgs) -> Result<()> {
    let old = read_flat(&args.old)?;
    let new = read_flat(&args.new)?;
    let changes = flat_json::compare(&old, &new)?;

    if let Some(target) = &args.apply_to {
        let content = read(target)?;
        let json: serde_json::Value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", target.display()))?;
        let updated = flat_json::apply(&json, &changes)?;
        println!("{}", serde_json::to_string_pretty(&updated)?);
        return Ok(());
    }

    if changes.is_empty() {
        println!("No differences");
        return Ok(());
    }
    for change in &changes {
        println!("{}", change);
    }
    Ok(())
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn read_flat(path: &Path) -> Result<FlatJson> {
    let content = read(path)?;
    flat_json::flatten(&content).with_context(|| format!("Failed to parse {}", path.display()))
}
