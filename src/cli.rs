//! CLI argument parsing and command dispatch

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;
use darc_manifest::defaults::{CONFIG_ENV_VAR, DEFAULT_LOG_LEVEL};

/// darc-manifest - Inspect and update .NET dependency-flow manifests
#[derive(Parser, Debug)]
#[command(name = "darc-manifest")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Root of the repository to operate on
    #[arg(long, global = true, value_name = "DIR", default_value = ".")]
    repo: PathBuf,

    /// Path to a .darc-manifest.yaml configuration file
    #[arg(long, global = true, value_name = "FILE", env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,

    /// Sub-path of the repository inside a Virtual Mono Repo
    #[arg(long, global = true, value_name = "PATH")]
    relative_base_path: Option<String>,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the dependencies declared in eng/Version.Details.xml
    Get(commands::get::GetArgs),
    /// Add a dependency or update an existing one
    Add(commands::add::AddArgs),
    /// Remove a dependency and its version properties
    Remove(commands::remove::RemoveArgs),
    /// Check that the manifest files agree with each other
    Verify(commands::verify::VerifyArgs),
    /// Regenerate eng/Version.Details.props from eng/Version.Details.xml
    GenerateProps(commands::generate_props::GeneratePropsArgs),
    /// Show the key-level differences between two JSON files
    DiffJson(commands::diff_json::DiffJsonArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);

        if let Commands::DiffJson(args) = self.command {
            return commands::diff_json::execute(args);
        }

        let context = commands::Context::load(self.repo, self.config, self.relative_base_path)?;
        match self.command {
            Commands::Get(args) => commands::get::execute(args, &context),
            Commands::Add(args) => commands::add::execute(args, &context),
            Commands::Remove(args) => commands::remove::execute(args, &context),
            Commands::Verify(args) => commands::verify::execute(args, &context),
            Commands::GenerateProps(args) => commands::generate_props::execute(args, &context),
            Commands::DiffJson(_) => Ok(()),
        }
    }
}

/// Install `env_logger`, letting `RUST_LOG` take precedence over `--log-level`.
fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_target(false)
        .try_init();
}
