//! Default values for darc-manifest.
//!
//! This module provides centralized default values used across commands,
//! ensuring consistency and avoiding duplication.

/// Name of the optional configuration file at the repository root.
pub const DEFAULT_CONFIG_FILENAME: &str = ".darc-manifest.yaml";

/// Environment variable that points at a configuration file.
pub const CONFIG_ENV_VAR: &str = "DARC_MANIFEST_CONFIG";

/// Log level used when neither `--log-level` nor `RUST_LOG` is set.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Repository URI reported for a local working tree.
pub const LOCAL_REPO_URI: &str = "local";

/// Branch reported for a local working tree.
pub const LOCAL_BRANCH: &str = "HEAD";
