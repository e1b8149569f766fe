//! # Error Handling
//!
//! This module defines the centralized error type for `darc-manifest`. It uses
//! the `thiserror` library to describe every failure the manifest engine can
//! surface, with enough context (file path, tag, attribute, offending value)
//! for an operator to diagnose a broken manifest without a debugger.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum. Manifest content errors (`EmptyManifest`,
//!   `UnknownDependencyType`, `InvalidBoolean`, `MissingAttribute`,
//!   `InvalidInteger`) are always surfaced and never auto-corrected.
//!   `FileNotFound` is the collaborator signal for a missing file; the
//!   dependency file manager recovers from it only for the optional manifest
//!   files.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.

use thiserror::Error;

/// Main error type for manifest operations
#[derive(Error, Debug)]
pub enum Error {
    /// The repository collaborator could not find the requested file.
    #[error("File '{path}' was not found in repo '{repo_uri}' and branch '{branch}'")]
    FileNotFound {
        path: String,
        repo_uri: String,
        branch: String,
    },

    /// The raw text could not be loaded as a structured document.
    #[error("Malformed document: {message}")]
    MalformedDocument { message: String },

    /// The dependency manifest has no root element.
    #[error(
        "There was an error while reading 'eng/Version.Details.xml' and it came back empty. \
         Look for exceptions above."
    )]
    EmptyManifest,

    /// A top-level category in the dependency manifest is not recognized.
    #[error("Unknown dependency type '{name}'")]
    UnknownDependencyType { name: String },

    /// A boolean attribute holds something other than `true`/`false`.
    #[error("The '{attribute}' attribute is set but the value '{value}' is not a valid boolean...")]
    InvalidBoolean { attribute: String, value: String },

    /// A required attribute is missing from a tag.
    #[error("The XML tag `{tag}` does not contain a value for attribute `{attribute}`")]
    MissingAttribute { tag: String, attribute: String },

    /// An integer attribute holds a non-numeric value.
    #[error("The '{attribute}' attribute is set but the value '{value}' is not a valid integer")]
    InvalidInteger { attribute: String, value: String },

    /// The same flattened JSON key holds differently-shaped values.
    #[error("Type mismatch for key '{key}': old and new values have different shapes")]
    TypeMismatch { key: String },

    /// None of the NuGet configuration candidate names exist.
    #[error("No variant of '{candidate}' was found in repo '{repo_uri}' and branch '{branch}'")]
    NoVariantFound {
        repo_uri: String,
        branch: String,
        candidate: String,
    },

    /// The repository collaborator rejected a commit.
    #[error("Failed to commit to repo '{repo_uri}' and branch '{branch}': {message}")]
    Commit {
        repo_uri: String,
        branch: String,
        message: String,
    },

    /// A mutation request is invalid for the current manifest.
    #[error("Dependency error: {message}")]
    Dependency { message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON parsing or serialization error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// A semantic versioning parsing error, wrapped from `semver::Error`.
    #[error("Semver parsing error: {0}")]
    Semver(#[from] semver::Error),
}

impl Error {
    /// Whether this error is the collaborator's "file not found" signal.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::FileNotFound { .. })
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
