//! # Error Suggestions
//!
//! Helpers that build `anyhow` errors for the CLI with a hint on how to fix
//! the problem, not just what went wrong.
//!
//! ```rust,ignore
//! use crate::suggestions;
//!
//! // Instead of:
//! anyhow::bail!("Dependency not found: {}", name);
//!
//! // Use:
//! return Err(suggestions::dependency_not_found(name, &known_names));
//! ```

use std::path::Path;

use crate::defaults::{CONFIG_ENV_VAR, DEFAULT_CONFIG_FILENAME};

/// The configuration file given explicitly does not exist.
pub fn config_not_found(path: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Configuration file not found: {path}\n\n\
         hint: Create a {DEFAULT_CONFIG_FILENAME} file in the repository root\n\
         hint: Use --config to specify a different path\n\
         hint: Set the {CONFIG_ENV_VAR} environment variable",
        path = path.display()
    )
}

/// `eng/Version.Details.xml` is missing from the repository.
pub fn manifest_not_found(path: &str, repo_root: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Could not find {path} in {root}\n\n\
         hint: Use --repo to point at the repository root\n\
         hint: Use --relative-base-path for a repository inside a Virtual Mono Repo",
        root = repo_root.display()
    )
}

/// No dependency with this name exists in the manifest.
pub fn dependency_not_found(name: &str, known: &[&str]) -> anyhow::Error {
    let did_you_mean = find_similar(name, known)
        .map(|s| format!("\nhint: Did you mean '{s}'?"))
        .unwrap_or_default();
    anyhow::anyhow!(
        "No dependency named '{name}' in Version.Details.xml{did_you_mean}\n\n\
         hint: Run 'darc-manifest get' to list the dependencies"
    )
}

/// A value passed to `--type` is neither `product` nor `toolset`.
pub fn unknown_dependency_type(value: &str) -> anyhow::Error {
    let types = ["product", "toolset"];
    let did_you_mean = find_similar(value, &types)
        .map(|s| format!("\nhint: Did you mean '{s}'?"))
        .unwrap_or_default();
    anyhow::anyhow!(
        "Unknown dependency type: {value}{did_you_mean}\n\n\
         Valid types are: {}",
        types.join(", ")
    )
}

/// Case-insensitive closest candidate within an edit distance of 2.
fn find_similar<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    let input = input.to_lowercase();
    candidates
        .iter()
        .map(|candidate| (*candidate, edit_distance(&input, &candidate.to_lowercase())))
        .filter(|(_, distance)| *distance <= 2 && *distance < input.chars().count())
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}

/// Levenshtein distance, computed one row at a time.
fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();

    for (i, ca) in a.chars().enumerate() {
        let mut current = vec![i + 1; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != *cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        previous = current;
    }

    previous[b.len()]
}
