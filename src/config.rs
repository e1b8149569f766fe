//! # Configuration
//!
//! Optional `.darc-manifest.yaml` settings for the `darc-manifest` tool:
//!
//! ```yaml
//! # Sub-path of the repository inside a Virtual Mono Repo
//! relative_base_path: src/runtime
//! # Skip probing for eng/Version.Details.props
//! version_details_props: true
//! # Only ever write eng/Version.Details.xml
//! version_details_only: false
//! # NuGet configuration names to probe, in order
//! nuget_config_names:
//!   - NuGet.config
//! ```
//!
//! Every key is optional. A missing file yields [`Settings::default`];
//! command-line flags override whatever the file says.

use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::manager::ManifestOptions;

/// Settings read from `.darc-manifest.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Sub-path of the repository inside a Virtual Mono Repo.
    pub relative_base_path: Option<String>,
    /// Force the layout instead of probing for `eng/Version.Details.props`.
    pub version_details_props: Option<bool>,
    /// Only write `eng/Version.Details.xml` on add.
    pub version_details_only: bool,
    /// NuGet configuration names to probe, in order.
    pub nuget_config_names: Option<Vec<String>>,
}

impl Settings {
    /// The add/remove options these settings describe.
    pub fn manifest_options(&self) -> ManifestOptions {
        ManifestOptions {
            relative_base_path: self.relative_base_path.clone(),
            version_details_only: self.version_details_only,
            version_details_props: self.version_details_props,
        }
    }
}

/// Parse settings from YAML text. Empty text yields the defaults.
pub fn parse(yaml_content: &str) -> Result<Settings> {
    if yaml_content.trim().is_empty() {
        return Ok(Settings::default());
    }
    serde_yaml::from_str(yaml_content).map_err(Error::Yaml)
}

/// Read settings from a file.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let content = std::fs::read_to_string(path).map_err(Error::Io)?;
    parse(&content)
}

/// Read settings from `path` if it exists, otherwise return the defaults.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path = path.as_ref();
    if !path.exists() {
        debug!("No configuration at {}, using defaults", path.display());
        return Ok(Settings::default());
    }
    debug!("Loading configuration from {}", path.display());
    from_file(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
relative_base_path: src/runtime
version_details_props: true
version_details_only: true
nuget_config_names:
  - nuget.config
"#;
        let settings = parse(yaml).unwrap();
        assert_eq!(settings.relative_base_path.as_deref(), Some("src/runtime"));
        assert_eq!(settings.version_details_props, Some(true));
        assert!(settings.version_details_only);
        assert_eq!(settings.nuget_config_names, Some(vec!["nuget.config".to_string()]));

        let options = settings.manifest_options();
        assert_eq!(options.relative_base_path.as_deref(), Some("src/runtime"));
        assert!(options.version_details_only);
        assert_eq!(options.version_details_props, Some(true));
    }

    #[test]
    fn test_parse_partial_and_empty_config() {
        let settings = parse("version_details_only: true\n").unwrap();
        assert!(settings.relative_base_path.is_none());
        assert!(settings.version_details_only);

        assert_eq!(parse("").unwrap(), Settings::default());
        assert_eq!(parse("   \n").unwrap(), Settings::default());
    }

    #[test]
    fn test_parse_rejects_malformed_yaml() {
        let result = parse("version_details_only: [unclosed");
        assert!(matches!(result, Err(Error::Yaml(_))));
    }

    #[test]
    fn test_parse_rejects_unknown_keys() {
        assert!(matches!(parse("cache_root: /tmp\n"), Err(Error::Yaml(_))));
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load(dir.path().join(".darc-manifest.yaml")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_load_existing_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "relative_base_path: src/aspnetcore").unwrap();
        let settings = load(file.path()).unwrap();
        assert_eq!(settings.relative_base_path.as_deref(), Some("src/aspnetcore"));
    }
}
