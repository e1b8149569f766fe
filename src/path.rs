//! Well-known manifest paths and property naming rules
//!
//! Every manifest file lives at a fixed, root-relative location. Repositories
//! embedded in a Virtual Mono Repo keep the same layout under a sub-path, so
//! each path can be prefixed by a relative base path joined with `/`.

use std::fmt;

/// Suffix of the primary MSBuild version property.
pub const PACKAGE_VERSION_SUFFIX: &str = "PackageVersion";

/// Suffix of the alternate MSBuild version property.
pub const ALTERNATE_VERSION_SUFFIX: &str = "Version";

/// Conventional NuGet configuration file names, in probe order.
pub const NUGET_CONFIG_NAMES: [&str; 4] = ["NuGet.config", "nuget.config", "NuGet.Config", "nuget.Config"];

/// The manifest files the dependency file manager reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManifestFile {
    /// `eng/Version.Details.xml`
    VersionDetailsXml,
    /// `eng/Versions.props`
    VersionsProps,
    /// `eng/Version.Details.props`
    VersionDetailsProps,
    /// `global.json`
    GlobalJson,
    /// `.config/dotnet-tools.json`
    DotnetToolsJson,
}

impl ManifestFile {
    /// The root-relative path of the file.
    pub fn canonical(self) -> &'static str {
        match self {
            ManifestFile::VersionDetailsXml => "eng/Version.Details.xml",
            ManifestFile::VersionsProps => "eng/Versions.props",
            ManifestFile::VersionDetailsProps => "eng/Version.Details.props",
            ManifestFile::GlobalJson => "global.json",
            ManifestFile::DotnetToolsJson => ".config/dotnet-tools.json",
        }
    }

    /// Whether a missing file is a normal state rather than an error.
    pub fn is_optional(self) -> bool {
        matches!(
            self,
            ManifestFile::VersionDetailsProps | ManifestFile::DotnetToolsJson
        )
    }
}

impl fmt::Display for ManifestFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical())
    }
}

/// Join a relative base path and a root-relative suffix with forward slashes.
///
/// An absent or empty base returns the suffix unchanged.
pub fn join(relative_base_path: Option<&str>, suffix: &str) -> String {
    match relative_base_path.map(|b| b.trim_end_matches('/')) {
        Some(base) if !base.is_empty() => format!("{}/{}", base, suffix),
        _ => suffix.to_string(),
    }
}

/// Resolve the path of a manifest file, optionally under a relative base path.
pub fn resolve(file: ManifestFile, relative_base_path: Option<&str>) -> String {
    join(relative_base_path, file.canonical())
}

/// Resolve every NuGet configuration candidate, in probe order.
pub fn nuget_config_candidates<'a>(
    names: &'a [String],
    relative_base_path: Option<&'a str>,
) -> impl Iterator<Item = String> + 'a {
    names.iter().map(move |name| join(relative_base_path, name))
}

/// The sources path of a repository mapped into a Virtual Mono Repo.
pub fn vmr_sources_path(mapping: &str) -> String {
    format!("src/{}", mapping)
}

fn strip_separators(dependency_name: &str) -> String {
    dependency_name.replace(['.', '-'], "")
}

/// Name of the primary version property, e.g. `MicrosoftNETSdkPackageVersion`.
pub fn package_version_property_name(dependency_name: &str) -> String {
    strip_separators(dependency_name) + PACKAGE_VERSION_SUFFIX
}

/// Name of the alternate version property, e.g. `MicrosoftNETSdkVersion`.
pub fn alternate_version_property_name(dependency_name: &str) -> String {
    strip_separators(dependency_name) + ALTERNATE_VERSION_SUFFIX
}

/// Name of the `global.json` element for a dependency.
pub fn global_json_element_name(dependency_name: &str) -> &str {
    dependency_name
}

/// Name of the `dotnet-tools.json` tool entry for a dependency.
pub fn dotnet_tools_element_name(dependency_name: &str) -> &str {
    dependency_name
}
