//! Dependency manifest data model

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Category a dependency belongs to in `Version.Details.xml`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DependencyType {
    #[default]
    Product,
    Toolset,
}

impl DependencyType {
    /// Name of the category element, e.g. `ProductDependencies`.
    pub fn element_name(self) -> &'static str {
        match self {
            DependencyType::Product => "ProductDependencies",
            DependencyType::Toolset => "ToolsetDependencies",
        }
    }

    /// Map a category element name back to its type.
    pub fn from_element_name(name: &str) -> Option<Self> {
        match name {
            "ProductDependencies" => Some(DependencyType::Product),
            "ToolsetDependencies" => Some(DependencyType::Toolset),
            _ => None,
        }
    }
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependencyType::Product => f.write_str("Product"),
            DependencyType::Toolset => f.write_str("Toolset"),
        }
    }
}

impl FromStr for DependencyType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "product" => Ok(DependencyType::Product),
            "toolset" => Ok(DependencyType::Toolset),
            _ => Err(Error::UnknownDependencyType {
                name: s.to_string(),
            }),
        }
    }
}

/// Source-build metadata attached to a dependency.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceBuildInfo {
    pub repo_name: String,
    pub managed_only: bool,
    pub tarball_only: bool,
}

/// One upstream dependency pin.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DependencyDetail {
    pub name: String,
    pub version: String,
    /// Commit SHA of the upstream build.
    pub commit: String,
    pub repo_uri: String,
    pub dependency_type: DependencyType,
    /// Excluded from automatic version-flow updates.
    pub pinned: bool,
    /// Tracked in `Version.Details.xml` only; no MSBuild properties are written.
    pub skip_property: bool,
    pub coherent_parent_dependency_name: Option<String>,
    pub source_build: Option<SourceBuildInfo>,
    /// Feeds the asset was published to.
    pub locations: Option<Vec<String>>,
}

impl DependencyDetail {
    /// Create a product dependency with the identifying fields set.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        commit: impl Into<String>,
        repo_uri: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            commit: commit.into(),
            repo_uri: repo_uri.into(),
            ..Self::default()
        }
    }

    pub fn with_type(mut self, dependency_type: DependencyType) -> Self {
        self.dependency_type = dependency_type;
        self
    }

    pub fn pinned(mut self, pinned: bool) -> Self {
        self.pinned = pinned;
        self
    }

    pub fn skip_property(mut self, skip_property: bool) -> Self {
        self.skip_property = skip_property;
        self
    }

    pub fn with_locations<I, S>(mut self, locations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.locations = Some(locations.into_iter().map(Into::into).collect());
        self
    }

    /// Case-insensitive name comparison.
    pub fn has_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Whether `other` pins exactly the same build of the same dependency.
    pub fn is_same_pin(&self, other: &DependencyDetail) -> bool {
        self.has_name(&other.name)
            && self.version == other.version
            && self.repo_uri == other.repo_uri
            && self.commit == other.commit
    }

    /// Reject details that cannot be written to the manifest.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("Name", &self.name),
            ("Version", &self.version),
            ("Commit", &self.commit),
            ("RepoUri", &self.repo_uri),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(Error::Dependency {
                    message: format!(
                        "Dependency '{}' has an empty '{}' field",
                        self.name, field
                    ),
                });
            }
        }
        Ok(())
    }
}

impl fmt::Display for DependencyDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} from {}@{}", self.name, self.version, self.repo_uri, self.commit)
    }
}

/// VMR provenance record stored in the `<Source>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDependency {
    pub uri: String,
    pub mapping: String,
    pub sha: String,
    pub bar_id: Option<i64>,
}

impl SourceDependency {
    pub fn new(
        uri: impl Into<String>,
        mapping: impl Into<String>,
        sha: impl Into<String>,
        bar_id: Option<i64>,
    ) -> Self {
        Self {
            uri: uri.into(),
            mapping: mapping.into(),
            sha: sha.into(),
            bar_id,
        }
    }
}

/// A snapshot of `Version.Details.xml`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VersionDetails {
    pub dependencies: Vec<DependencyDetail>,
    pub source: Option<SourceDependency>,
}

impl VersionDetails {
    pub fn new(dependencies: Vec<DependencyDetail>, source: Option<SourceDependency>) -> Self {
        Self {
            dependencies,
            source,
        }
    }

    /// Find a dependency by case-insensitive name.
    pub fn find(&self, name: &str) -> Option<&DependencyDetail> {
        self.dependencies.iter().find(|d| d.has_name(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependency_type_element_names() {
        assert_eq!(DependencyType::Product.element_name(), "ProductDependencies");
        assert_eq!(
            DependencyType::from_element_name("ToolsetDependencies"),
            Some(DependencyType::Toolset)
        );
        assert_eq!(DependencyType::from_element_name("Dependencies"), None);
    }

    #[test]
    fn test_dependency_type_from_str() {
        assert_eq!("toolset".parse::<DependencyType>().unwrap(), DependencyType::Toolset);
        assert_eq!("Product".parse::<DependencyType>().unwrap(), DependencyType::Product);
        assert!("other".parse::<DependencyType>().is_err());
    }

    #[test]
    fn test_is_same_pin_ignores_name_case() {
        let a = DependencyDetail::new("Foo", "1.0.0", "abc", "https://github.com/dotnet/foo");
        let b = DependencyDetail::new("foo", "1.0.0", "abc", "https://github.com/dotnet/foo");
        assert!(a.is_same_pin(&b));
        let c = DependencyDetail::new("foo", "1.0.1", "abc", "https://github.com/dotnet/foo");
        assert!(!a.is_same_pin(&c));
    }

    #[test]
    fn test_validate_rejects_empty_fields() {
        let valid = DependencyDetail::new("Foo", "1.0.0", "abc", "uri");
        assert!(valid.validate().is_ok());
        let invalid = DependencyDetail::new("Foo", "", "abc", "uri");
        let error = invalid.validate().unwrap_err();
        assert!(error.to_string().contains("'Version'"));
    }

    #[test]
    fn test_version_details_find() {
        let details = VersionDetails::new(
            vec![DependencyDetail::new("Foo", "1.0.0", "abc", "uri")],
            None,
        );
        assert!(details.find("FOO").is_some());
        assert!(details.find("Bar").is_none());
    }
}
