//! Consistency checks across the manifest files

use std::collections::{BTreeSet, HashSet};

use log::{error, warn};
use regex::Regex;
use serde_json::Value;

use super::{json, props, DependencyFileManager, Layout, ReadResult};
use crate::error::Result;
use crate::models::DependencyDetail;
use crate::xml::Document;

const CONDITION_ATTRIBUTES: [&str; 2] = ["Condition", "condition"];
const VERSION_PROPERTY: &str = "version";

/// Property names that appear twice in the same MSBuild condition.
///
/// `FooPackageVersion` and `FooVersion` count as the same property.
fn duplicated_properties(document: &Document) -> Result<Vec<String>> {
    let package_version = Regex::new("PackageVersion$")?;
    let version = Regex::new("Version$")?;

    let Some(root) = document.root_element() else {
        return Ok(Vec::new());
    };

    let mut seen = HashSet::new();
    let mut duplicated = Vec::new();
    for group in document
        .descendant_elements(root)
        .into_iter()
        .filter(|node| document.is_named(*node, props::PROPERTY_GROUP_ELEMENT))
    {
        for property in document.child_elements(group) {
            let Some(name) = document.local_name(property) else {
                continue;
            };
            let mut key = package_version.replace(name, "").into_owned();
            key = version.replace(&key, "").into_owned();
            for attribute in CONDITION_ATTRIBUTES {
                if let Some(condition) = document.attribute(property, attribute) {
                    key.push_str(&condition);
                }
            }
            if !seen.insert(key) {
                duplicated.push(name.to_string());
            }
        }
    }
    Ok(duplicated)
}

fn duplicated_dependencies(dependencies: &[DependencyDetail]) -> Vec<String> {
    let mut seen = HashSet::new();
    dependencies
        .iter()
        .filter(|d| !seen.insert(d.name.to_ascii_lowercase()))
        .map(|d| d.name.clone())
        .collect()
}

/// Check that every dependency's property carries its version and expected casing.
///
/// Returns whether all properties match, plus the dependencies that have one.
fn check_version_props(document: &Document, dependencies: &[DependencyDetail]) -> (bool, BTreeSet<String>) {
    let mut ok = true;
    let mut utilized = BTreeSet::new();
    for dependency in dependencies {
        let Some((node, expected)) = props::find_version_property(document, &dependency.name) else {
            continue;
        };
        utilized.insert(dependency.name.clone());

        let actual = document.local_name(node).unwrap_or_default();
        if actual != expected {
            error!(
                "The casing of property '{}' does not match the expected name '{}'",
                actual, expected
            );
            ok = false;
        }
        let version = document.text(node);
        if version.trim() != dependency.version {
            error!(
                "Version of '{}' is '{}' in the props file but '{}' in Version.Details.xml",
                dependency.name, version, dependency.version
            );
            ok = false;
        }
    }
    (ok, utilized)
}

fn check_global_json(global_json: &Value, dependencies: &[DependencyDetail]) -> (bool, BTreeSet<String>) {
    let mut ok = true;
    let mut utilized = BTreeSet::new();
    for dependency in dependencies {
        let Some((key, value)) = json::find_json_property(global_json, &dependency.name) else {
            continue;
        };
        utilized.insert(dependency.name.clone());

        let Some(version) = value.as_str() else {
            error!("The value of '{}' in global.json is not a string", key);
            ok = false;
            continue;
        };
        if key != dependency.name {
            error!(
                "The casing of '{}' in global.json does not match the dependency name '{}'",
                key, dependency.name
            );
            ok = false;
        }
        if version != dependency.version {
            error!(
                "Version of '{}' is '{}' in global.json but '{}' in Version.Details.xml",
                dependency.name, version, dependency.version
            );
            ok = false;
        }
    }
    (ok, utilized)
}

fn check_dotnet_tools(tools: &Value, dependencies: &[DependencyDetail]) -> bool {
    let mut ok = true;
    for dependency in dependencies {
        let Some((key, entry)) = json::find_dotnet_tool(tools, &dependency.name) else {
            continue;
        };
        let Some(version) = entry.get(VERSION_PROPERTY).and_then(Value::as_str) else {
            error!("Tool '{}' in dotnet-tools.json has no version", key);
            ok = false;
            continue;
        };
        if key != dependency.name {
            error!(
                "The casing of tool '{}' does not match the dependency name '{}'",
                key, dependency.name
            );
            ok = false;
        }
        if version != dependency.version {
            error!(
                "Version of tool '{}' is '{}' in dotnet-tools.json but '{}' in Version.Details.xml",
                key, version, dependency.version
            );
            ok = false;
        }
    }
    ok
}

impl DependencyFileManager {
    /// Check that the manifest files agree with each other.
    ///
    /// Every failed check is logged. Unreadable files count as a failure.
    pub fn verify(&self, repo_uri: &str, branch: &str, relative_base_path: Option<&str>) -> bool {
        match self.verify_files(repo_uri, branch, relative_base_path) {
            Ok(ok) => ok,
            Err(e) => {
                error!("Failed to read the manifest files: {}", e);
                false
            }
        }
    }

    fn verify_files(&self, repo_uri: &str, branch: &str, base: Option<&str>) -> Result<bool> {
        let details = self.parse_version_details_xml(repo_uri, branch, true, base)?;
        let layout = self.layout(repo_uri, branch, base, None)?;
        let props_document = match layout {
            Layout::Standard => self.read_version_props(repo_uri, branch, base)?,
            Layout::VirtualMonoRepo => {
                match self.read_version_details_props(repo_uri, branch, base)? {
                    ReadResult::Found(document) => document,
                    ReadResult::Absent => self.read_version_props(repo_uri, branch, base)?,
                }
            }
        };
        let global_json = self.read_global_json(repo_uri, branch, base)?;
        let dotnet_tools = self.read_dotnet_tools_json(repo_uri, branch, base)?;

        let dependencies = &details.dependencies;
        let mut ok = true;

        // Generated props pair every primary property with its alternate.
        if layout == Layout::Standard {
            for name in duplicated_properties(&props_document)? {
                error!("Property '{}' is defined more than once", name);
                ok = false;
            }
        }

        for name in duplicated_dependencies(dependencies) {
            error!("Dependency '{}' is defined more than once in Version.Details.xml", name);
            ok = false;
        }

        let (props_ok, mut utilized) = check_version_props(&props_document, dependencies);
        ok &= props_ok;

        let (global_ok, global_utilized) = check_global_json(&global_json, dependencies);
        ok &= global_ok;
        utilized.extend(global_utilized);

        for dependency in dependencies
            .iter()
            .filter(|d| !d.skip_property && !utilized.contains(&d.name))
        {
            warn!(
                "Dependency '{}' has no version property and is not referenced in global.json",
                dependency.name
            );
            ok = false;
        }

        if let ReadResult::Found(tools) = dotnet_tools {
            ok &= check_dotnet_tools(&tools, dependencies);
        }

        Ok(ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicated_properties_by_condition() {
        let document = Document::parse(
            r#"<Project>
  <PropertyGroup>
    <FooPackageVersion>1</FooPackageVersion>
    <FooVersion>1</FooVersion>
    <BarVersion Condition="'$(X)' == ''">1</BarVersion>
    <BarVersion Condition="'$(X)' != ''">2</BarVersion>
  </PropertyGroup>
</Project>"#,
        )
        .unwrap();
        assert_eq!(duplicated_properties(&document).unwrap(), vec!["FooVersion".to_string()]);
    }

    #[test]
    fn test_duplicated_dependencies_case_insensitive() {
        let dependencies = vec![
            DependencyDetail::new("Foo", "1", "s", "u"),
            DependencyDetail::new("foo", "2", "s", "u"),
            DependencyDetail::new("Bar", "1", "s", "u"),
        ];
        assert_eq!(duplicated_dependencies(&dependencies), vec!["foo".to_string()]);
    }

    #[test]
    fn test_check_version_props_casing_and_version() {
        let document = Document::parse(
            "<Project>\n  <PropertyGroup>\n    <fooPackageVersion>1.0.0</fooPackageVersion>\n    <BarVersion>2.0.0</BarVersion>\n  </PropertyGroup>\n</Project>",
        )
        .unwrap();
        let foo = DependencyDetail::new("Foo", "1.0.0", "s", "u");
        let bar = DependencyDetail::new("Bar", "2.0.0", "s", "u");
        let (ok, utilized) = check_version_props(&document, &[bar.clone()]);
        assert!(ok);
        assert!(utilized.contains("Bar"));

        let (ok, utilized) = check_version_props(&document, &[foo, bar]);
        assert!(!ok);
        assert_eq!(utilized.len(), 2);
    }

    #[test]
    fn test_check_global_json() {
        let global_json = serde_json::json!({
            "msbuild-sdks": { "Microsoft.DotNet.Arcade.Sdk": "1.0.0" }
        });
        let arcade = DependencyDetail::new("Microsoft.DotNet.Arcade.Sdk", "1.0.0", "s", "u");
        let (ok, utilized) = check_global_json(&global_json, &[arcade]);
        assert!(ok);
        assert_eq!(utilized.len(), 1);

        let stale = DependencyDetail::new("Microsoft.DotNet.Arcade.Sdk", "2.0.0", "s", "u");
        assert!(!check_global_json(&global_json, &[stale]).0);

        let cased = DependencyDetail::new("microsoft.dotnet.arcade.sdk", "1.0.0", "s", "u");
        assert!(!check_global_json(&global_json, &[cased]).0);
    }

    #[test]
    fn test_check_dotnet_tools() {
        let tools = serde_json::json!({ "tools": { "foo": { "version": "1.0.0" } } });
        assert!(check_dotnet_tools(&tools, &[DependencyDetail::new("foo", "1.0.0", "s", "u")]));
        assert!(!check_dotnet_tools(&tools, &[DependencyDetail::new("Foo", "1.0.0", "s", "u")]));
        assert!(!check_dotnet_tools(&tools, &[DependencyDetail::new("foo", "2.0.0", "s", "u")]));
        assert!(check_dotnet_tools(&tools, &[DependencyDetail::new("bar", "1.0.0", "s", "u")]));
    }
}
