//! # Version.Details.xml parsing
//!
//! Turns the dependency manifest into a typed [`VersionDetails`]:
//!
//! ```xml
//! <Dependencies>
//!   <Source Uri="..." Mapping="runtime" Sha="..." BarId="123" />
//!   <ProductDependencies>
//!     <Dependency Name="Foo" Version="1.0.0" Pinned="true">
//!       <Uri>https://github.com/dotnet/foo</Uri>
//!       <Sha>abc123</Sha>
//!       <SourceBuild RepoName="foo" ManagedOnly="true" />
//!     </Dependency>
//!   </ProductDependencies>
//!   <ToolsetDependencies />
//! </Dependencies>
//! ```
//!
//! Malformed content is always reported with the offending tag, attribute or
//! value and is never silently corrected.

use crate::error::{Error, Result};
use crate::models::{DependencyDetail, DependencyType, SourceBuildInfo, SourceDependency, VersionDetails};
use crate::xml::{Document, Node};

pub const DEPENDENCIES_ELEMENT: &str = "Dependencies";
pub const DEPENDENCY_ELEMENT: &str = "Dependency";
pub const SOURCE_ELEMENT: &str = "Source";
pub const URI_ELEMENT: &str = "Uri";
pub const SHA_ELEMENT: &str = "Sha";
pub const MAPPING_ATTRIBUTE: &str = "Mapping";
pub const BAR_ID_ATTRIBUTE: &str = "BarId";
pub const NAME_ATTRIBUTE: &str = "Name";
pub const VERSION_ATTRIBUTE: &str = "Version";
pub const PINNED_ATTRIBUTE: &str = "Pinned";
pub const SKIP_PROPERTY_ATTRIBUTE: &str = "SkipProperty";
pub const COHERENT_PARENT_ATTRIBUTE: &str = "CoherentParentDependency";
pub const SOURCE_BUILD_ELEMENT: &str = "SourceBuild";
pub const SOURCE_BUILD_OLD_ELEMENT: &str = "SourceBuildTarball";
pub const REPO_NAME_ATTRIBUTE: &str = "RepoName";
pub const MANAGED_ONLY_ATTRIBUTE: &str = "ManagedOnly";
pub const TARBALL_ONLY_ATTRIBUTE: &str = "TarballOnly";

/// Parse raw `Version.Details.xml` text.
pub fn parse_str(content: &str, include_pinned: bool) -> Result<VersionDetails> {
    let document = Document::parse(content)?;
    parse(&document, include_pinned)
}

/// Parse a loaded `Version.Details.xml` document.
///
/// With `include_pinned` false, pinned dependencies are dropped from the
/// result after the whole manifest has been parsed and validated.
pub fn parse(document: &Document, include_pinned: bool) -> Result<VersionDetails> {
    let root = document.root_element().ok_or(Error::EmptyManifest)?;

    let mut dependencies = Vec::new();
    let mut source = None;

    for child in document.child_elements(root) {
        let name = document.local_name(child).unwrap_or_default();
        if name == SOURCE_ELEMENT {
            if source.is_some() {
                return Err(Error::MalformedDocument {
                    message: format!("more than one <{}> element", SOURCE_ELEMENT),
                });
            }
            source = Some(parse_source(document, child)?);
            continue;
        }

        let dependency_type =
            DependencyType::from_element_name(name).ok_or_else(|| Error::UnknownDependencyType {
                name: name.to_string(),
            })?;

        for node in document.child_elements(child) {
            if document.is_named(node, DEPENDENCY_ELEMENT) {
                dependencies.push(parse_dependency(document, node, dependency_type)?);
            }
        }
    }

    if !include_pinned {
        dependencies.retain(|d| !d.pinned);
    }

    Ok(VersionDetails::new(dependencies, source))
}

/// Find the `<Dependency>` element for `name` (case-insensitive), in document order.
pub fn find_dependency_nodes(document: &Document, name: &str) -> Vec<Node> {
    let Some(root) = document.root_element() else {
        return Vec::new();
    };
    document
        .descendant_elements(root)
        .into_iter()
        .filter(|node| {
            document.is_named(*node, DEPENDENCY_ELEMENT)
                && document
                    .attribute(*node, NAME_ATTRIBUTE)
                    .is_some_and(|n| n.trim().eq_ignore_ascii_case(name))
        })
        .collect()
}

fn parse_dependency(
    document: &Document,
    node: Node,
    dependency_type: DependencyType,
) -> Result<DependencyDetail> {
    let name = required_attribute(document, node, DEPENDENCY_ELEMENT, NAME_ATTRIBUTE)?;
    let tag = format!("{}[@{}='{}']", DEPENDENCY_ELEMENT, NAME_ATTRIBUTE, name);
    let version = required_attribute(document, node, &tag, VERSION_ATTRIBUTE)?;
    let repo_uri = required_child_text(document, node, &tag, URI_ELEMENT)?;
    let commit = required_child_text(document, node, &tag, SHA_ELEMENT)?;

    let pinned = parse_bool_attribute(document, node, PINNED_ATTRIBUTE)?;
    let skip_property = parse_bool_attribute(document, node, SKIP_PROPERTY_ATTRIBUTE)?;

    let coherent_parent_dependency_name = document
        .attribute(node, COHERENT_PARENT_ATTRIBUTE)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    let source_build = document
        .find_child(node, SOURCE_BUILD_ELEMENT)
        .or_else(|| document.find_child(node, SOURCE_BUILD_OLD_ELEMENT))
        .map(|element| parse_source_build(document, element, &name))
        .transpose()?;

    Ok(DependencyDetail {
        name,
        version,
        commit,
        repo_uri,
        dependency_type,
        pinned,
        skip_property,
        coherent_parent_dependency_name,
        source_build,
        locations: None,
    })
}

fn parse_source_build(document: &Document, node: Node, dependency_name: &str) -> Result<SourceBuildInfo> {
    let repo_name = document
        .attribute(node, REPO_NAME_ATTRIBUTE)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::MissingAttribute {
            tag: format!("{} of '{}'", SOURCE_BUILD_ELEMENT, dependency_name),
            attribute: REPO_NAME_ATTRIBUTE.to_string(),
        })?;

    Ok(SourceBuildInfo {
        repo_name,
        managed_only: parse_bool_attribute(document, node, MANAGED_ONLY_ATTRIBUTE)?,
        tarball_only: parse_bool_attribute(document, node, TARBALL_ONLY_ATTRIBUTE)?,
    })
}

fn parse_source(document: &Document, node: Node) -> Result<SourceDependency> {
    let uri = required_attribute(document, node, SOURCE_ELEMENT, URI_ELEMENT)?;
    let mapping = document
        .attribute(node, MAPPING_ATTRIBUTE)
        .ok_or_else(|| missing(SOURCE_ELEMENT, MAPPING_ATTRIBUTE))?;
    let sha = document
        .attribute(node, SHA_ELEMENT)
        .ok_or_else(|| missing(SOURCE_ELEMENT, SHA_ELEMENT))?;

    let bar_id = match document.attribute(node, BAR_ID_ATTRIBUTE) {
        Some(value) if !value.trim().is_empty() => {
            Some(value.trim().parse::<i64>().map_err(|_| Error::InvalidInteger {
                attribute: BAR_ID_ATTRIBUTE.to_string(),
                value: value.clone(),
            })?)
        }
        _ => None,
    };

    Ok(SourceDependency {
        uri,
        mapping,
        sha,
        bar_id,
    })
}

fn missing(tag: &str, attribute: &str) -> Error {
    Error::MissingAttribute {
        tag: tag.to_string(),
        attribute: attribute.to_string(),
    }
}

fn required_attribute(document: &Document, node: Node, tag: &str, attribute: &str) -> Result<String> {
    document
        .attribute(node, attribute)
        .map(|v| v.trim().to_string())
        .ok_or_else(|| missing(tag, attribute))
}

fn required_child_text(document: &Document, node: Node, tag: &str, element: &str) -> Result<String> {
    document
        .find_child(node, element)
        .map(|child| document.text(child).trim().to_string())
        .ok_or_else(|| missing(tag, element))
}

/// Absent attributes are `false`; anything but `true`/`false` (any case) is an error.
fn parse_bool_attribute(document: &Document, node: Node, attribute: &str) -> Result<bool> {
    match document.attribute(node, attribute) {
        None => Ok(false),
        Some(value) => match value.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(Error::InvalidBoolean {
                attribute: attribute.to_string(),
                value,
            }),
        },
    }
}

/// Render the `<Source>` tag.
///
/// Attribute values are copied as-is with no escaping; callers must supply
/// values that are valid inside a double-quoted attribute. A missing `BarId`
/// is written as an empty attribute.
pub fn serialize_source(source: &SourceDependency) -> String {
    let bar_id = source.bar_id.map(|id| id.to_string()).unwrap_or_default();
    format!(
        "<{} {}=\"{}\" {}=\"{}\" {}=\"{}\" {}=\"{}\" />",
        SOURCE_ELEMENT,
        URI_ELEMENT,
        source.uri,
        MAPPING_ATTRIBUTE,
        source.mapping,
        SHA_ELEMENT,
        source.sha,
        BAR_ID_ATTRIBUTE,
        bar_id
    )
}
