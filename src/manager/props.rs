//! Version properties in `eng/Versions.props`

use log::debug;

use crate::error::Result;
use crate::models::DependencyDetail;
use crate::path::{
    alternate_version_property_name, package_version_property_name, ALTERNATE_VERSION_SUFFIX,
    PACKAGE_VERSION_SUFFIX,
};
use crate::xml::{Document, Node};

pub(crate) const PROPERTY_GROUP_ELEMENT: &str = "PropertyGroup";

/// Comment written above a property group created for new properties.
const NEW_GROUP_COMMENT: &str = "Package versions";

fn property_groups(document: &Document) -> Vec<Node> {
    match document.root_element() {
        Some(root) => std::iter::once(root)
            .chain(document.descendant_elements(root))
            .filter(|node| document.is_named(*node, PROPERTY_GROUP_ELEMENT))
            .collect(),
        None => Vec::new(),
    }
}

fn find_property(document: &Document, property: &str) -> Option<Node> {
    property_groups(document)
        .into_iter()
        .flat_map(|group| document.child_elements(group))
        .find(|node| document.is_named_ignore_case(*node, property))
}

/// The property holding a dependency's version, with the name it should have.
///
/// The primary `<NamePackageVersion>` wins over the alternate `<NameVersion>`.
/// Within each, the first match in document order is returned and names are
/// compared case-insensitively.
pub fn find_version_property(document: &Document, dependency_name: &str) -> Option<(Node, String)> {
    [
        package_version_property_name(dependency_name),
        alternate_version_property_name(dependency_name),
    ]
    .into_iter()
    .find_map(|property| find_property(document, &property).map(|node| (node, property)))
}

/// The element holding a dependency's version, if any.
pub fn version_props_node(document: &Document, dependency_name: &str) -> Option<Node> {
    find_version_property(document, dependency_name).map(|(node, _)| node)
}

/// Set the version of an existing property, fixing its casing if needed.
///
/// Returns `false` when the dependency has no property.
pub fn update_version_property(document: &mut Document, dependency: &DependencyDetail) -> Result<bool> {
    let Some((node, expected)) = find_version_property(document, &dependency.name) else {
        return Ok(false);
    };

    if document.local_name(node) == Some(expected.as_str()) {
        document.set_text(node, &dependency.version)?;
    } else {
        debug!("Fixing casing of property {}", expected);
        let replacement = document.create_text_element(&expected, &dependency.version)?;
        document.replace(node, replacement)?;
    }
    Ok(true)
}

/// Update the dependency's property, or add one next to properties of the same style.
///
/// A new property goes into the first property group whose first
/// version-like child ends in `PackageVersion` (primary name) or `Version`
/// (alternate name). Without such a group, a new commented group holding
/// the primary name is appended to the project.
pub fn upsert_version_property(document: &mut Document, dependency: &DependencyDetail) -> Result<()> {
    if update_version_property(document, dependency)? {
        return Ok(());
    }

    for group in property_groups(document) {
        let style = document.child_elements(group).into_iter().find_map(|child| {
            let name = document.local_name(child)?;
            if name.ends_with(PACKAGE_VERSION_SUFFIX) {
                Some(package_version_property_name(&dependency.name))
            } else if name.ends_with(ALTERNATE_VERSION_SUFFIX) {
                Some(alternate_version_property_name(&dependency.name))
            } else {
                None
            }
        });

        if let Some(property) = style {
            let node = document.create_text_element(&property, &dependency.version)?;
            return document.append_indented(group, node);
        }
    }

    let Some(root) = document.root_element() else {
        return Ok(());
    };
    let comment = document.create_comment(NEW_GROUP_COMMENT);
    document.append_indented(root, comment)?;
    let group = document.create_element(PROPERTY_GROUP_ELEMENT);
    document.append_indented(root, group)?;
    let node = document.create_text_element(
        &package_version_property_name(&dependency.name),
        &dependency.version,
    )?;
    document.append_indented(group, node)
}

/// Remove the dependency's property. Returns `false` when there was none.
pub fn remove_version_property(document: &mut Document, dependency_name: &str) -> Result<bool> {
    match version_props_node(document, dependency_name) {
        Some(node) => {
            document.remove(node)?;
            Ok(true)
        }
        None => Ok(false),
    }
}
