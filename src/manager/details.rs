//! In-place edits of `Version.Details.xml`

use crate::error::{Error, Result};
use crate::models::{DependencyDetail, SourceDependency};
use crate::parser::{
    find_dependency_nodes, serialize_source, BAR_ID_ATTRIBUTE, COHERENT_PARENT_ATTRIBUTE,
    DEPENDENCY_ELEMENT, MANAGED_ONLY_ATTRIBUTE, MAPPING_ATTRIBUTE, NAME_ATTRIBUTE,
    PINNED_ATTRIBUTE, REPO_NAME_ATTRIBUTE, SHA_ELEMENT, SKIP_PROPERTY_ATTRIBUTE,
    SOURCE_BUILD_ELEMENT, SOURCE_ELEMENT, TARBALL_ONLY_ATTRIBUTE, URI_ELEMENT,
    VERSION_ATTRIBUTE,
};
use crate::xml::{Document, Node};

fn root(document: &Document) -> Result<Node> {
    document.root_element().ok_or(Error::EmptyManifest)
}

/// Set the text of the `name` child, appending the child if it is missing.
pub(crate) fn set_child_text(document: &mut Document, parent: Node, name: &str, value: &str) -> Result<()> {
    match document.find_child(parent, name) {
        Some(child) => document.set_text(child, value),
        None => {
            let child = document.create_text_element(name, value)?;
            document.append_indented(parent, child)
        }
    }
}

/// Update the identifying fields of an existing `<Dependency>` element.
pub(crate) fn update_dependency_node(
    document: &mut Document,
    node: Node,
    dependency: &DependencyDetail,
) -> Result<()> {
    document.set_attribute(node, VERSION_ATTRIBUTE, &dependency.version);
    document.set_attribute(node, NAME_ATTRIBUTE, &dependency.name);
    set_child_text(document, node, SHA_ELEMENT, &dependency.commit)?;
    set_child_text(document, node, URI_ELEMENT, &dependency.repo_uri)
}

/// The category element for the dependency's type, created at the end of the root if missing.
fn category_node(document: &mut Document, dependency: &DependencyDetail) -> Result<Node> {
    let root = root(document)?;
    let name = dependency.dependency_type.element_name();
    if let Some(node) = document.find_child(root, name) {
        return Ok(node);
    }
    let node = document.create_element(name);
    document.append_indented(root, node)?;
    Ok(node)
}

/// Append a new `<Dependency>` element to its category.
pub(crate) fn add_dependency_node(document: &mut Document, dependency: &DependencyDetail) -> Result<Node> {
    let category = category_node(document, dependency)?;

    let node = document.create_element(DEPENDENCY_ELEMENT);
    document.set_attribute(node, NAME_ATTRIBUTE, &dependency.name);
    document.set_attribute(node, VERSION_ATTRIBUTE, &dependency.version);
    if dependency.pinned {
        document.set_attribute(node, PINNED_ATTRIBUTE, "True");
    }
    if dependency.skip_property {
        document.set_attribute(node, SKIP_PROPERTY_ATTRIBUTE, "True");
    }
    if let Some(parent) = &dependency.coherent_parent_dependency_name {
        document.set_attribute(node, COHERENT_PARENT_ATTRIBUTE, parent);
    }
    document.append_indented(category, node)?;

    let uri = document.create_text_element(URI_ELEMENT, &dependency.repo_uri)?;
    document.append_indented(node, uri)?;
    let sha = document.create_text_element(SHA_ELEMENT, &dependency.commit)?;
    document.append_indented(node, sha)?;

    if let Some(source_build) = &dependency.source_build {
        let element = document.create_element(SOURCE_BUILD_ELEMENT);
        document.set_attribute(element, REPO_NAME_ATTRIBUTE, &source_build.repo_name);
        if source_build.managed_only {
            document.set_attribute(element, MANAGED_ONLY_ATTRIBUTE, "true");
        }
        if source_build.tarball_only {
            document.set_attribute(element, TARBALL_ONLY_ATTRIBUTE, "true");
        }
        document.append_indented(node, element)?;
    }

    Ok(node)
}

/// Add or update the `<Source>` element.
///
/// Attributes come from the raw `<Source>` rendering, so a missing `BarId`
/// is written as an empty attribute.
pub(crate) fn upsert_source(document: &mut Document, source: &SourceDependency) -> Result<()> {
    let rendered = Document::parse(&serialize_source(source))?;
    let rendered_root = rendered.root_element().ok_or_else(|| Error::MalformedDocument {
        message: format!("could not render <{}> element", SOURCE_ELEMENT),
    })?;

    let root = root(document)?;
    let node = match document.find_child(root, SOURCE_ELEMENT) {
        Some(node) => node,
        None => {
            let node = document.create_element(SOURCE_ELEMENT);
            document.prepend_indented(root, node)?;
            node
        }
    };

    for attribute in [URI_ELEMENT, MAPPING_ATTRIBUTE, SHA_ELEMENT, BAR_ID_ATTRIBUTE] {
        let value = rendered.attribute(rendered_root, attribute).unwrap_or_default();
        document.set_attribute(node, attribute, &value);
    }
    Ok(())
}

/// Apply a bulk update to existing entries.
///
/// Every item must match exactly one unpinned `<Dependency>` (case-insensitive).
pub(crate) fn update_version_details(
    document: &mut Document,
    items: &[DependencyDetail],
    source: Option<&SourceDependency>,
) -> Result<()> {
    if let Some(source) = source {
        upsert_source(document, source)?;
    }

    for item in items {
        item.validate()?;

        if item.pinned {
            return Err(Error::Dependency {
                message: format!(
                    "An attempt to update pinned dependency '{}' was made",
                    item.name
                ),
            });
        }

        let nodes = find_dependency_nodes(document, &item.name);
        match nodes.as_slice() {
            [node] => update_dependency_node(document, *node, item)?,
            [] => {
                return Err(Error::Dependency {
                    message: format!("No dependencies named '{}' found.", item.name),
                })
            }
            _ => {
                return Err(Error::Dependency {
                    message: format!(
                        "The use of the same asset '{}', even with a different version, is currently not supported.",
                        item.name
                    ),
                })
            }
        }
    }
    Ok(())
}
