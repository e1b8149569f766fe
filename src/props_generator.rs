//! Generation of `eng/Version.Details.props`
//!
//! In repositories that import a generated props file, the whole file is
//! rebuilt from `Version.Details.xml` on every change instead of being edited
//! in place. The output holds one property group with the primary
//! `<NamePackageVersion>` properties and one with the alternate
//! `<NameVersion>$(NamePackageVersion)</NameVersion>` back-references.
//! Both are split into per-repository blocks introduced by a
//! `<!-- owner/repo dependencies -->` comment.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use url::Url;

use crate::error::Result;
use crate::models::{DependencyDetail, VersionDetails};
use crate::path::{alternate_version_property_name, package_version_property_name};
use crate::xml::Document;

/// Header written above the `<Project>` element.
pub const GENERATED_HEADER: &str = "<!--
This file is auto-generated by the Maestro dependency flow system.
Do not edit it manually, as it will get overwritten by automation.
This file should be imported by eng/Versions.props
-->";

/// Comment that introduces the alternate property group.
pub const ALTERNATE_GROUP_COMMENT: &str = "Property group for alternate package version names";

/// The `owner/repo` key for a repository URI: its last two path segments.
///
/// Query and fragment of a URL are ignored. Anything that does not parse as
/// a hierarchical URL, such as a local path, is split on `/`.
pub fn repository_key(repo_uri: &str) -> String {
    let from_url = Url::parse(repo_uri).ok().and_then(|url| {
        url.path_segments().map(|segments| {
            segments
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
    });
    let segments = from_url.unwrap_or_else(|| {
        repo_uri
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect()
    });
    let start = segments.len().saturating_sub(2);
    segments[start..].join("/")
}

/// Dependencies grouped by repository key, each group sorted by name (ordinal).
fn group_by_repository(details: &VersionDetails) -> BTreeMap<String, Vec<&DependencyDetail>> {
    let mut groups: BTreeMap<String, Vec<&DependencyDetail>> = BTreeMap::new();
    for dependency in &details.dependencies {
        groups
            .entry(repository_key(&dependency.repo_uri))
            .or_default()
            .push(dependency);
    }
    for dependencies in groups.values_mut() {
        dependencies.sort_by(|a, b| a.name.cmp(&b.name));
    }
    groups
}

fn escape_text(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn write_group<F>(out: &mut String, groups: &BTreeMap<String, Vec<&DependencyDetail>>, property: F)
where
    F: Fn(&DependencyDetail) -> (String, String),
{
    out.push_str("  <PropertyGroup>\n");
    for (key, dependencies) in groups {
        let _ = writeln!(out, "    <!-- {} dependencies -->", key);
        for dependency in dependencies.iter().filter(|d| !d.skip_property) {
            let (name, value) = property(dependency);
            let _ = writeln!(out, "    <{0}>{1}</{0}>", name, escape_text(&value));
        }
    }
    out.push_str("  </PropertyGroup>\n");
}

/// Render the props file text for a manifest snapshot.
pub fn render(details: &VersionDetails) -> String {
    let groups = group_by_repository(details);

    let mut out = String::new();
    out.push_str(GENERATED_HEADER);
    out.push_str("\n<Project>\n");
    write_group(&mut out, &groups, |d| {
        (package_version_property_name(&d.name), d.version.clone())
    });
    let _ = writeln!(out, "  <!--{}-->", ALTERNATE_GROUP_COMMENT);
    write_group(&mut out, &groups, |d| {
        (
            alternate_version_property_name(&d.name),
            format!("$({})", package_version_property_name(&d.name)),
        )
    });
    out.push_str("</Project>\n");
    out
}

/// Build the props document for a manifest snapshot.
///
/// Dependencies marked `SkipProperty` produce no properties, but their
/// repository block (and its comment) is still emitted.
pub fn generate(details: &VersionDetails) -> Result<Document> {
    Document::parse(&render(details))
}
