//! Managed package sources in `NuGet.config`
//!
//! The automation owns a block of `<packageSources>` delimited by two marker
//! comments. Inside it, each repository gets its own pair of comments with
//! one `<add>` per managed feed:
//!
//! ```xml
//! <packageSources>
//!   <clear />
//!   <!--Begin: Package sources managed by Dependency Flow automation. Do not edit the sources below.-->
//!   <!--  Begin: Package sources from dotnet-wpf -->
//!   <add key="darc-pub-dotnet-wpf-abc1234" value="https://..." />
//!   <!--  End: Package sources from dotnet-wpf -->
//!   <!--End: Package sources managed by Dependency Flow automation. Do not edit the sources above.-->
//!   <add key="nuget.org" value="https://api.nuget.org/v3/index.json" />
//! </packageSources>
//! ```
//!
//! Internal feeds are additionally listed in `<disabledPackageSources>` with
//! `value="true"` so that they are skipped unless explicitly enabled.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, error};

use crate::error::Result;
use crate::feeds::{FeedMatcher, INTERNAL_FEED_KEY_PREFIX};
use crate::xml::{Document, Node};

pub const MANAGED_BLOCK_BEGIN: &str =
    "Begin: Package sources managed by Dependency Flow automation. Do not edit the sources below.";
pub const MANAGED_BLOCK_END: &str =
    "End: Package sources managed by Dependency Flow automation. Do not edit the sources above.";

const CONFIGURATION_ELEMENT: &str = "configuration";
const PACKAGE_SOURCES_ELEMENT: &str = "packageSources";
const DISABLED_PACKAGE_SOURCES_ELEMENT: &str = "disabledPackageSources";
const ADD_ELEMENT: &str = "add";
const CLEAR_ELEMENT: &str = "clear";
const KEY_ATTRIBUTE: &str = "key";
const VALUE_ATTRIBUTE: &str = "value";

fn repository_block_begin(repository: &str) -> String {
    format!("  Begin: Package sources from {} ", repository)
}

fn repository_block_end(repository: &str) -> String {
    format!("  End: Package sources from {} ", repository)
}

fn is_marker(document: &Document, node: Node, marker: &str) -> bool {
    document
        .comment_text(node)
        .is_some_and(|text| text.eq_ignore_ascii_case(marker))
}

fn find_marker(document: &Document, parent: Node, marker: &str) -> Option<Node> {
    document
        .children(parent)
        .into_iter()
        .find(|node| is_marker(document, *node, marker))
}

/// Find the marker comment or insert a new one after `after`.
fn find_or_insert_marker(document: &mut Document, parent: Node, after: Node, marker: &str) -> Result<Node> {
    if let Some(existing) = find_marker(document, parent, marker) {
        return Ok(existing);
    }
    let comment = document.create_comment(marker);
    document.insert_after_indented(after, comment)?;
    Ok(comment)
}

fn insert_after_or_first(document: &mut Document, parent: Node, after: Option<Node>, node: Node) -> Result<()> {
    match after {
        Some(after) => document.insert_after_indented(after, node),
        None => document.prepend_indented(parent, node),
    }
}

fn create_add(document: &mut Document, key: &str, value: &str) -> Node {
    let node = document.create_element(ADD_ELEMENT);
    document.set_attribute(node, KEY_ATTRIBUTE, key);
    document.set_attribute(node, VALUE_ATTRIBUTE, value);
    node
}

/// Every `<clear/>`, plus the `<add>` nodes between the managed markers that match `predicate`.
///
/// `predicate` sees every `<add>`; returning `None` aborts the walk.
fn stale_nodes<F>(document: &Document, parent: Node, predicate: F) -> Option<Vec<Node>>
where
    F: Fn(&Document, Node) -> Option<bool>,
{
    let mut within_managed_block = false;
    let mut stale = Vec::new();
    for node in document.children(parent) {
        if is_marker(document, node, MANAGED_BLOCK_BEGIN) {
            within_managed_block = true;
        } else if is_marker(document, node, MANAGED_BLOCK_END) {
            within_managed_block = false;
        } else if document.is_named_ignore_case(node, CLEAR_ELEMENT) {
            stale.push(node);
        } else if document.is_named_ignore_case(node, ADD_ELEMENT)
            && predicate(document, node)?
            && within_managed_block
        {
            stale.push(node);
        }
    }
    Some(stale)
}

/// Rewrite the managed block of `<packageSources>` for the given feed groups.
///
/// Sources outside the marker comments are never touched. A config without
/// `<packageSources>` or with an `<add>` lacking a `value` is logged and left
/// as is.
pub fn update_package_sources(
    document: &mut Document,
    managed_feeds: &BTreeMap<String, BTreeSet<String>>,
    matcher: &FeedMatcher,
) -> Result<()> {
    let Some(configuration) = document
        .root_element()
        .filter(|root| document.is_named(*root, CONFIGURATION_ELEMENT))
    else {
        error!("Did not find a <{}> element in NuGet.config", CONFIGURATION_ELEMENT);
        return Ok(());
    };
    let Some(package_sources) = document.find_child(configuration, PACKAGE_SOURCES_ELEMENT) else {
        error!("Did not find a <{}> element in NuGet.config", PACKAGE_SOURCES_ELEMENT);
        return Ok(());
    };

    let stale = stale_nodes(document, package_sources, |document, node| {
        match document.attribute(node, VALUE_ATTRIBUTE) {
            Some(value) => Some(matcher.is_managed(&value)),
            None => {
                error!("NuGet.config contains an <add> element without a value");
                None
            }
        }
    });
    let Some(stale) = stale else {
        return Ok(());
    };
    for node in stale {
        document.remove(node)?;
    }

    insert_managed_block(document, package_sources, managed_feeds, matcher)?;
    update_disabled_sources(document, configuration, managed_feeds, matcher)
}

fn insert_managed_block(
    document: &mut Document,
    package_sources: Node,
    managed_feeds: &BTreeMap<String, BTreeSet<String>>,
    matcher: &FeedMatcher,
) -> Result<()> {
    let clear = document.create_element(CLEAR_ELEMENT);
    document.prepend_indented(package_sources, clear)?;

    if managed_feeds.is_empty() {
        return Ok(());
    }

    let mut current = find_or_insert_marker(document, package_sources, clear, MANAGED_BLOCK_BEGIN)?;

    for (repository, feeds) in managed_feeds {
        let mut sources = matcher.package_sources(feeds);
        sources.sort_by(|a, b| b.1.cmp(&a.1));

        current = find_or_insert_marker(
            document,
            package_sources,
            current,
            &repository_block_begin(repository),
        )?;
        for (key, feed) in &sources {
            debug!("Adding package source {} -> {}", key, feed);
            let add = create_add(document, key, feed);
            document.insert_after_indented(current, add)?;
            current = add;
        }
        current = find_or_insert_marker(
            document,
            package_sources,
            current,
            &repository_block_end(repository),
        )?;
    }

    find_or_insert_marker(document, package_sources, current, MANAGED_BLOCK_END)?;
    Ok(())
}

fn update_disabled_sources(
    document: &mut Document,
    configuration: Node,
    managed_feeds: &BTreeMap<String, BTreeSet<String>>,
    matcher: &FeedMatcher,
) -> Result<()> {
    let disabled = match document.find_child(configuration, DISABLED_PACKAGE_SOURCES_ELEMENT) {
        Some(node) => node,
        None => {
            let node = document.create_element(DISABLED_PACKAGE_SOURCES_ELEMENT);
            document.append_indented(configuration, node)?;
            node
        }
    };

    let stale = stale_nodes(document, disabled, |document, node| {
        Some(document.attribute(node, KEY_ATTRIBUTE).is_some_and(|key| {
            key.to_ascii_lowercase()
                .starts_with(INTERNAL_FEED_KEY_PREFIX)
        }))
    })
    .unwrap_or_default();
    // Existing <clear/> elements stay in place and anchor the block.
    let mut insert_after = None;
    for node in stale {
        if document.is_named_ignore_case(node, CLEAR_ELEMENT) {
            insert_after = Some(node);
        } else {
            document.remove(node)?;
        }
    }

    let mut begin = find_marker(document, disabled, MANAGED_BLOCK_BEGIN);
    if begin.is_some() {
        insert_after = begin;
    }
    let end = find_marker(document, disabled, MANAGED_BLOCK_END);
    let mut introduced_block = false;

    for (repository, feeds) in managed_feeds {
        let mut sources: Vec<(String, String)> = matcher
            .package_sources(feeds)
            .into_iter()
            .filter(|(key, _)| {
                key.to_ascii_lowercase()
                    .starts_with(INTERNAL_FEED_KEY_PREFIX)
            })
            .collect();
        if sources.is_empty() {
            continue;
        }
        sources.sort_by(|a, b| a.1.cmp(&b.1));

        if begin.is_none() {
            let comment = document.create_comment(MANAGED_BLOCK_BEGIN);
            insert_after_or_first(document, disabled, insert_after, comment)?;
            begin = Some(comment);
            insert_after = Some(comment);
            introduced_block = true;
        }

        let repository_begin = repository_block_begin(repository);
        let mut current = match find_marker(document, disabled, &repository_begin) {
            Some(existing) => existing,
            None => {
                let comment = document.create_comment(&repository_begin);
                insert_after_or_first(document, disabled, insert_after, comment)?;
                comment
            }
        };

        for (key, _) in &sources {
            let add = create_add(document, key, "true");
            document.insert_after_indented(current, add)?;
            current = add;
        }

        current = find_or_insert_marker(document, disabled, current, &repository_block_end(repository))?;
        insert_after = Some(current);
    }

    if end.is_none() && introduced_block {
        let comment = document.create_comment(MANAGED_BLOCK_END);
        insert_after_or_first(document, disabled, insert_after, comment)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED_X: &str =
        "https://pkgs.dev.azure.com/dnceng/public/_packaging/darc-pub-dotnet-wpf-abc1234/nuget/v3/index.json";
    const FEED_Y: &str =
        "https://pkgs.dev.azure.com/dnceng/internal/_packaging/darc-int-dotnet-wpf-def5678/nuget/v3/index.json";

    const CONFIG: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<configuration>
  <packageSources>
    <add key="nuget.org" value="https://api.nuget.org/v3/index.json" />
  </packageSources>
</configuration>
"#;

    fn groups(feeds: &[&str]) -> BTreeMap<String, BTreeSet<String>> {
        let mut groups = BTreeMap::new();
        groups.insert(
            "dotnet-wpf".to_string(),
            feeds.iter().map(|f| f.to_string()).collect(),
        );
        groups
    }

    fn update(text: &str, feeds: &BTreeMap<String, BTreeSet<String>>) -> String {
        let matcher = FeedMatcher::new().unwrap();
        let mut document = Document::parse(text).unwrap();
        update_package_sources(&mut document, feeds, &matcher).unwrap();
        document.to_xml_string().unwrap()
    }

    #[test]
    fn test_inserts_managed_block() {
        let output = update(CONFIG, &groups(&[FEED_X, FEED_Y]));
        let expected = format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<configuration>
  <packageSources>
    <clear />
    <!--{begin}-->
    <!--  Begin: Package sources from dotnet-wpf -->
    <add key="darc-pub-dotnet-wpf-abc1234" value="{x}" />
    <add key="darc-int-dotnet-wpf-def5678" value="{y}" />
    <!--  End: Package sources from dotnet-wpf -->
    <!--{end}-->
    <add key="nuget.org" value="https://api.nuget.org/v3/index.json" />
  </packageSources>
  <disabledPackageSources>
    <!--{begin}-->
    <!--  Begin: Package sources from dotnet-wpf -->
    <add key="darc-int-dotnet-wpf-def5678" value="true" />
    <!--  End: Package sources from dotnet-wpf -->
    <!--{end}-->
  </disabledPackageSources>
</configuration>
"#,
            begin = MANAGED_BLOCK_BEGIN,
            end = MANAGED_BLOCK_END,
            x = FEED_X,
            y = FEED_Y,
        );
        assert_eq!(output, expected);
    }

    #[test]
    fn test_update_is_idempotent() {
        let feeds = groups(&[FEED_X, FEED_Y]);
        let once = update(CONFIG, &feeds);
        let twice = update(&once, &feeds);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_groups_remove_managed_sources() {
        let once = update(CONFIG, &groups(&[FEED_X]));
        assert!(once.contains("darc-pub-dotnet-wpf-abc1234"));

        let cleared = update(&once, &BTreeMap::new());
        assert!(!cleared.contains("darc-pub-dotnet-wpf-abc1234"));
        assert!(cleared.contains("<clear />"));
        assert!(cleared.contains("nuget.org"));
    }

    #[test]
    fn test_public_feeds_are_not_disabled() {
        let output = update(CONFIG, &groups(&[FEED_X]));
        assert!(output.contains("  <disabledPackageSources />\n</configuration>"));
    }

    #[test]
    fn test_missing_package_sources_is_left_alone() {
        let text = "<configuration>\n  <config />\n</configuration>";
        assert_eq!(update(text, &groups(&[FEED_X])), text);
    }

    #[test]
    fn test_add_without_value_aborts() {
        let text = "<configuration>\n  <packageSources>\n    <add key=\"broken\" />\n  </packageSources>\n</configuration>";
        assert_eq!(update(text, &groups(&[FEED_X])), text);
    }
}
