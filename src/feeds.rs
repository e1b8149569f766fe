//! # Managed Package Feeds
//!
//! Builds publish their packages to per-build feeds named
//! `darc-<int|pub>-<repository>-<sha>[-<subversion>]`. Such a feed is
//! "managed": the automation creates it, so the automation also owns the
//! NuGet sources that point at it.
//!
//! [`FeedMatcher::group`] takes the published locations of every asset and
//! keeps only the assets that live exclusively on managed feeds, grouping
//! their feeds by source repository.

use std::collections::{BTreeMap, BTreeSet};

use log::error;
use regex::Regex;

use crate::error::Result;

/// Azure DevOps feeds on `pkgs.dev.azure.com`.
const AZDO_FEED_PATTERN: &str = r"https://pkgs\.dev\.azure\.com/(?P<organization>\w+)/(?P<project>[\w-]+/)?_packaging/(?P<feedname>darc-(?P<type>int|pub)-(?P<repository>.+?)-(?P<sha>[A-Fa-f0-9]{7,40})-?(?P<subversion>\d*))/nuget/v3/index\.json";

/// Azure DevOps feeds on the legacy `<org>.pkgs.visualstudio.com` host.
const VISUALSTUDIO_FEED_PATTERN: &str = r"https://(?P<organization>\w+)\.pkgs\.visualstudio\.com/(?P<project>[\w-]+/)?_packaging/(?P<feedname>darc-(?P<type>int|pub)-(?P<repository>.+?)-(?P<sha>[A-Fa-f0-9]{7,40})-?(?P<subversion>\d*))/nuget/v3/index\.json";

/// Internal feeds exposed through the storage proxy.
const STORAGE_PROXY_FEED_PATTERN: &str = r"https://(?P<organization>[a-z-]+)\.azurewebsites\.net/container/[^/]+/sig/\w+/se/[0-9]{4}-[0-9]{2}-[0-9]{2}/(?P<feedname>darc-(?P<type>int|pub)-(?P<repository>.+?)-(?P<sha>[A-Fa-f0-9]{7,40})-?(?P<subversion>\d*))/index\.json";

/// The feed name alone, used to derive the repository group.
const FEED_NAME_PATTERN: &str = r"darc-(?P<type>int|pub)-(?P<repository>.+?)-(?P<sha>[A-Fa-f0-9]{7,40})-?(?P<subversion>\d*)";

/// Group name for managed feeds whose repository cannot be determined.
pub const UNKNOWN_REPOSITORY: &str = "unknown";

/// Key prefix of sources that point at internal feeds.
pub const INTERNAL_FEED_KEY_PREFIX: &str = "darc-int-";

/// Whether a managed feed is internal or public.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedVisibility {
    Internal,
    Public,
}

impl FeedVisibility {
    fn as_str(self) -> &'static str {
        match self {
            FeedVisibility::Internal => "int",
            FeedVisibility::Public => "pub",
        }
    }
}

/// The components of a managed feed URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedFeed {
    pub url: String,
    pub organization: String,
    pub visibility: FeedVisibility,
    pub repository: String,
    pub sha: String,
    pub subversion: Option<String>,
}

impl ManagedFeed {
    /// NuGet source key, e.g. `darc-pub-dotnet-wpf-abc1234` or `darc-int-dotnet-wpf-abc1234-2`.
    pub fn source_key(&self) -> String {
        let short_sha: String = self.sha.chars().take(7).collect();
        let mut key = format!(
            "darc-{}-{}-{}",
            self.visibility.as_str(),
            self.repository,
            short_sha
        );
        if let Some(subversion) = &self.subversion {
            key.push('-');
            key.push_str(subversion);
        }
        key
    }

    pub fn is_internal(&self) -> bool {
        self.visibility == FeedVisibility::Internal
    }
}

/// Recognizes managed feed URLs.
#[derive(Debug, Clone)]
pub struct FeedMatcher {
    feed_patterns: Vec<Regex>,
    name_pattern: Regex,
}

impl FeedMatcher {
    pub fn new() -> Result<Self> {
        let feed_patterns = [
            AZDO_FEED_PATTERN,
            VISUALSTUDIO_FEED_PATTERN,
            STORAGE_PROXY_FEED_PATTERN,
        ]
        .into_iter()
        .map(Regex::new)
        .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            feed_patterns,
            name_pattern: Regex::new(FEED_NAME_PATTERN)?,
        })
    }

    /// Whether `feed` is a feed created by the automation.
    pub fn is_managed(&self, feed: &str) -> bool {
        self.feed_patterns.iter().any(|p| p.is_match(feed))
    }

    /// Whether every location is a managed feed. Absent or empty sets are not.
    pub fn is_exclusively_managed(&self, locations: Option<&BTreeSet<String>>) -> bool {
        match locations {
            Some(locations) if !locations.is_empty() => {
                locations.iter().all(|location| self.is_managed(location))
            }
            _ => false,
        }
    }

    /// Split a managed feed URL into its parts.
    pub fn parse(&self, feed: &str) -> Option<ManagedFeed> {
        let captures = self
            .feed_patterns
            .iter()
            .find_map(|pattern| pattern.captures(feed))?;
        let group = |name: &str| {
            captures
                .name(name)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default()
        };

        let visibility = match group("type").as_str() {
            "int" => FeedVisibility::Internal,
            _ => FeedVisibility::Public,
        };
        let subversion = Some(group("subversion")).filter(|s| !s.is_empty());

        Some(ManagedFeed {
            url: feed.to_string(),
            organization: group("organization"),
            visibility,
            repository: group("repository"),
            sha: group("sha"),
            subversion,
        })
    }

    /// Repository group of a managed feed, [`UNKNOWN_REPOSITORY`] if it cannot be derived.
    pub fn repository_name(&self, feed: &str) -> String {
        self.name_pattern
            .captures(feed)
            .and_then(|c| c.name("repository"))
            .map(|m| m.as_str().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| UNKNOWN_REPOSITORY.to_string())
    }

    /// Collect the feeds of every exclusively-managed asset, grouped by repository.
    ///
    /// Assets with a mixed, empty or absent location set are skipped entirely.
    pub fn group(
        &self,
        asset_locations: &BTreeMap<String, Option<BTreeSet<String>>>,
    ) -> BTreeMap<String, BTreeSet<String>> {
        let managed_feeds: BTreeSet<&String> = asset_locations
            .values()
            .filter(|locations| self.is_exclusively_managed(locations.as_ref()))
            .flatten()
            .flatten()
            .collect();

        let mut groups: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for feed in managed_feeds {
            groups
                .entry(self.repository_name(feed))
                .or_default()
                .insert(feed.clone());
        }
        groups
    }

    /// `(key, feed)` NuGet source pairs for a set of managed feeds.
    ///
    /// Feeds that do not parse are logged and skipped.
    pub fn package_sources<'a, I>(&self, feeds: I) -> Vec<(String, String)>
    where
        I: IntoIterator<Item = &'a String>,
    {
        feeds
            .into_iter()
            .filter_map(|feed| match self.parse(feed) {
                Some(parsed) => Some((parsed.source_key(), feed.clone())),
                None => {
                    error!("Unable to parse feed {} as a managed feed", feed);
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED_X: &str =
        "https://pkgs.dev.azure.com/dnceng/public/_packaging/darc-pub-dotnet-wpf-abc1234/nuget/v3/index.json";
    const FEED_Y: &str =
        "https://pkgs.dev.azure.com/dnceng/internal/_packaging/darc-int-dotnet-wpf-def56789-2/nuget/v3/index.json";
    const NUGET_ORG: &str = "https://api.nuget.org/v3/index.json";

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_is_managed() {
        let matcher = FeedMatcher::new().unwrap();
        assert!(matcher.is_managed(FEED_X));
        assert!(matcher.is_managed(FEED_Y));
        assert!(matcher.is_managed(
            "https://some_org.pkgs.visualstudio.com/_packaging/darc-int-maestro-test1-aaaaaaaaaaaaaa-1/nuget/v3/index.json"
        ));
        assert!(matcher.is_managed(
            "https://some-proxy.azurewebsites.net/container/some-container/sig/somesig/se/2020-02-02/darc-int-maestro-test1-bababababab-1/index.json"
        ));
        assert!(!matcher.is_managed(NUGET_ORG));
        assert!(!matcher.is_managed(
            "https://pkgs.dev.azure.com/dnceng/public/_packaging/dotnet-tools/nuget/v3/index.json"
        ));
    }

    #[test]
    fn test_parse_feed() {
        let matcher = FeedMatcher::new().unwrap();
        let feed = matcher.parse(FEED_Y).unwrap();
        assert_eq!(feed.organization, "dnceng");
        assert_eq!(feed.visibility, FeedVisibility::Internal);
        assert_eq!(feed.repository, "dotnet-wpf");
        assert_eq!(feed.sha, "def56789");
        assert_eq!(feed.subversion.as_deref(), Some("2"));
        assert_eq!(feed.source_key(), "darc-int-dotnet-wpf-def5678-2");

        let feed = matcher.parse(FEED_X).unwrap();
        assert_eq!(feed.source_key(), "darc-pub-dotnet-wpf-abc1234");
        assert!(!feed.is_internal());

        assert!(matcher.parse(NUGET_ORG).is_none());
    }

    #[test]
    fn test_group_excludes_mixed_assets() {
        let matcher = FeedMatcher::new().unwrap();
        let mut assets = BTreeMap::new();
        assets.insert("A".to_string(), Some(set(&[FEED_X, FEED_Y])));
        assets.insert("B".to_string(), Some(set(&[FEED_X, NUGET_ORG])));

        let groups = matcher.group(&assets);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups["dotnet-wpf"], set(&[FEED_X, FEED_Y]));
    }

    #[test]
    fn test_group_ignores_empty_and_absent_locations() {
        let matcher = FeedMatcher::new().unwrap();
        let mut assets = BTreeMap::new();
        assets.insert("A".to_string(), None);
        assets.insert("B".to_string(), Some(BTreeSet::new()));
        assert!(matcher.group(&assets).is_empty());
    }

    #[test]
    fn test_group_deduplicates_feeds() {
        let matcher = FeedMatcher::new().unwrap();
        let mut assets = BTreeMap::new();
        assets.insert("A".to_string(), Some(set(&[FEED_X])));
        assets.insert("B".to_string(), Some(set(&[FEED_X])));
        let groups = matcher.group(&assets);
        assert_eq!(groups["dotnet-wpf"].len(), 1);
    }

    #[test]
    fn test_package_sources_skip_unparseable() {
        let matcher = FeedMatcher::new().unwrap();
        let feeds = set(&[FEED_X, NUGET_ORG]);
        let sources = matcher.package_sources(&feeds);
        assert_eq!(
            sources,
            vec![("darc-pub-dotnet-wpf-abc1234".to_string(), FEED_X.to_string())]
        );
    }
}
