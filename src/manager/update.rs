//! Bulk dependency updates

use std::collections::{BTreeMap, BTreeSet};

use log::info;

use super::{details, json, nuget, props, DependencyFileManager, Layout};
use crate::error::{Error, Result};
use crate::feeds::FeedMatcher;
use crate::git_file::{GitFile, GitFileContentContainer};
use crate::models::{DependencyDetail, SourceDependency};
use crate::path::{resolve, ManifestFile};

/// A set of dependency updates to apply in one commit.
#[derive(Debug, Clone, Default)]
pub struct UpdateRequest {
    /// New versions of dependencies already present in the manifest.
    pub items: Vec<DependencyDetail>,
    /// Replacement `<Source>` element.
    pub source: Option<SourceDependency>,
    /// Dependencies that stay as they are; their feeds are kept in `NuGet.config`.
    pub old_dependencies: Option<Vec<DependencyDetail>>,
    /// Raise `global.json` to this SDK when it is newer.
    pub incoming_dotnet_sdk: Option<semver::Version>,
    /// Force the layout instead of probing for `eng/Version.Details.props`.
    pub version_details_props: Option<bool>,
}

impl UpdateRequest {
    pub fn new(items: Vec<DependencyDetail>) -> Self {
        Self {
            items,
            ..Self::default()
        }
    }

    pub fn with_source(mut self, source: SourceDependency) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_old_dependencies(mut self, old_dependencies: Vec<DependencyDetail>) -> Self {
        self.old_dependencies = Some(old_dependencies);
        self
    }

    pub fn with_incoming_dotnet_sdk(mut self, version: semver::Version) -> Self {
        self.incoming_dotnet_sdk = Some(version);
        self
    }

    /// Feed locations of every asset that takes part in the update.
    ///
    /// Updated items always count, with an empty set when their locations
    /// are unknown. Old dependencies only fill in names not already present
    /// and only when their locations are known.
    pub fn asset_locations(&self) -> BTreeMap<String, Option<BTreeSet<String>>> {
        let mut locations: BTreeMap<String, Option<BTreeSet<String>>> = BTreeMap::new();
        for item in &self.items {
            let entry = locations
                .entry(item.name.clone())
                .or_insert_with(|| Some(BTreeSet::new()));
            if let (Some(set), Some(item_locations)) = (entry.as_mut(), &item.locations) {
                set.extend(item_locations.iter().cloned());
            }
        }
        for old in self.old_dependencies.iter().flatten() {
            if let Some(old_locations) = &old.locations {
                locations
                    .entry(old.name.clone())
                    .or_insert_with(|| Some(old_locations.iter().cloned().collect()));
            }
        }
        locations
    }
}

fn in_repo(error: Error, repo_uri: &str, branch: &str) -> Error {
    match error {
        Error::Dependency { message } => Error::Dependency {
            message: format!("{} in repo '{}' and branch '{}'", message, repo_uri, branch),
        },
        other => other,
    }
}

impl DependencyFileManager {
    /// Compute the new content of every manifest file for a bulk update.
    ///
    /// Nothing is committed; pass the result to
    /// [`DependencyFileManager::commit_container`].
    pub fn update_dependency_files(
        &self,
        request: &UpdateRequest,
        repo_uri: &str,
        branch: &str,
        relative_base_path: Option<&str>,
    ) -> Result<GitFileContentContainer> {
        let base = relative_base_path;
        let matcher = FeedMatcher::new()?;
        let layout = self.layout(repo_uri, branch, base, request.version_details_props)?;

        let mut version_details = self.read_version_details_xml(repo_uri, branch, base)?;
        let mut version_props = match layout {
            Layout::Standard => Some(self.read_version_props(repo_uri, branch, base)?),
            Layout::VirtualMonoRepo => None,
        };
        let mut global_json = self.read_global_json(repo_uri, branch, base)?;
        let mut dotnet_tools = self.read_dotnet_tools_json(repo_uri, branch, base)?.found();
        let mut nuget_config = self.read_nuget_config(repo_uri, branch, base)?;

        for item in &request.items {
            item.validate().map_err(|e| in_repo(e, repo_uri, branch))?;

            if let Some(version_props) = version_props.as_mut() {
                if !item.skip_property {
                    props::update_version_property(version_props, item)?;
                }
            }
            json::update_global_json(&mut global_json, &item.name, &item.version);
            if let Some(tools) = dotnet_tools.as_mut() {
                json::update_dotnet_tool(tools, &item.name, &item.version);
            }
        }

        details::update_version_details(&mut version_details, &request.items, request.source.as_ref())
            .map_err(|e| in_repo(e, repo_uri, branch))?;

        let managed_feeds = matcher.group(&request.asset_locations());
        nuget::update_package_sources(&mut nuget_config.document, &managed_feeds, &matcher)?;

        let sdk_metadata = request
            .incoming_dotnet_sdk
            .as_ref()
            .and_then(|incoming| json::bump_dotnet_sdk(&mut global_json, incoming));

        let version_details_props = match layout {
            Layout::VirtualMonoRepo => Some(Self::generated_props(&version_details, base)?),
            Layout::Standard => None,
        };

        Ok(GitFileContentContainer {
            version_details_xml: GitFile::from_document(
                resolve(ManifestFile::VersionDetailsXml, base),
                &version_details,
            )?,
            global_json: GitFile::from_json(resolve(ManifestFile::GlobalJson, base), &global_json)?
                .with_metadata(sdk_metadata),
            nuget_config: GitFile::from_document(nuget_config.path, &nuget_config.document)?,
            dotnet_tools_json: dotnet_tools
                .map(|tools| GitFile::from_json(resolve(ManifestFile::DotnetToolsJson, base), &tools))
                .transpose()?,
            version_details_props,
            version_props: version_props
                .map(|props| GitFile::from_document(resolve(ManifestFile::VersionsProps, base), &props))
                .transpose()?,
        })
    }

    /// Commit every file of a container in one commit.
    pub fn commit_container(
        &self,
        container: &GitFileContentContainer,
        repo_uri: &str,
        branch: &str,
        message: &str,
    ) -> Result<()> {
        let files = container.files();
        info!("Committing {} files to repo '{}' and branch '{}'", files.len(), repo_uri, branch);
        self.client(repo_uri).commit_files(&files, repo_uri, branch, message)
    }

    /// Apply a bulk update and commit the result.
    pub fn update_and_commit(
        &self,
        request: &UpdateRequest,
        repo_uri: &str,
        branch: &str,
        relative_base_path: Option<&str>,
        message: &str,
    ) -> Result<GitFileContentContainer> {
        let container = self.update_dependency_files(request, repo_uri, branch, relative_base_path)?;
        self.commit_container(&container, repo_uri, branch, message)?;
        Ok(container)
    }
}
