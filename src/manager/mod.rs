//! # Dependency File Manager
//!
//! Reads, mutates and writes the manifest files of a repository as one
//! consistent set:
//!
//! - `eng/Version.Details.xml`: the authoritative list of dependencies
//! - `eng/Versions.props`: MSBuild version properties
//! - `eng/Version.Details.props`: generated properties (Virtual Mono Repo layout)
//! - `global.json`: SDK and MSBuild SDK versions
//! - `.config/dotnet-tools.json`: local .NET tools
//! - `NuGet.config`: managed package sources
//!
//! All file access goes through a [`GitRepo`] collaborator obtained from a
//! [`GitRepoFactory`], so the same logic runs against a working tree
//! ([`crate::repository::LocalRepo`]) or an in-memory repository
//! ([`crate::filesystem::MemoryRepo`]).
//!
//! ## Layouts
//!
//! A repository whose `eng/Version.Details.props` exists uses the
//! [`Layout::VirtualMonoRepo`] layout: the props file is regenerated from
//! `Version.Details.xml` after every change and `eng/Versions.props` is
//! left alone. Otherwise properties are edited in place in
//! `eng/Versions.props`.

mod details;
pub mod json;
pub mod nuget;
pub mod props;
mod update;
mod verify;

use std::sync::Arc;

use log::{debug, info, warn};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::git_file::GitFile;
use crate::models::{DependencyDetail, VersionDetails};
use crate::parser::{self, find_dependency_nodes};
use crate::path::{nuget_config_candidates, resolve, ManifestFile, NUGET_CONFIG_NAMES};
use crate::props_generator;
use crate::repository::{GitRepo, GitRepoFactory, SingleRepoFactory};
use crate::xml::Document;

pub use update::UpdateRequest;

/// How the versions of a repository are exposed to MSBuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Properties live in `eng/Versions.props` and are edited in place.
    Standard,
    /// Properties live in the generated `eng/Version.Details.props`.
    VirtualMonoRepo,
}

/// Result of reading a file that may legitimately be missing.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadResult<T> {
    Found(T),
    Absent,
}

impl<T> ReadResult<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, ReadResult::Found(_))
    }

    pub fn found(self) -> Option<T> {
        match self {
            ReadResult::Found(value) => Some(value),
            ReadResult::Absent => None,
        }
    }
}

/// A loaded NuGet configuration and the path it was found at.
#[derive(Debug)]
pub struct NugetConfig {
    pub path: String,
    pub document: Document,
}

/// Options of a single add, update or remove.
#[derive(Debug, Clone, Default)]
pub struct ManifestOptions {
    /// Sub-path of the repository inside a Virtual Mono Repo.
    pub relative_base_path: Option<String>,
    /// Only write `Version.Details.xml`.
    pub version_details_only: bool,
    /// Force the layout instead of probing for `eng/Version.Details.props`.
    pub version_details_props: Option<bool>,
}

impl ManifestOptions {
    fn base_path(&self) -> Option<&str> {
        self.relative_base_path.as_deref()
    }
}

/// Reads and writes the manifest files of a repository.
pub struct DependencyFileManager {
    factory: Arc<dyn GitRepoFactory>,
    nuget_config_names: Vec<String>,
}

impl DependencyFileManager {
    /// A manager that reads and writes through a single repository client.
    pub fn new(repo: Arc<dyn GitRepo>) -> Self {
        Self::with_factory(Arc::new(SingleRepoFactory::new(repo)))
    }

    pub fn with_factory(factory: Arc<dyn GitRepoFactory>) -> Self {
        Self {
            factory,
            nuget_config_names: NUGET_CONFIG_NAMES.iter().map(|n| n.to_string()).collect(),
        }
    }

    /// Override the NuGet configuration names probed, in order.
    pub fn with_nuget_config_names(mut self, names: Vec<String>) -> Self {
        if !names.is_empty() {
            self.nuget_config_names = names;
        }
        self
    }

    fn client(&self, repo_uri: &str) -> Arc<dyn GitRepo> {
        self.factory.create_client(repo_uri)
    }

    fn read_file(&self, path: &str, repo_uri: &str, branch: &str) -> Result<String> {
        info!("Reading '{}' in repo '{}' and branch '{}'...", path, repo_uri, branch);
        let content = self.client(repo_uri).get_file_contents(path, repo_uri, branch)?;
        debug!("Read '{}' ({} bytes)", path, content.len());
        Ok(content)
    }

    fn read_optional(&self, path: &str, repo_uri: &str, branch: &str) -> Result<ReadResult<String>> {
        match self.read_file(path, repo_uri, branch) {
            Ok(content) => Ok(ReadResult::Found(content)),
            Err(e) if e.is_not_found() => {
                debug!("'{}' does not exist in repo '{}' and branch '{}'", path, repo_uri, branch);
                Ok(ReadResult::Absent)
            }
            Err(e) => Err(e),
        }
    }

    fn read_document(&self, file: ManifestFile, repo_uri: &str, branch: &str, base: Option<&str>) -> Result<Document> {
        let content = self.read_file(&resolve(file, base), repo_uri, branch)?;
        Document::parse(&content)
    }

    /// Load `eng/Version.Details.xml`.
    pub fn read_version_details_xml(&self, repo_uri: &str, branch: &str, relative_base_path: Option<&str>) -> Result<Document> {
        self.read_document(ManifestFile::VersionDetailsXml, repo_uri, branch, relative_base_path)
    }

    /// Load `eng/Versions.props`.
    pub fn read_version_props(&self, repo_uri: &str, branch: &str, relative_base_path: Option<&str>) -> Result<Document> {
        self.read_document(ManifestFile::VersionsProps, repo_uri, branch, relative_base_path)
    }

    /// Load `eng/Version.Details.props` if the repository has one.
    pub fn read_version_details_props(
        &self,
        repo_uri: &str,
        branch: &str,
        relative_base_path: Option<&str>,
    ) -> Result<ReadResult<Document>> {
        let path = resolve(ManifestFile::VersionDetailsProps, relative_base_path);
        match self.read_optional(&path, repo_uri, branch)? {
            ReadResult::Found(content) => Ok(ReadResult::Found(Document::parse(&content)?)),
            ReadResult::Absent => Ok(ReadResult::Absent),
        }
    }

    /// Whether `eng/Version.Details.props` exists.
    pub fn version_details_props_exists(&self, repo_uri: &str, branch: &str, relative_base_path: Option<&str>) -> Result<bool> {
        let path = resolve(ManifestFile::VersionDetailsProps, relative_base_path);
        Ok(self.read_optional(&path, repo_uri, branch)?.is_found())
    }

    /// Load `global.json`.
    pub fn read_global_json(&self, repo_uri: &str, branch: &str, relative_base_path: Option<&str>) -> Result<Value> {
        let content = self.read_file(&resolve(ManifestFile::GlobalJson, relative_base_path), repo_uri, branch)?;
        Ok(serde_json::from_str(strip_bom(&content))?)
    }

    /// Load `.config/dotnet-tools.json` if the repository has one.
    pub fn read_dotnet_tools_json(
        &self,
        repo_uri: &str,
        branch: &str,
        relative_base_path: Option<&str>,
    ) -> Result<ReadResult<Value>> {
        let path = resolve(ManifestFile::DotnetToolsJson, relative_base_path);
        match self.read_optional(&path, repo_uri, branch)? {
            ReadResult::Found(content) => Ok(ReadResult::Found(serde_json::from_str(strip_bom(&content))?)),
            ReadResult::Absent => Ok(ReadResult::Absent),
        }
    }

    /// Load the first NuGet configuration that exists among the candidate names.
    pub fn read_nuget_config(&self, repo_uri: &str, branch: &str, relative_base_path: Option<&str>) -> Result<NugetConfig> {
        for path in nuget_config_candidates(&self.nuget_config_names, relative_base_path) {
            if let ReadResult::Found(content) = self.read_optional(&path, repo_uri, branch)? {
                let document = Document::parse(&content)?;
                return Ok(NugetConfig { path, document });
            }
        }
        Err(Error::NoVariantFound {
            repo_uri: repo_uri.to_string(),
            branch: branch.to_string(),
            candidate: self.nuget_config_names.first().cloned().unwrap_or_default(),
        })
    }

    /// The `tools.dotnet` version of `global.json`, if present and valid.
    pub fn read_tools_dotnet_version(
        &self,
        repo_uri: &str,
        branch: &str,
        relative_base_path: Option<&str>,
    ) -> Result<Option<semver::Version>> {
        let global_json = self.read_global_json(repo_uri, branch, relative_base_path)?;
        Ok(json::tools_dotnet_version(&global_json))
    }

    /// Parse `eng/Version.Details.xml` into a [`VersionDetails`] snapshot.
    pub fn parse_version_details_xml(
        &self,
        repo_uri: &str,
        branch: &str,
        include_pinned: bool,
        relative_base_path: Option<&str>,
    ) -> Result<VersionDetails> {
        let document = self.read_version_details_xml(repo_uri, branch, relative_base_path)?;
        parser::parse(&document, include_pinned)
    }

    /// Decide the layout, probing the repository unless `hint` forces it.
    pub fn layout(&self, repo_uri: &str, branch: &str, relative_base_path: Option<&str>, hint: Option<bool>) -> Result<Layout> {
        let has_props = match hint {
            Some(hint) => hint,
            None => self.version_details_props_exists(repo_uri, branch, relative_base_path)?,
        };
        Ok(if has_props {
            Layout::VirtualMonoRepo
        } else {
            Layout::Standard
        })
    }

    fn generated_props(document: &Document, relative_base_path: Option<&str>) -> Result<GitFile> {
        let details = parser::parse(document, true)?;
        let props = props_generator::generate(&details)?;
        GitFile::from_document(resolve(ManifestFile::VersionDetailsProps, relative_base_path), &props)
    }

    /// Add a dependency or update the existing entry with the same name.
    ///
    /// Returns `false` without committing when the manifest already pins
    /// exactly this build.
    pub fn add_or_update(
        &self,
        dependency: &DependencyDetail,
        repo_uri: &str,
        branch: &str,
        options: &ManifestOptions,
    ) -> Result<bool> {
        dependency.validate()?;
        let base = options.base_path();
        let mut document = self.read_version_details_xml(repo_uri, branch, base)?;
        let details = parser::parse(&document, true)?;

        let existing = details.find(&dependency.name);
        if existing.is_some_and(|current| current.is_same_pin(dependency)) {
            info!("{} is already up to date", dependency);
            return Ok(false);
        }
        let is_new = existing.is_none();

        match find_dependency_nodes(&document, &dependency.name).first() {
            Some(node) => details::update_dependency_node(&mut document, *node, dependency)?,
            None => {
                details::add_dependency_node(&mut document, dependency)?;
            }
        }

        let mut files = vec![GitFile::from_document(
            resolve(ManifestFile::VersionDetailsXml, base),
            &document,
        )?];

        match self.layout(repo_uri, branch, base, options.version_details_props)? {
            Layout::VirtualMonoRepo => files.push(Self::generated_props(&document, base)?),
            Layout::Standard if options.version_details_only => {}
            Layout::Standard => {
                files.extend(self.update_version_props(dependency, is_new, repo_uri, branch, base)?);
            }
        }
        if !options.version_details_only {
            files.extend(self.update_json_files(dependency, is_new, repo_uri, branch, base)?);
        }

        let message = if is_new {
            format!("Add {} {} to Version.Details.xml", dependency.name, dependency.version)
        } else {
            format!("Update {} to {} in Version.Details.xml", dependency.name, dependency.version)
        };
        self.client(repo_uri).commit_files(&files, repo_uri, branch, &message)?;
        Ok(true)
    }

    /// Versions.props edits for the standard layout.
    ///
    /// New dependencies get a property unless they live in global.json;
    /// existing ones only have an existing property updated.
    fn update_version_props(
        &self,
        dependency: &DependencyDetail,
        is_new: bool,
        repo_uri: &str,
        branch: &str,
        base: Option<&str>,
    ) -> Result<Option<GitFile>> {
        if dependency.skip_property {
            return Ok(None);
        }
        let global_parent = json::known_global_json_parent(&dependency.name);
        if is_new && global_parent.is_some() {
            return Ok(None);
        }

        let mut version_props = self.read_version_props(repo_uri, branch, base)?;
        if is_new {
            props::upsert_version_property(&mut version_props, dependency)?;
        } else if !props::update_version_property(&mut version_props, dependency)? {
            debug!("No version property for {} in Versions.props", dependency.name);
            return Ok(None);
        }
        Ok(Some(GitFile::from_document(
            resolve(ManifestFile::VersionsProps, base),
            &version_props,
        )?))
    }

    /// global.json and dotnet-tools.json edits, shared by both layouts.
    fn update_json_files(
        &self,
        dependency: &DependencyDetail,
        is_new: bool,
        repo_uri: &str,
        branch: &str,
        base: Option<&str>,
    ) -> Result<Vec<GitFile>> {
        let mut files = Vec::new();
        let global_parent = json::known_global_json_parent(&dependency.name);

        let global_json_path = resolve(ManifestFile::GlobalJson, base);
        match self.read_global_json(repo_uri, branch, base) {
            Ok(mut global_json) => {
                let changed = match global_parent {
                    Some(parent) if is_new => {
                        json::add_to_global_json(&mut global_json, parent, &dependency.name, &dependency.version);
                        true
                    }
                    _ => json::update_global_json(&mut global_json, &dependency.name, &dependency.version),
                };
                if changed {
                    files.push(GitFile::from_json(global_json_path, &global_json)?);
                }
            }
            Err(e) if e.is_not_found() && global_parent.is_none() => {
                debug!("No global.json to update for {}", dependency.name);
            }
            Err(e) => return Err(e),
        }

        if let ReadResult::Found(mut tools) = self.read_dotnet_tools_json(repo_uri, branch, base)? {
            if json::update_dotnet_tool(&mut tools, &dependency.name, &dependency.version) {
                files.push(GitFile::from_json(resolve(ManifestFile::DotnetToolsJson, base), &tools)?);
            }
        }

        Ok(files)
    }

    /// Remove a dependency and its version properties.
    ///
    /// Returns `false` without committing when no dependency has that name.
    pub fn remove(&self, dependency_name: &str, repo_uri: &str, branch: &str, options: &ManifestOptions) -> Result<bool> {
        let base = options.base_path();
        let mut document = self.read_version_details_xml(repo_uri, branch, base)?;

        let nodes = find_dependency_nodes(&document, dependency_name);
        if nodes.is_empty() {
            info!("No dependency named '{}' in Version.Details.xml", dependency_name);
            return Ok(false);
        }
        for node in nodes {
            document.remove(node)?;
        }

        let mut files = vec![GitFile::from_document(
            resolve(ManifestFile::VersionDetailsXml, base),
            &document,
        )?];

        match self.layout(repo_uri, branch, base, options.version_details_props)? {
            Layout::VirtualMonoRepo => files.push(Self::generated_props(&document, base)?),
            Layout::Standard => {
                let mut version_props = self.read_version_props(repo_uri, branch, base)?;
                if !props::remove_version_property(&mut version_props, dependency_name)? {
                    warn!("No version property for '{}' in Versions.props", dependency_name);
                }
                files.push(GitFile::from_document(
                    resolve(ManifestFile::VersionsProps, base),
                    &version_props,
                )?);
            }
        }

        if let ReadResult::Found(mut tools) = self.read_dotnet_tools_json(repo_uri, branch, base)? {
            if json::remove_dotnet_tool(&mut tools, dependency_name) {
                files.push(GitFile::from_json(resolve(ManifestFile::DotnetToolsJson, base), &tools)?);
            }
        }

        let message = format!(
            "Remove {} from Version.Details.xml and Version.props'",
            dependency_name
        );
        self.client(repo_uri).commit_files(&files, repo_uri, branch, &message)?;
        Ok(true)
    }
}

fn strip_bom(content: &str) -> &str {
    content.trim_start_matches('\u{feff}')
}
