//! # Dependency Flow Manifest Library
//!
//! This library reads, mutates and regenerates the manifest files through
//! which a .NET repository declares its upstream dependencies. It backs the
//! `darc-manifest` command-line tool but works against any storage that
//! implements [`repository::GitRepo`].
//!
//! ## Quick Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use darc_manifest::filesystem::MemoryRepo;
//! use darc_manifest::manager::{DependencyFileManager, ManifestOptions};
//! use darc_manifest::models::DependencyDetail;
//!
//! let repo = MemoryRepo::new()
//!     .with_file(
//!         "eng/Version.Details.xml",
//!         "<Dependencies>\n  <ProductDependencies>\n  </ProductDependencies>\n</Dependencies>\n",
//!     )
//!     .with_file(
//!         "eng/Versions.props",
//!         "<Project>\n  <PropertyGroup>\n    <BarPackageVersion>1.0.0</BarPackageVersion>\n  </PropertyGroup>\n</Project>\n",
//!     )
//!     .with_file("global.json", "{}");
//!
//! let manager = DependencyFileManager::new(Arc::new(repo.clone()));
//! let foo = DependencyDetail::new("Foo", "1.0.0", "abc123", "https://github.com/dotnet/foo");
//! manager
//!     .add_or_update(&foo, "https://github.com/dotnet/app", "main", &ManifestOptions::default())
//!     .unwrap();
//!
//! let details = manager
//!     .parse_version_details_xml("https://github.com/dotnet/app", "main", true, None)
//!     .unwrap();
//! assert_eq!(details.dependencies[0].name, "Foo");
//! assert!(repo.file("eng/Versions.props").unwrap().contains("<FooPackageVersion>1.0.0</FooPackageVersion>"));
//! ```
//!
//! ## Core Concepts
//!
//! - **Manifest model (`models`, `parser`)**: `eng/Version.Details.xml` parsed
//!   into typed [`models::VersionDetails`], with strict validation.
//! - **Documents (`xml`, `flat_json`)**: formatting-preserving XML editing and
//!   flat views of JSON documents for diffing.
//! - **Dependency File Manager (`manager`)**: keeps `Version.Details.xml`,
//!   `Versions.props`, `Version.Details.props`, `global.json`,
//!   `dotnet-tools.json` and `NuGet.config` consistent on every change.
//! - **Generation (`props_generator`)**: rebuilds `Version.Details.props`
//!   from the manifest in Virtual Mono Repo layouts.
//! - **Feeds (`feeds`)**: recognizes per-build package feeds and groups
//!   them by source repository for `NuGet.config`.
//! - **Storage (`repository`, `filesystem`, `git`, `git_file`)**: the
//!   read/commit collaborator, with local and in-memory implementations.
//!
//! Every mutation reads the files it needs, edits them in memory and hands
//! the complete set to a single commit.

pub mod config;
pub mod defaults;
pub mod error;
pub mod feeds;
pub mod filesystem;
pub mod flat_json;
pub mod git;
pub mod git_file;
pub mod manager;
pub mod models;
pub mod parser;
pub mod path;
pub mod props_generator;
pub mod repository;
pub mod suggestions;
pub mod xml;

#[cfg(test)]
mod flat_json_proptest;
#[cfg(test)]
mod path_proptest;
