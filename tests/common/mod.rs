//! Shared test utilities for integration and E2E tests.
//!
//! This module provides manifest fixtures and helpers for both the library
//! level tests (an in-memory repository) and the CLI tests (a temporary
//! working tree).
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let repo = standard_repo();
//!     let manager = manager(&repo);
//!     // ... test code
//! }
//! ```

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use assert_fs::prelude::*;

use darc_manifest::filesystem::MemoryRepo;
use darc_manifest::manager::DependencyFileManager;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    #[allow(unused_imports)]
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::fixtures;
    #[allow(unused_imports)]
    pub use super::{manager, standard_repo, TestFixture, BRANCH, REPO_URI};
}

/// Repository URI used by the in-memory tests.
pub const REPO_URI: &str = "https://github.com/dotnet/app";

/// Branch used by the in-memory tests.
pub const BRANCH: &str = "main";

/// Manifest file contents for testing.
pub mod fixtures {
    /// Two product dependencies and the Arcade SDK as a toolset dependency.
    pub const VERSION_DETAILS: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Dependencies>
  <ProductDependencies>
    <Dependency Name="Foo" Version="1.0.0">
      <Uri>https://github.com/dotnet/foo</Uri>
      <Sha>sha1</Sha>
    </Dependency>
    <Dependency Name="Bar" Version="2.0.0">
      <Uri>https://github.com/dotnet/bar</Uri>
      <Sha>sha2</Sha>
    </Dependency>
  </ProductDependencies>
  <ToolsetDependencies>
    <Dependency Name="Microsoft.DotNet.Arcade.Sdk" Version="8.0.0-beta.1">
      <Uri>https://github.com/dotnet/arcade</Uri>
      <Sha>sha3</Sha>
    </Dependency>
  </ToolsetDependencies>
</Dependencies>
"#;

    /// Properties for `Foo` and `Bar` in the primary naming style.
    pub const VERSIONS_PROPS: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Project>
  <PropertyGroup>
    <FooPackageVersion>1.0.0</FooPackageVersion>
    <BarPackageVersion>2.0.0</BarPackageVersion>
  </PropertyGroup>
</Project>
"#;

    /// Properties for `Foo` and `Bar` in the alternate naming style.
    pub const VERSIONS_PROPS_ALTERNATE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Project>
  <PropertyGroup>
    <FooVersion>1.0.0</FooVersion>
    <BarVersion>2.0.0</BarVersion>
  </PropertyGroup>
</Project>
"#;

    /// Imports the generated props file instead of declaring properties.
    pub const VERSIONS_PROPS_IMPORTING: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Project>
  <Import Project="Version.Details.props" />
</Project>
"#;

    pub const GLOBAL_JSON: &str = r#"{
  "sdk": {
    "version": "8.0.100"
  },
  "tools": {
    "dotnet": "8.0.100"
  },
  "msbuild-sdks": {
    "Microsoft.DotNet.Arcade.Sdk": "8.0.0-beta.1"
  }
}
"#;

    pub const DOTNET_TOOLS: &str = r#"{
  "version": 1,
  "isRoot": true,
  "tools": {
    "Foo": {
      "version": "1.0.0",
      "commands": [
        "foo"
      ]
    }
  }
}
"#;

    pub const NUGET_CONFIG: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<configuration>
  <packageSources>
    <add key="nuget.org" value="https://api.nuget.org/v3/index.json" />
  </packageSources>
  <disabledPackageSources />
</configuration>
"#;

    /// A managed public feed of `dotnet-foo`.
    pub const FOO_FEED: &str =
        "https://pkgs.dev.azure.com/dnceng/public/_packaging/darc-pub-dotnet-foo-abcdef1/nuget/v3/index.json";

    /// A managed internal feed of `dotnet-bar`.
    pub const BAR_FEED: &str =
        "https://pkgs.dev.azure.com/dnceng/internal/_packaging/darc-int-dotnet-bar-1234567/nuget/v3/index.json";
}

/// A repository with every manifest file of the standard layout.
pub fn standard_repo() -> MemoryRepo {
    with_prefix(None)
}

/// The standard repository nested under `base`.
pub fn with_prefix(base: Option<&str>) -> MemoryRepo {
    let path = |file: &str| match base {
        Some(base) => format!("{}/{}", base, file),
        None => file.to_string(),
    };
    MemoryRepo::new()
        .with_file(path("eng/Version.Details.xml"), fixtures::VERSION_DETAILS)
        .with_file(path("eng/Versions.props"), fixtures::VERSIONS_PROPS)
        .with_file(path("global.json"), fixtures::GLOBAL_JSON)
        .with_file(path(".config/dotnet-tools.json"), fixtures::DOTNET_TOOLS)
        .with_file(path("NuGet.config"), fixtures::NUGET_CONFIG)
}

/// A manager reading and committing through `repo`.
pub fn manager(repo: &MemoryRepo) -> DependencyFileManager {
    DependencyFileManager::new(Arc::new(repo.clone()))
}

/// A temporary working tree for CLI tests.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// A working tree holding every manifest file of the standard layout.
    pub fn standard() -> Self {
        Self::new()
            .with_file("eng/Version.Details.xml", fixtures::VERSION_DETAILS)
            .with_file("eng/Versions.props", fixtures::VERSIONS_PROPS)
            .with_file("global.json", fixtures::GLOBAL_JSON)
            .with_file(".config/dotnet-tools.json", fixtures::DOTNET_TOOLS)
            .with_file("NuGet.config", fixtures::NUGET_CONFIG)
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Read a file of the working tree.
    pub fn read(&self, path: &str) -> String {
        std::fs::read_to_string(self.temp_dir.path().join(path)).expect("Failed to read file")
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a child path in the temp directory.
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
