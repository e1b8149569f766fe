//! Edits of `global.json` and `.config/dotnet-tools.json`

use std::collections::BTreeMap;

use log::{error, info};
use serde_json::{Map, Value};

use crate::git_file::GitFileMetadataName;
use crate::path::{dotnet_tools_element_name, global_json_element_name};

/// Assets tracked in `global.json`, with the object that holds them.
const KNOWN_GLOBAL_JSON_ASSETS: [(&str, &str); 7] = [
    ("Microsoft.DotNet.Arcade.Sdk", "msbuild-sdks"),
    ("Microsoft.DotNet.Build.Tasks.SharedFramework.Sdk", "msbuild-sdks"),
    ("Microsoft.DotNet.Helix.Sdk", "msbuild-sdks"),
    ("Microsoft.DotNet.SharedFramework.Sdk", "msbuild-sdks"),
    ("Microsoft.NET.SharedFramework.Sdk", "msbuild-sdks"),
    ("Microsoft.DotNet.CMake.Sdk", "msbuild-sdks"),
    ("dotnet", "tools"),
];

const TOOLS_PROPERTY: &str = "tools";
const DOTNET_PROPERTY: &str = "dotnet";
const PINNED_PROPERTY: &str = "pinned";
const SDK_PROPERTY: &str = "sdk";
const VERSION_PROPERTY: &str = "version";

/// The `global.json` parent object of a known asset.
pub fn known_global_json_parent(dependency_name: &str) -> Option<&'static str> {
    KNOWN_GLOBAL_JSON_ASSETS
        .iter()
        .find(|(name, _)| *name == dependency_name)
        .map(|(_, parent)| *parent)
}

/// Set `parent.name` to `version`, creating the parent object if needed.
pub fn add_to_global_json(json: &mut Value, parent: &str, dependency_name: &str, version: &str) {
    let Value::Object(root) = json else {
        return;
    };
    let entry = root
        .entry(parent.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !entry.is_object() {
        *entry = Value::Object(Map::new());
    }
    if let Value::Object(object) = entry {
        object.insert(
            global_json_element_name(dependency_name).to_string(),
            Value::String(version.to_string()),
        );
    }
}

/// Set every property named `name` (case-insensitive, at any depth) to `version`.
///
/// A matching property is not searched further. Returns whether anything changed.
pub fn update_global_json(json: &mut Value, dependency_name: &str, version: &str) -> bool {
    let name = global_json_element_name(dependency_name);
    let Value::Object(object) = json else {
        return false;
    };

    let mut changed = false;
    for (key, value) in object.iter_mut() {
        if key.eq_ignore_ascii_case(name) {
            let updated = Value::String(version.to_string());
            if *value != updated {
                *value = updated;
                changed = true;
            }
        } else {
            changed |= update_global_json(value, dependency_name, version);
        }
    }
    changed
}

/// First property named `name` (case-insensitive), depth first.
pub fn find_json_property<'a>(json: &'a Value, name: &str) -> Option<(&'a str, &'a Value)> {
    let Value::Object(object) = json else {
        return None;
    };
    object.iter().find_map(|(key, value)| {
        if key.eq_ignore_ascii_case(name) {
            Some((key.as_str(), value))
        } else {
            find_json_property(value, name)
        }
    })
}

fn tools_mut(json: &mut Value) -> Option<&mut Map<String, Value>> {
    json.get_mut(TOOLS_PROPERTY)?.as_object_mut()
}

/// The tool entry for a dependency, with the key it is stored under.
pub fn find_dotnet_tool<'a>(json: &'a Value, dependency_name: &str) -> Option<(&'a str, &'a Value)> {
    let name = dotnet_tools_element_name(dependency_name);
    json.get(TOOLS_PROPERTY)?
        .as_object()?
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(key, value)| (key.as_str(), value))
}

/// Set `tools.<name>.version`. Returns whether anything changed.
pub fn update_dotnet_tool(json: &mut Value, dependency_name: &str, version: &str) -> bool {
    let name = dotnet_tools_element_name(dependency_name);
    let Some(tools) = tools_mut(json) else {
        return false;
    };
    let Some((_, tool)) = tools
        .iter_mut()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
    else {
        return false;
    };

    match tool.get_mut(VERSION_PROPERTY) {
        Some(current) => {
            let updated = Value::String(version.to_string());
            if *current == updated {
                false
            } else {
                *current = updated;
                true
            }
        }
        None => {
            error!("Entry for '{}' in dotnet-tools.json has no version", name);
            false
        }
    }
}

/// Remove `tools.<name>`. Returns whether an entry was removed.
pub fn remove_dotnet_tool(json: &mut Value, dependency_name: &str) -> bool {
    let name = dotnet_tools_element_name(dependency_name);
    let Some(tools) = tools_mut(json) else {
        return false;
    };
    let key = tools
        .keys()
        .find(|key| key.eq_ignore_ascii_case(name))
        .cloned();
    match key {
        Some(key) => tools.shift_remove(&key).is_some(),
        None => false,
    }
}

/// `tools.dotnet` as a semantic version, if present and valid.
pub fn tools_dotnet_version(json: &Value) -> Option<semver::Version> {
    let raw = json.get(TOOLS_PROPERTY)?.get(DOTNET_PROPERTY)?.as_str()?;
    match semver::Version::parse(raw) {
        Ok(version) => Some(version),
        Err(e) => {
            error!("Failed to parse tools.dotnet version '{}': {}", raw, e);
            None
        }
    }
}

/// Raise `tools.dotnet` (and `sdk.version` when present) to `incoming`.
///
/// Nothing happens when the current version is unparseable, not lower than
/// `incoming`, or pinned via `tools.pinned`. The returned metadata records
/// what was bumped.
pub fn bump_dotnet_sdk(
    json: &mut Value,
    incoming: &semver::Version,
) -> Option<BTreeMap<GitFileMetadataName, String>> {
    let pinned = json
        .get(TOOLS_PROPERTY)
        .and_then(|tools| tools.get(PINNED_PROPERTY))
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if pinned {
        info!("Skipping .NET SDK update because tools.dotnet is pinned");
        return None;
    }

    let current = tools_dotnet_version(json)?;
    if current >= *incoming {
        return None;
    }

    let incoming_text = incoming.to_string();
    let mut metadata = BTreeMap::new();
    if let Some(tools) = tools_mut(json) {
        tools.insert(DOTNET_PROPERTY.to_string(), Value::String(incoming_text.clone()));
        metadata.insert(GitFileMetadataName::ToolsDotNetUpdate, incoming_text.clone());
    }

    if let Some(sdk) = json.get_mut(SDK_PROPERTY).and_then(Value::as_object_mut) {
        if sdk.contains_key(VERSION_PROPERTY) {
            sdk.insert(VERSION_PROPERTY.to_string(), Value::String(incoming_text.clone()));
            metadata.insert(GitFileMetadataName::SdkVersionUpdate, incoming_text);
        }
    }

    info!("Updated .NET SDK from {} to {}", current, incoming);
    Some(metadata)
}
