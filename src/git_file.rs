//! Files staged for a single atomic commit

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value as JsonValue;

use crate::error::Result;
use crate::xml::Document;

/// Encoding of [`GitFile::content`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentEncoding {
    #[default]
    Utf8,
    Base64,
}

/// What the commit does with the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GitFileOperation {
    #[default]
    Add,
    Delete,
}

/// Extra facts recorded alongside a file change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GitFileMetadataName {
    ToolsDotNetUpdate,
    SdkVersionUpdate,
}

impl fmt::Display for GitFileMetadataName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GitFileMetadataName::ToolsDotNetUpdate => f.write_str("ToolsDotNetUpdate"),
            GitFileMetadataName::SdkVersionUpdate => f.write_str("SdkVersionUpdate"),
        }
    }
}

/// One file to write in a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitFile {
    pub file_path: String,
    /// LF-terminated content; never ends in a doubled newline added by us.
    pub content: String,
    pub content_encoding: ContentEncoding,
    pub mode: String,
    pub operation: GitFileOperation,
    pub metadata: Option<BTreeMap<GitFileMetadataName, String>>,
}

impl GitFile {
    /// Create an added file, normalizing CRLF to LF and guaranteeing a trailing newline.
    pub fn new(file_path: impl Into<String>, content: &str) -> Self {
        let mut content = content.replace("\r\n", "\n");
        if !content.ends_with('\n') {
            content.push('\n');
        }
        Self {
            file_path: file_path.into(),
            content,
            content_encoding: ContentEncoding::Utf8,
            mode: "100644".to_string(),
            operation: GitFileOperation::Add,
            metadata: None,
        }
    }

    /// Serialize an XML document.
    pub fn from_document(file_path: impl Into<String>, document: &Document) -> Result<Self> {
        Ok(Self::new(file_path, &document.to_xml_string()?))
    }

    /// Pretty-print a JSON document with two-space indentation.
    pub fn from_json(file_path: impl Into<String>, json: &JsonValue) -> Result<Self> {
        Ok(Self::new(file_path, &serde_json::to_string_pretty(json)?))
    }

    /// A deletion of `file_path`.
    pub fn deleted(file_path: impl Into<String>) -> Self {
        Self {
            content: String::new(),
            operation: GitFileOperation::Delete,
            ..Self::new(file_path, "")
        }
    }

    pub fn with_metadata(mut self, metadata: Option<BTreeMap<GitFileMetadataName, String>>) -> Self {
        self.metadata = metadata;
        self
    }
}

/// The full set of manifest files written by a bulk update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitFileContentContainer {
    pub version_details_xml: GitFile,
    pub global_json: GitFile,
    pub nuget_config: GitFile,
    pub dotnet_tools_json: Option<GitFile>,
    pub version_details_props: Option<GitFile>,
    pub version_props: Option<GitFile>,
}

impl GitFileContentContainer {
    /// Files in commit order: mandatory files first, then the optional ones that are present.
    pub fn files(&self) -> Vec<GitFile> {
        let mut files = vec![
            self.version_details_xml.clone(),
            self.global_json.clone(),
            self.nuget_config.clone(),
        ];
        files.extend(
            [
                &self.dotnet_tools_json,
                &self.version_details_props,
                &self.version_props,
            ]
            .into_iter()
            .flatten()
            .cloned(),
        );
        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_normalizes_line_endings() {
        let file = GitFile::new("a.xml", "<a>\r\n</a>");
        assert_eq!(file.content, "<a>\n</a>\n");
        assert_eq!(file.mode, "100644");
        assert_eq!(file.operation, GitFileOperation::Add);
        assert_eq!(file.content_encoding, ContentEncoding::Utf8);
        assert!(file.metadata.is_none());
    }

    #[test]
    fn test_new_does_not_double_trailing_newline() {
        assert_eq!(GitFile::new("a", "x\n").content, "x\n");
        assert_eq!(GitFile::new("a", "x\r\n").content, "x\n");
        assert_eq!(GitFile::new("a", "").content, "\n");
    }

    #[test]
    fn test_from_json_is_pretty() {
        let json: JsonValue = serde_json::from_str(r#"{"b":1,"a":{"c":[1,2]}}"#).unwrap();
        let file = GitFile::from_json("global.json", &json).unwrap();
        assert_eq!(
            file.content,
            "{\n  \"b\": 1,\n  \"a\": {\n    \"c\": [\n      1,\n      2\n    ]\n  }\n}\n"
        );
    }

    #[test]
    fn test_deleted() {
        let file = GitFile::deleted("old.json");
        assert_eq!(file.operation, GitFileOperation::Delete);
        assert!(file.content.is_empty());
    }

    #[test]
    fn test_container_order() {
        let container = GitFileContentContainer {
            version_details_xml: GitFile::new("vd", "1"),
            global_json: GitFile::new("gj", "2"),
            nuget_config: GitFile::new("nc", "3"),
            dotnet_tools_json: None,
            version_details_props: Some(GitFile::new("vdp", "4")),
            version_props: Some(GitFile::new("vp", "5")),
        };
        let paths: Vec<String> = container.files().into_iter().map(|f| f.file_path).collect();
        assert_eq!(paths, vec!["vd", "gj", "nc", "vdp", "vp"]);
    }
}
