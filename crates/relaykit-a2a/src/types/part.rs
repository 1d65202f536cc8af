//! Content part types for the A2A protocol.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A content part within a message or artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Part {
    /// Text content
    #[serde(rename = "text")]
    Text(TextPart),

    /// File content (inline bytes or a URI reference)
    #[serde(rename = "file")]
    File(FilePart),

    /// Structured data (passes through translation untouched)
    #[serde(rename = "data")]
    Data(DataPart),
}

impl Part {
    /// Create a text part
    pub fn text(content: impl Into<String>) -> Self {
        Part::Text(TextPart {
            text: content.into(),
            metadata: HashMap::new(),
        })
    }

    /// Create a file part referencing a URI
    pub fn file_uri(uri: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Part::File(FilePart {
            file: FileContent {
                bytes: None,
                uri: Some(uri.into()),
                mime_type: Some(mime_type.into()),
                name: None,
            },
            metadata: HashMap::new(),
        })
    }

    /// Create a file part carrying inline base64 bytes
    pub fn file_bytes(bytes: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Part::File(FilePart {
            file: FileContent {
                bytes: Some(bytes.into()),
                uri: None,
                mime_type: Some(mime_type.into()),
                name: None,
            },
            metadata: HashMap::new(),
        })
    }

    /// Create a data part
    pub fn data(data: serde_json::Value) -> Self {
        Part::Data(DataPart {
            data,
            metadata: HashMap::new(),
        })
    }

    /// Get the text content if this is a text part
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text(t) => Some(&t.text),
            _ => None,
        }
    }

    /// Get the file content if this is a file part
    pub fn as_file(&self) -> Option<&FileContent> {
        match self {
            Part::File(f) => Some(&f.file),
            _ => None,
        }
    }
}

/// Text content part
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextPart {
    /// The text content
    pub text: String,

    /// Additional metadata
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

/// File content part
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilePart {
    /// The file payload
    pub file: FileContent,

    /// Additional metadata
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

/// File payload: inline base64 bytes or a URI, never both
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileContent {
    /// Inline file content, base64-encoded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<String>,

    /// URI to the file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,

    /// MIME type of the file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,

    /// Optional file name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl FileContent {
    /// The transferable payload: inline bytes if present, otherwise the URI.
    pub fn payload(&self) -> Option<&str> {
        self.bytes.as_deref().or(self.uri.as_deref())
    }

    /// MIME type, defaulting to `application/octet-stream` when unspecified.
    pub fn mime_type_or_default(&self) -> &str {
        self.mime_type.as_deref().unwrap_or("application/octet-stream")
    }
}

/// Structured data part
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataPart {
    /// The structured data
    pub data: serde_json::Value,

    /// Additional metadata
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}
