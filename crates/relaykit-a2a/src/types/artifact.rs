//! Artifact types for the A2A protocol.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use super::Part;

/// A named output produced by a task, delivered incrementally or at once.
///
/// Identity is by `artifact_id`; the same artifact may be updated multiple
/// times before being considered final. Two artifacts with equal ids and
/// equal parts are the same content (`PartialEq` drives re-emission dedup).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    /// Unique identifier for the artifact
    pub artifact_id: String,

    /// Human-readable name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Description of the artifact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Content parts of the artifact
    #[serde(default)]
    pub parts: Vec<Part>,

    /// Additional metadata
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Artifact {
    /// Create a new artifact with the given ID
    pub fn new(artifact_id: impl Into<String>) -> Self {
        Self {
            artifact_id: artifact_id.into(),
            name: None,
            description: None,
            parts: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    /// Create a new artifact with a generated UUID
    pub fn new_with_uuid() -> Self {
        Self::new(Uuid::new_v4().to_string())
    }

    /// Create a text artifact
    pub fn text(artifact_id: impl Into<String>, content: impl Into<String>) -> Self {
        let mut artifact = Self::new(artifact_id);
        artifact.parts.push(Part::text(content));
        artifact
    }

    /// Add a part to the artifact
    pub fn with_part(mut self, part: Part) -> Self {
        self.parts.push(part);
        self
    }

    /// Set the name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Concatenated text of all text parts, without injected separators.
    pub fn text_content(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| p.as_text())
            .collect::<Vec<_>>()
            .concat()
    }
}
