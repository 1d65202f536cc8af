//! Generic stream-part vocabulary produced by the reconciler.
//!
//! This is the flat, cumulative text-delta model a chat-SDK consumer
//! renders from. The part names and field names are a wire contract; they
//! serialize exactly as listed on [`StreamPart`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use relaykit_a2a::{Artifact, TaskState};

/// One part of a reconciled stream.
///
/// A well-formed stream is `stream-start`, then `response-metadata`, then
/// interleaved text/file parts, then exactly one `finish`. Within a text
/// stream id, `text-start` precedes every `text-delta` and exactly one
/// `text-end` closes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum StreamPart {
    /// Emitted once, first
    #[serde(rename_all = "camelCase")]
    StreamStart {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        warnings: Vec<String>,
    },

    /// Emitted once, carries source-provided response identifiers
    #[serde(rename_all = "camelCase")]
    ResponseMetadata {
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        timestamp: Option<DateTime<Utc>>,
    },

    /// Opens a text stream for the given id
    #[serde(rename_all = "camelCase")]
    TextStart { id: String },

    /// Incremental text for an open stream id
    #[serde(rename_all = "camelCase")]
    TextDelta { id: String, delta: String },

    /// Closes a text stream
    #[serde(rename_all = "camelCase")]
    TextEnd { id: String },

    /// A file delivered whole (base64 bytes or a URI)
    #[serde(rename_all = "camelCase")]
    File { data: String, media_type: String },

    /// Emitted once, last
    #[serde(rename_all = "camelCase")]
    Finish {
        finish_reason: FinishReason,
        usage: Usage,
        metadata: TaskMetadata,
    },
}

/// Why the stream finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FinishReason {
    /// Normal completion (also used for input-required pauses)
    Stop,

    /// The task failed
    Error,

    /// The task was canceled
    Canceled,

    /// The event source ended without a terminal state
    Unknown,
}

impl FinishReason {
    /// Map a task lifecycle state to a finish reason.
    ///
    /// Returns `None` for non-terminal states that carry no finish
    /// semantics yet (`submitted`, `working`).
    pub fn from_state(state: TaskState) -> Option<Self> {
        match state {
            TaskState::Completed | TaskState::InputRequired => Some(FinishReason::Stop),
            TaskState::Failed => Some(FinishReason::Error),
            TaskState::Canceled => Some(FinishReason::Canceled),
            TaskState::Submitted | TaskState::Working => None,
        }
    }
}

/// Token usage. A2A carries no token accounting, so both sides stay unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<u64>,
}

/// Metadata accumulated over one reconciliation run.
///
/// Built incrementally while events are consumed and handed to the caller
/// in the final `finish` part; not retained afterwards.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskMetadata {
    /// Task ID, once known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,

    /// Context ID, once known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,

    /// Most recent task lifecycle state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_state: Option<TaskState>,

    /// Whether the task is paused waiting for more input
    #[serde(default)]
    pub input_required: bool,

    /// Most recent status message text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,

    /// Artifacts seen so far, in first-appearance order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<Artifact>,

    /// Authoritative final text, captured from the `completed`
    /// status-update. Downstream consumers should prefer this over any
    /// text assembled from live deltas.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_text: Option<String>,
}

impl TaskMetadata {
    /// Record identifiers and state from a status-bearing event.
    pub fn record_state(&mut self, task_id: &str, context_id: Option<&str>, state: TaskState) {
        self.task_id.get_or_insert_with(|| task_id.to_string());
        if let Some(ctx) = context_id {
            self.context_id.get_or_insert_with(|| ctx.to_string());
        }
        self.task_state = Some(state);
        self.input_required = state.is_input_required();
    }

    /// Add or replace an artifact by id, preserving first-appearance order.
    ///
    /// Returns `false` when the stored artifact already has identical
    /// content, which callers use to suppress duplicate re-emission.
    pub fn upsert_artifact(&mut self, artifact: Artifact) -> bool {
        if let Some(existing) = self
            .artifacts
            .iter_mut()
            .find(|a| a.artifact_id == artifact.artifact_id)
        {
            if *existing == artifact {
                return false;
            }
            *existing = artifact;
        } else {
            self.artifacts.push(artifact);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_type_tags() {
        let start = serde_json::to_value(StreamPart::StreamStart { warnings: vec![] }).unwrap();
        assert_eq!(start["type"], "stream-start");

        let delta = serde_json::to_value(StreamPart::TextDelta {
            id: "t1".into(),
            delta: "hi".into(),
        })
        .unwrap();
        assert_eq!(delta["type"], "text-delta");
        assert_eq!(delta["id"], "t1");
        assert_eq!(delta["delta"], "hi");

        let file = serde_json::to_value(StreamPart::File {
            data: "aGk=".into(),
            media_type: "text/plain".into(),
        })
        .unwrap();
        assert_eq!(file["type"], "file");
        assert_eq!(file["mediaType"], "text/plain");
    }

    #[test]
    fn test_finish_serialization() {
        let finish = StreamPart::Finish {
            finish_reason: FinishReason::Stop,
            usage: Usage::default(),
            metadata: TaskMetadata {
                final_text: Some("done".into()),
                ..Default::default()
            },
        };
        let json = serde_json::to_value(&finish).unwrap();
        assert_eq!(json["type"], "finish");
        assert_eq!(json["finishReason"], "stop");
        assert_eq!(json["metadata"]["finalText"], "done");
    }

    #[test]
    fn test_finish_reason_mapping() {
        assert_eq!(
            FinishReason::from_state(TaskState::Completed),
            Some(FinishReason::Stop)
        );
        assert_eq!(
            FinishReason::from_state(TaskState::InputRequired),
            Some(FinishReason::Stop)
        );
        assert_eq!(
            FinishReason::from_state(TaskState::Failed),
            Some(FinishReason::Error)
        );
        assert_eq!(
            FinishReason::from_state(TaskState::Canceled),
            Some(FinishReason::Canceled)
        );
        assert_eq!(FinishReason::from_state(TaskState::Working), None);
        assert_eq!(FinishReason::from_state(TaskState::Submitted), None);
    }

    #[test]
    fn test_metadata_upsert_dedup() {
        let mut metadata = TaskMetadata::default();

        assert!(metadata.upsert_artifact(Artifact::text("a", "one")));
        // Identical content is reported unchanged
        assert!(!metadata.upsert_artifact(Artifact::text("a", "one")));
        // Changed content replaces in place
        assert!(metadata.upsert_artifact(Artifact::text("a", "two")));
        assert_eq!(metadata.artifacts.len(), 1);
        assert_eq!(metadata.artifacts[0].text_content(), "two");
    }
}
