//! Task types for the A2A protocol.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use super::{Artifact, Message};

/// A task represents a unit of work in the A2A protocol.
///
/// Tasks progress through a bounded lifecycle of states and accumulate
/// artifacts as output. A `Task` event on the wire is a snapshot of that
/// state at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier for the task
    pub id: String,

    /// Optional context ID for grouping related tasks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,

    /// Current status of the task
    pub status: TaskStatus,

    /// Artifacts accumulated so far
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<Artifact>,

    /// Messages exchanged so far
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<Message>,

    /// Additional metadata
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Task {
    /// Create a new task with the given ID in the `submitted` state
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            context_id: None,
            status: TaskStatus::state(TaskState::Submitted),
            artifacts: Vec::new(),
            history: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    /// Create a new task with a generated UUID
    pub fn new_with_uuid() -> Self {
        Self::new(Uuid::new_v4().to_string())
    }

    /// Set the context ID
    pub fn with_context_id(mut self, context_id: impl Into<String>) -> Self {
        self.context_id = Some(context_id.into());
        self
    }

    /// Add a message to the task history
    pub fn add_message(&mut self, message: Message) {
        self.history.push(message);
    }

    /// Add or replace an artifact by its ID, preserving first-appearance order
    pub fn upsert_artifact(&mut self, artifact: Artifact) {
        if let Some(existing) = self
            .artifacts
            .iter_mut()
            .find(|a| a.artifact_id == artifact.artifact_id)
        {
            *existing = artifact;
        } else {
            self.artifacts.push(artifact);
        }
    }

    /// Update the task state
    pub fn set_state(&mut self, state: TaskState) {
        self.status = TaskStatus {
            state,
            message: self.status.message.take(),
            timestamp: Some(Utc::now()),
        };
    }

    /// Check if the task is in a terminal state
    pub fn is_terminal(&self) -> bool {
        self.status.state.is_terminal()
    }

    /// Check if the task requires input
    pub fn requires_input(&self) -> bool {
        self.status.state.is_input_required()
    }
}

/// Status of a task: its lifecycle state plus an optional status message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatus {
    /// Current lifecycle state
    pub state: TaskState,

    /// Optional message carried with this status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,

    /// When this status was produced
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl TaskStatus {
    /// Create a status with the given state and no message
    pub fn state(state: TaskState) -> Self {
        Self {
            state,
            message: None,
            timestamp: Some(Utc::now()),
        }
    }

    /// Create a status with a message
    pub fn with_message(state: TaskState, message: Message) -> Self {
        Self {
            state,
            message: Some(message),
            timestamp: Some(Utc::now()),
        }
    }

    /// Text of the status message, empty when no message is present.
    pub fn message_text(&self) -> String {
        self.message.as_ref().map(|m| m.text()).unwrap_or_default()
    }
}

/// Task lifecycle state.
///
/// `submitted → working → (input-required | completed | failed | canceled)`.
/// `input-required` can loop back to `working` once more user input arrives;
/// `completed`, `failed` and `canceled` are terminal for an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskState {
    /// Task has been received but not started
    Submitted,

    /// Task is actively being processed
    Working,

    /// Task requires additional input to proceed
    InputRequired,

    /// Task completed successfully
    Completed,

    /// Task failed due to an error
    Failed,

    /// Task was canceled
    Canceled,
}

impl TaskState {
    /// Check if this state is terminal (no further processing will occur)
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::Failed | TaskState::Canceled
        )
    }

    /// Check if this state indicates input is required
    pub fn is_input_required(self) -> bool {
        self == TaskState::InputRequired
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskState::Submitted => write!(f, "submitted"),
            TaskState::Working => write!(f, "working"),
            TaskState::InputRequired => write!(f, "input-required"),
            TaskState::Completed => write!(f, "completed"),
            TaskState::Failed => write!(f, "failed"),
            TaskState::Canceled => write!(f, "canceled"),
        }
    }
}
