//! Wire events for the A2A protocol, discriminated by `kind`.

use serde::{Deserialize, Serialize};

use super::{Artifact, Message, Task, TaskState, TaskStatus};

/// A single event on an A2A event stream.
///
/// Non-streaming responses carry exactly one of these (a `task` or
/// `message`); streaming responses deliver a sequence ending with a
/// status-update whose `final` flag is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum A2aEvent {
    /// Snapshot of a task's current state
    #[serde(rename = "task")]
    Task(Task),

    /// A standalone conversational turn
    #[serde(rename = "message")]
    Message(Message),

    /// Incremental notification about a task's status
    StatusUpdate(TaskStatusUpdateEvent),

    /// Incremental notification about an artifact being produced
    ArtifactUpdate(TaskArtifactUpdateEvent),
}

impl A2aEvent {
    /// Build a status-update event
    pub fn status_update(
        task_id: impl Into<String>,
        context_id: Option<String>,
        status: TaskStatus,
        is_final: bool,
    ) -> Self {
        A2aEvent::StatusUpdate(TaskStatusUpdateEvent {
            task_id: task_id.into(),
            context_id,
            status,
            is_final,
        })
    }

    /// Build an artifact-update event
    pub fn artifact_update(
        task_id: impl Into<String>,
        context_id: Option<String>,
        artifact: Artifact,
        last_chunk: bool,
    ) -> Self {
        A2aEvent::ArtifactUpdate(TaskArtifactUpdateEvent {
            task_id: task_id.into(),
            context_id,
            artifact,
            last_chunk,
        })
    }

    /// The task ID this event refers to, if any
    pub fn task_id(&self) -> Option<&str> {
        match self {
            A2aEvent::Task(task) => Some(&task.id),
            A2aEvent::Message(message) => message.task_id.as_deref(),
            A2aEvent::StatusUpdate(update) => Some(&update.task_id),
            A2aEvent::ArtifactUpdate(update) => Some(&update.task_id),
        }
    }

    /// The context ID carried by this event, if any
    pub fn context_id(&self) -> Option<&str> {
        match self {
            A2aEvent::Task(task) => task.context_id.as_deref(),
            A2aEvent::Message(message) => message.context_id.as_deref(),
            A2aEvent::StatusUpdate(update) => update.context_id.as_deref(),
            A2aEvent::ArtifactUpdate(update) => update.context_id.as_deref(),
        }
    }

    /// Whether this event ends the task's event stream
    pub fn is_final(&self) -> bool {
        match self {
            A2aEvent::StatusUpdate(update) => update.is_final,
            A2aEvent::Task(task) => task.is_terminal(),
            _ => false,
        }
    }
}

/// Event for task status updates during streaming
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatusUpdateEvent {
    /// Task ID
    pub task_id: String,

    /// Optional context ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,

    /// New status
    pub status: TaskStatus,

    /// No more updates will follow for this task when set
    #[serde(default, rename = "final")]
    pub is_final: bool,
}

impl TaskStatusUpdateEvent {
    /// The lifecycle state carried by this update
    pub fn state(&self) -> TaskState {
        self.status.state
    }
}

/// Event for artifact updates during streaming
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskArtifactUpdateEvent {
    /// Task ID
    pub task_id: String,

    /// Optional context ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,

    /// The artifact being added or updated
    pub artifact: Artifact,

    /// Whether this is the final chunk for this artifact
    #[serde(default)]
    pub last_chunk: bool,
}
