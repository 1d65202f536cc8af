//! # Relaykit A2A - Agent2Agent Protocol Layer
//!
//! Wire types and an event-source client for the Agent2Agent (A2A)
//! protocol: the task/message/artifact lifecycle carried over JSON-RPC
//! and Server-Sent Events.
//!
//! ## Protocol Overview
//!
//! 1. **Tasks**: units of work with lifecycle states
//!    (`submitted → working → completed | failed | canceled | input-required`)
//! 2. **Messages**: conversational turns made of content parts
//! 3. **Artifacts**: named outputs attached to a task, delivered
//!    incrementally or at once
//! 4. **Events**: `task`, `message`, `status-update`, `artifact-update`
//!    snapshots and notifications, discriminated by `kind`
//!
//! ## Example: Working with Tasks
//!
//! ```rust
//! use relaykit_a2a::{Task, TaskState};
//!
//! let mut task = Task::new("task-001");
//! assert_eq!(task.status.state, TaskState::Submitted);
//!
//! task.set_state(TaskState::Working);
//! task.set_state(TaskState::Completed);
//! assert!(task.is_terminal());
//! ```
//!
//! ## Example: Consuming an event stream
//!
//! ```rust,ignore
//! use futures::StreamExt;
//! use relaykit_a2a::{A2aClient, A2aEvent, Message};
//!
//! let client = A2aClient::new("https://agent.example.com/a2a")?;
//! let mut events = client.send_message_streaming(Message::user("Hello")).await?;
//!
//! while let Some(event) = events.next().await {
//!     match event? {
//!         A2aEvent::StatusUpdate(update) if update.is_final => break,
//!         other => println!("{:?}", other),
//!     }
//! }
//! ```

pub mod error;
pub mod types;

// Client module (requires client feature)
#[cfg(feature = "client")]
pub mod client;

// Re-export core types
pub use error::{A2aError, A2aResult, ErrorResponse};
pub use types::{
    // Event types
    A2aEvent,
    // Artifact types
    Artifact,
    // Part types
    DataPart,
    FileContent,
    FilePart,
    // Message types
    Message,
    Part,
    Role,
    // Task types
    Task,
    TaskArtifactUpdateEvent,
    TaskState,
    TaskStatus,
    TaskStatusUpdateEvent,
    TextPart,
};

// Re-export client types
#[cfg(feature = "client")]
pub use client::{A2aClient, AuthConfig, EventStream, single_event_stream};
