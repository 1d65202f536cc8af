//! A2A Protocol Core Types
//!
//! This module defines the wire-level data types for the Agent2Agent (A2A)
//! protocol: tasks, messages, content parts, artifacts, and the streaming
//! events that carry them. Field names and `kind` discriminators serialize
//! exactly as the protocol requires; they are the interoperability contract
//! with A2A-compliant peers.
//!
//! ## Module Structure
//!
//! - [`task`] - Task lifecycle and status types
//! - [`message`] - Message and role types
//! - [`part`] - Content part types (text, file, data)
//! - [`artifact`] - Task output artifacts
//! - [`event`] - Streaming event types

mod artifact;
mod event;
mod message;
mod part;
mod task;

// Re-export all types for convenience
pub use artifact::Artifact;
pub use event::{A2aEvent, TaskArtifactUpdateEvent, TaskStatusUpdateEvent};
pub use message::{Message, Role};
pub use part::{DataPart, FileContent, FilePart, Part, TextPart};
pub use task::{Task, TaskState, TaskStatus};
