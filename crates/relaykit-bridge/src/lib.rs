//! # Relaykit Bridge - A2A ↔ Agent Stream Translation
//!
//! Two complementary translation layers between the Agent2Agent (A2A)
//! protocol and a generic chat-SDK surface:
//!
//! 1. **Reconciler** ([`reconcile`]): consumes a remote A2A event stream
//!    and produces a flat, typed stream of parts (`text-start`,
//!    `text-delta`, `text-end`, `file`, `finish`, ...). Its core job is
//!    snapshot-to-delta conversion — A2A senders resend whole cumulative
//!    texts, and the reconciler diffs them into append-only deltas.
//! 2. **Emitters** ([`ProtocolEmitter`], [`DurableEmitter`]): wrap a
//!    local agent (direct invocation or a durable workflow run) and
//!    publish the A2A task lifecycle a compliant client expects, with
//!    cooperative cancellation and artifact dedup.
//!
//! ## Example: Reconciling a remote agent's events
//!
//! ```rust,ignore
//! use futures::StreamExt;
//! use relaykit_a2a::{A2aClient, Message};
//! use relaykit_bridge::{StreamPart, reconcile};
//!
//! let client = A2aClient::new("https://agent.example.com/a2a")?;
//! let events = client.send_message_streaming(Message::user("Hello")).await?;
//!
//! let mut parts = std::pin::pin!(reconcile(events));
//! while let Some(part) = parts.next().await {
//!     if let StreamPart::TextDelta { delta, .. } = part? {
//!         print!("{delta}");
//!     }
//! }
//! ```
//!
//! ## Example: Exposing a local agent over A2A
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use relaykit_bridge::{BroadcastBus, EmitterConfig, ProtocolEmitter};
//!
//! let bus = Arc::new(BroadcastBus::default());
//! let emitter = ProtocolEmitter::new(bus.clone(), invoker, EmitterConfig::stream());
//! let task = emitter.execute(Message::user("Summarize this"), None).await?;
//! ```

pub mod bus;
pub mod durable;
pub mod emitter;
pub mod error;
pub mod invoker;
pub mod reconciler;
pub mod stream;

pub(crate) mod tracker;

pub use bus::{BroadcastBus, EventBus};
pub use durable::{DurableEmitter, WorkflowOutput, WorkflowRun, WorkflowRunner};
pub use emitter::{
    ArtifactExtractor, ArtifactGenerator, CancellationSet, EmitterConfig, EmitterMode,
    FinalMessageBuilder, ProtocolEmitter, TaskStateParser,
};
pub use error::{BridgeError, BridgeResult};
pub use invoker::{AgentInvoker, TextChunkStream};
pub use reconciler::reconcile;
pub use stream::{FinishReason, StreamPart, TaskMetadata, Usage};
