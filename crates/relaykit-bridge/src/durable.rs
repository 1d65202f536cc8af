//! Durable Protocol Emitter
//!
//! Same outward event lifecycle as [`ProtocolEmitter`](crate::emitter) in
//! generate mode, but the agent invocation is delegated to a durable
//! workflow engine: the engine owns retries and persistence, and hands
//! back a run handle whose output future resolves when the workflow
//! finishes.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;
use tracing::{error, info};

use relaykit_a2a::{A2aEvent, Message, Part, Task, TaskState, TaskStatus};

use crate::bus::EventBus;
use crate::emitter::CancellationSet;
use crate::error::BridgeResult;

/// What a finished workflow run produced.
#[derive(Debug, Clone)]
pub enum WorkflowOutput {
    /// Plain response text
    Text(String),

    /// Structured parts (e.g. the final agent message verbatim)
    Parts(Vec<Part>),
}

impl WorkflowOutput {
    /// Flatten to response text. Part lists concatenate their text parts
    /// with newline separators; non-text parts are dropped.
    pub fn into_text(self) -> String {
        match self {
            WorkflowOutput::Text(text) => text,
            WorkflowOutput::Parts(parts) => parts
                .iter()
                .filter_map(Part::as_text)
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// Handle to a started workflow run.
pub struct WorkflowRun {
    /// Engine-assigned run identifier, for correlation in logs
    pub run_id: String,

    /// Resolves when the workflow finishes
    pub output: BoxFuture<'static, BridgeResult<WorkflowOutput>>,
}

impl std::fmt::Debug for WorkflowRun {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowRun")
            .field("run_id", &self.run_id)
            .finish()
    }
}

/// Seam to the durable workflow engine.
#[async_trait]
pub trait WorkflowRunner: Send + Sync {
    /// Start a workflow run for the given conversation history.
    /// `args` carries engine-specific parameters opaque to this crate.
    async fn start(&self, messages: &[Message], args: Value) -> BridgeResult<WorkflowRun>;
}

/// Emits the A2A task lifecycle around a durable workflow run.
pub struct DurableEmitter {
    bus: Arc<dyn EventBus>,
    runner: Arc<dyn WorkflowRunner>,
    args: Value,
    cancellations: CancellationSet,
}

impl std::fmt::Debug for DurableEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DurableEmitter")
            .field("args", &self.args)
            .finish()
    }
}

impl DurableEmitter {
    /// Create a new durable emitter
    pub fn new(bus: Arc<dyn EventBus>, runner: Arc<dyn WorkflowRunner>) -> Self {
        Self {
            bus,
            runner,
            args: Value::Null,
            cancellations: CancellationSet::new(),
        }
    }

    /// Engine-specific arguments passed to every workflow start
    pub fn with_args(mut self, args: Value) -> Self {
        self.args = args;
        self
    }

    /// Share an externally-owned cancellation set
    pub fn with_cancellations(mut self, cancellations: CancellationSet) -> Self {
        self.cancellations = cancellations;
        self
    }

    /// Handle to this emitter's cancellation set
    pub fn cancellations(&self) -> CancellationSet {
        self.cancellations.clone()
    }

    /// Mark a task as cancelled.
    ///
    /// Local book-keeping only: the workflow run itself is not aborted,
    /// but its result is discarded and the task ends `canceled`.
    pub fn cancel_task(&self, task_id: impl Into<String>) {
        self.cancellations.cancel(task_id);
    }

    /// Execute one task turn backed by a workflow run.
    ///
    /// Publishes the same sequence as generate-mode emission: task
    /// snapshot, working status, exactly one terminal status-update.
    pub async fn execute(&self, message: Message, existing: Option<Task>) -> BridgeResult<Task> {
        let mut task = match existing {
            Some(mut task) => {
                task.set_state(TaskState::Submitted);
                task
            }
            None => {
                let mut task = Task::new_with_uuid();
                task.context_id = message.context_id.clone();
                task
            }
        };

        let task_id = task.id.clone();
        let mut message = message;
        message.task_id = Some(task_id.clone());
        message.context_id = task.context_id.clone();
        task.add_message(message);

        info!(task_id = %task_id, "Executing durable task");
        self.bus.publish(A2aEvent::Task(task.clone())).await;

        if self.cancellations.is_cancelled(&task_id) {
            self.publish_status(&mut task, TaskState::Canceled, None, true)
                .await;
            self.cancellations.clear(&task_id);
            return Ok(task);
        }

        self.publish_status(&mut task, TaskState::Working, None, false)
            .await;

        let messages = task.history.clone();
        let run = match self.runner.start(&messages, self.args.clone()).await {
            Ok(run) => run,
            Err(e) => {
                error!(task_id = %task_id, error = %e, "Workflow start failed");
                let reply = self.agent_reply(&task, format!("Error: {}", e));
                self.publish_status(&mut task, TaskState::Failed, Some(reply), true)
                    .await;
                self.cancellations.clear(&task_id);
                return Ok(task);
            }
        };

        info!(task_id = %task_id, run_id = %run.run_id, "Workflow started");

        match run.output.await {
            Ok(output) => {
                // A cancel that landed while the run was in flight wins
                // over the run's result.
                if self.cancellations.is_cancelled(&task_id) {
                    info!(task_id = %task_id, "Task cancelled; discarding workflow output");
                    self.publish_status(&mut task, TaskState::Canceled, None, true)
                        .await;
                } else {
                    let reply = self.agent_reply(&task, output.into_text());
                    self.publish_status(&mut task, TaskState::Completed, Some(reply), true)
                        .await;
                }
            }
            Err(e) => {
                error!(task_id = %task_id, error = %e, "Workflow run failed");
                let reply = self.agent_reply(&task, format!("Error: {}", e));
                self.publish_status(&mut task, TaskState::Failed, Some(reply), true)
                    .await;
            }
        }

        self.cancellations.clear(&task_id);
        Ok(task)
    }

    fn agent_reply(&self, task: &Task, text: impl Into<String>) -> Message {
        let mut reply = Message::agent(text);
        reply.task_id = Some(task.id.clone());
        reply.context_id = task.context_id.clone();
        reply
    }

    async fn publish_status(
        &self,
        task: &mut Task,
        state: TaskState,
        message: Option<Message>,
        is_final: bool,
    ) {
        let status = match message {
            Some(message) => TaskStatus::with_message(state, message),
            None => TaskStatus::state(state),
        };
        task.status = status.clone();

        self.bus
            .publish(A2aEvent::status_update(
                &task.id,
                task.context_id.clone(),
                status,
                is_final,
            ))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_text_passthrough() {
        let output = WorkflowOutput::Text("done".into());
        assert_eq!(output.into_text(), "done");
    }

    #[test]
    fn test_output_parts_flatten_with_newlines() {
        let output = WorkflowOutput::Parts(vec![
            Part::text("first"),
            Part::file_uri("https://example.com/report.pdf", "application/pdf"),
            Part::text("second"),
        ]);
        assert_eq!(output.into_text(), "first\nsecond");
    }

    #[test]
    fn test_output_parts_empty() {
        let output = WorkflowOutput::Parts(vec![]);
        assert_eq!(output.into_text(), "");
    }
}
