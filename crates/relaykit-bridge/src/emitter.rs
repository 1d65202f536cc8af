//! Protocol Emitter
//!
//! Exposes a generic tool-calling agent *as* an A2A agent: given a user
//! turn (and optionally an existing task for follow-ups), it invokes the
//! agent and publishes the protocol event sequence an A2A-compliant
//! client expects — initial task snapshot, working status, optional
//! artifact updates, and exactly one terminal status.
//!
//! This is the mirror image of the [reconciler](crate::reconciler): where
//! the reconciler must cope with agents that send cumulative snapshots,
//! the emitter is free to choose its wire shape and sends true deltas,
//! one self-contained status-update message per chunk.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::StreamExt;
use tracing::{error, info, warn};

use relaykit_a2a::{A2aEvent, Artifact, Message, Task, TaskState, TaskStatus};

use crate::bus::EventBus;
use crate::error::BridgeResult;
use crate::invoker::AgentInvoker;

// ============================================================================
// Cancellation
// ============================================================================

/// Shared set of cancelled task ids.
///
/// Cancellation is cooperative: callers add a task id here and the emitter
/// checks it before invoking the agent and after every streamed chunk.
/// In-flight calls that don't yield control are not interrupted.
#[derive(Debug, Clone, Default)]
pub struct CancellationSet {
    inner: Arc<Mutex<HashSet<String>>>,
}

impl CancellationSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a task as cancelled
    pub fn cancel(&self, task_id: impl Into<String>) {
        self.lock().insert(task_id.into());
    }

    /// Check whether a task has been cancelled
    pub fn is_cancelled(&self, task_id: &str) -> bool {
        self.lock().contains(task_id)
    }

    /// Remove a task id once its lifecycle has reached a terminal event
    pub fn clear(&self, task_id: &str) {
        self.lock().remove(task_id);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

// ============================================================================
// Strategy seams
// ============================================================================

/// Parses embedded structured artifacts (e.g. fenced code blocks) out of
/// the accumulating response text. Re-run after every chunk in stream
/// mode; emission is content-diffed so unchanged artifacts are not
/// republished.
pub trait ArtifactExtractor: Send + Sync {
    fn extract(&self, response: &str) -> Vec<Artifact>;
}

/// Produces additional artifacts from the complete response text after a
/// generate-mode invocation. Best-effort: failures are logged and the
/// task still completes.
#[async_trait]
pub trait ArtifactGenerator: Send + Sync {
    async fn generate(&self, response: &str) -> BridgeResult<Vec<Artifact>>;
}

/// Detects a non-`completed` terminal state from the response text (e.g.
/// an input-required sentinel). `None` means complete normally.
pub trait TaskStateParser: Send + Sync {
    fn parse(&self, response: &str) -> Option<TaskState>;
}

/// Builds the terminal status message text from the raw response and the
/// artifacts extracted so far. Absent, the raw response is used.
pub trait FinalMessageBuilder: Send + Sync {
    fn build(&self, response: &str, artifacts: &[Artifact]) -> String;
}

// ============================================================================
// Configuration
// ============================================================================

/// How the emitter drives the agent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitterMode {
    /// Await the complete text, then publish one terminal status
    Generate,

    /// Stream text chunks as non-final status-updates
    Stream,
}

/// Per-instance emitter configuration.
///
/// Every strategy seam is independently optional; defaults are documented
/// on each trait.
#[derive(Clone, Default)]
pub struct EmitterConfig {
    pub mode: EmitterMode,
    pub artifact_extractor: Option<Arc<dyn ArtifactExtractor>>,
    pub artifact_generator: Option<Arc<dyn ArtifactGenerator>>,
    pub task_state_parser: Option<Arc<dyn TaskStateParser>>,
    pub final_message_builder: Option<Arc<dyn FinalMessageBuilder>>,
}

impl Default for EmitterMode {
    fn default() -> Self {
        EmitterMode::Generate
    }
}

impl std::fmt::Debug for EmitterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmitterConfig")
            .field("mode", &self.mode)
            .field("has_artifact_extractor", &self.artifact_extractor.is_some())
            .field("has_artifact_generator", &self.artifact_generator.is_some())
            .field("has_task_state_parser", &self.task_state_parser.is_some())
            .field(
                "has_final_message_builder",
                &self.final_message_builder.is_some(),
            )
            .finish()
    }
}

impl EmitterConfig {
    /// Generate-mode configuration
    pub fn generate() -> Self {
        Self {
            mode: EmitterMode::Generate,
            ..Self::default()
        }
    }

    /// Stream-mode configuration
    pub fn stream() -> Self {
        Self {
            mode: EmitterMode::Stream,
            ..Self::default()
        }
    }

    /// Set the artifact extractor
    pub fn with_artifact_extractor(mut self, extractor: Arc<dyn ArtifactExtractor>) -> Self {
        self.artifact_extractor = Some(extractor);
        self
    }

    /// Set the artifact generator
    pub fn with_artifact_generator(mut self, generator: Arc<dyn ArtifactGenerator>) -> Self {
        self.artifact_generator = Some(generator);
        self
    }

    /// Set the task state parser
    pub fn with_task_state_parser(mut self, parser: Arc<dyn TaskStateParser>) -> Self {
        self.task_state_parser = Some(parser);
        self
    }

    /// Set the final message builder
    pub fn with_final_message_builder(mut self, builder: Arc<dyn FinalMessageBuilder>) -> Self {
        self.final_message_builder = Some(builder);
        self
    }
}

// ============================================================================
// Emitter
// ============================================================================

/// Publishes a valid A2A task lifecycle for each agent invocation.
pub struct ProtocolEmitter {
    bus: Arc<dyn EventBus>,
    invoker: Arc<dyn AgentInvoker>,
    config: EmitterConfig,
    cancellations: CancellationSet,
}

impl std::fmt::Debug for ProtocolEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProtocolEmitter")
            .field("config", &self.config)
            .finish()
    }
}

impl ProtocolEmitter {
    /// Create a new emitter
    pub fn new(
        bus: Arc<dyn EventBus>,
        invoker: Arc<dyn AgentInvoker>,
        config: EmitterConfig,
    ) -> Self {
        Self {
            bus,
            invoker,
            config,
            cancellations: CancellationSet::new(),
        }
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

    /// Mark a task as cancelled; honored at the next cooperative check
    pub fn cancel_task(&self, task_id: impl Into<String>) {
        self.cancellations.cancel(task_id);
    }

    /// Execute one task turn.
    ///
    /// Publishes the task snapshot, a working status, mode-specific body
    /// events, and exactly one terminal status-update — the task is never
    /// left without a terminal event. Agent failures become a `failed`
    /// terminal status rather than an error from this method.
    pub async fn execute(&self, message: Message, existing: Option<Task>) -> BridgeResult<Task> {
        let mut task = match existing {
            Some(mut task) => {
                // Follow-up turn: same taskId, lifecycle starts over.
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

        info!(task_id = %task_id, mode = ?self.config.mode, "Executing task");
        self.bus.publish(A2aEvent::Task(task.clone())).await;

        // Cooperative cancellation check before invoking the agent.
        if self.cancellations.is_cancelled(&task_id) {
            self.publish_status(&mut task, TaskState::Canceled, None, true)
                .await;
            self.cancellations.clear(&task_id);
            return Ok(task);
        }

        self.publish_status(&mut task, TaskState::Working, None, false)
            .await;

        let messages = task.history.clone();
        match self.config.mode {
            EmitterMode::Generate => self.run_generate(&mut task, &messages).await,
            EmitterMode::Stream => self.run_stream(&mut task, &messages).await,
        }

        self.cancellations.clear(&task_id);
        Ok(task)
    }

    async fn run_generate(&self, task: &mut Task, messages: &[Message]) {
        match self.invoker.invoke(messages).await {
            Ok(response) => {
                self.generate_artifacts(task, &response).await;

                let state = self.terminal_state(&response);
                let text = self.final_text(&response, &task.artifacts);
                let reply = self.agent_reply(task, text);
                self.publish_status(task, state, Some(reply), true).await;
            }
            Err(e) => {
                error!(task_id = %task.id, error = %e, "Agent invocation failed");
                let reply = self.agent_reply(task, format!("Error: {}", e));
                self.publish_status(task, TaskState::Failed, Some(reply), true)
                    .await;
            }
        }
    }

    async fn run_stream(&self, task: &mut Task, messages: &[Message]) {
        let mut stream = match self.invoker.invoke_streaming(messages).await {
            Ok(stream) => stream,
            Err(e) => {
                error!(task_id = %task.id, error = %e, "Agent streaming invocation failed");
                let reply = self.agent_reply(task, format!("Error: {}", e));
                self.publish_status(task, TaskState::Failed, Some(reply), true)
                    .await;
                return;
            }
        };

        let mut response = String::new();
        let mut published: HashMap<String, Artifact> = HashMap::new();

        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    error!(task_id = %task.id, error = %e, "Agent stream failed mid-flight");
                    let reply = self.agent_reply(task, format!("Error: {}", e));
                    self.publish_status(task, TaskState::Failed, Some(reply), true)
                        .await;
                    return;
                }
            };

            // Cooperative cancellation check per chunk: a chunk received
            // after the cancel is dropped, not published.
            if self.cancellations.is_cancelled(&task.id) {
                info!(task_id = %task.id, "Task cancelled; stopping agent stream");
                break;
            }

            response.push_str(&chunk);

            // Each status-update's message is a self-contained text delta;
            // the reconciler on the far end reassembles.
            let reply = self.agent_reply(task, chunk);
            self.publish_status(task, TaskState::Working, Some(reply), false)
                .await;

            self.extract_artifacts(task, &response, &mut published).await;
        }

        // Re-checked after the stream ends so a cancel that landed during
        // the final chunk still wins over a completed terminal.
        if self.cancellations.is_cancelled(&task.id) {
            self.publish_status(task, TaskState::Canceled, None, true)
                .await;
            return;
        }

        let state = self.terminal_state(&response);
        let text = self.final_text(&response, &task.artifacts);
        let reply = self.agent_reply(task, text);
        self.publish_status(task, state, Some(reply), true).await;
    }

    /// Run the optional artifact generator over the complete response.
    /// Failures are logged and absorbed; the task still completes.
    async fn generate_artifacts(&self, task: &mut Task, response: &str) {
        let Some(generator) = &self.config.artifact_generator else {
            return;
        };

        match generator.generate(response).await {
            Ok(artifacts) => {
                for artifact in artifacts {
                    task.upsert_artifact(artifact.clone());
                    self.bus
                        .publish(A2aEvent::artifact_update(
                            &task.id,
                            task.context_id.clone(),
                            artifact,
                            true,
                        ))
                        .await;
                }
            }
            Err(e) => {
                warn!(
                    task_id = %task.id,
                    error = %e,
                    "Artifact generation failed; completing without extra artifacts"
                );
            }
        }
    }

    /// Re-run the optional extractor over the accumulated response and
    /// publish only artifacts whose content changed since last emission.
    async fn extract_artifacts(
        &self,
        task: &mut Task,
        response: &str,
        published: &mut HashMap<String, Artifact>,
    ) {
        let Some(extractor) = &self.config.artifact_extractor else {
            return;
        };

        for artifact in extractor.extract(response) {
            let unchanged = published
                .get(&artifact.artifact_id)
                .is_some_and(|prev| *prev == artifact);
            if unchanged {
                continue;
            }

            published.insert(artifact.artifact_id.clone(), artifact.clone());
            task.upsert_artifact(artifact.clone());
            self.bus
                .publish(A2aEvent::artifact_update(
                    &task.id,
                    task.context_id.clone(),
                    artifact,
                    false,
                ))
                .await;
        }
    }

    fn terminal_state(&self, response: &str) -> TaskState {
        self.config
            .task_state_parser
            .as_ref()
            .and_then(|parser| parser.parse(response))
            .unwrap_or(TaskState::Completed)
    }

    fn final_text(&self, response: &str, artifacts: &[Artifact]) -> String {
        match &self.config.final_message_builder {
            Some(builder) => builder.build(response, artifacts),
            None => response.to_string(),
        }
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
    fn test_cancellation_set() {
        let set = CancellationSet::new();
        assert!(!set.is_cancelled("task-1"));

        set.cancel("task-1");
        assert!(set.is_cancelled("task-1"));
        assert!(!set.is_cancelled("task-2"));

        set.clear("task-1");
        assert!(!set.is_cancelled("task-1"));
    }

    #[test]
    fn test_config_defaults() {
        let config = EmitterConfig::default();
        assert_eq!(config.mode, EmitterMode::Generate);
        assert!(config.artifact_extractor.is_none());
        assert!(config.artifact_generator.is_none());
        assert!(config.task_state_parser.is_none());
        assert!(config.final_message_builder.is_none());
    }
}
