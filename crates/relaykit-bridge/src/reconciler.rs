//! Stream Reconciler
//!
//! Consumes a raw async sequence of A2A protocol events for a single agent
//! invocation and produces the generic stream-part sequence a chat-SDK
//! consumer renders from, while accumulating side-channel metadata
//! (task/context ids, lifecycle state, artifacts, authoritative final
//! text) that is handed over in the final `finish` part.
//!
//! The hard part is that A2A agents may emit either true incremental
//! deltas or full cumulative snapshots per update; the reconciler converts
//! both into a single non-duplicated delta stream (see
//! [`SnapshotTracker`](crate::tracker)).
//!
//! # Example
//!
//! ```rust,ignore
//! use futures::StreamExt;
//! use relaykit_bridge::reconcile;
//!
//! let events = client.send_message_streaming(message).await?;
//! let mut parts = std::pin::pin!(reconcile(events));
//!
//! while let Some(part) = parts.next().await {
//!     println!("{:?}", part?);
//! }
//! ```

use futures::{Stream, StreamExt};

use relaykit_a2a::{
    A2aEvent, A2aResult, Message, Task, TaskArtifactUpdateEvent, TaskState, TaskStatusUpdateEvent,
};

use crate::error::BridgeResult;
use crate::stream::{FinishReason, StreamPart, TaskMetadata, Usage};
use crate::tracker::{SnapshotTracker, emit_file_parts, text_of_parts};

/// Translate a stream of A2A protocol events into generic stream parts.
///
/// The returned stream yields `stream-start` first, `response-metadata`
/// once the first event arrives, then text/file parts, and exactly one
/// `finish` carrying the accumulated [`TaskMetadata`] — unless the event
/// source fails, in which case the error is yielded as the last item and
/// no `finish` is emitted (partial metadata is discarded, not silently
/// completed).
///
/// Tracking state is fresh per call; invocations are independent.
pub fn reconcile<S>(events: S) -> impl Stream<Item = BridgeResult<StreamPart>>
where
    S: Stream<Item = A2aResult<A2aEvent>>,
{
    async_stream::stream! {
        let mut tracker = SnapshotTracker::new();
        let mut metadata = TaskMetadata::default();
        let mut finish_reason = FinishReason::Unknown;
        let mut announced = false;

        yield Ok(StreamPart::StreamStart { warnings: Vec::new() });

        let mut events = std::pin::pin!(events);
        while let Some(next) = events.next().await {
            let event = match next {
                Ok(event) => event,
                Err(e) => {
                    // Abnormal termination: propagate and emit no finish.
                    yield Err(e.into());
                    return;
                }
            };

            if !announced {
                announced = true;
                yield Ok(response_metadata(&event));
            }

            let mut out = Vec::new();
            apply_event(
                event,
                &mut tracker,
                &mut metadata,
                &mut finish_reason,
                &mut out,
            );
            for part in out {
                yield Ok(part);
            }
        }

        // Flush: close any still-open streams before finishing.
        let mut out = Vec::new();
        tracker.flush_open(&mut out);
        for part in out {
            yield Ok(part);
        }

        yield Ok(StreamPart::Finish {
            finish_reason,
            usage: Usage::default(),
            metadata,
        });
    }
}

/// Build the one-time `response-metadata` part from the first event.
fn response_metadata(event: &A2aEvent) -> StreamPart {
    let id = match event {
        A2aEvent::Message(message) => Some(message.message_id.clone()),
        other => other.task_id().map(str::to_string),
    };
    let timestamp = match event {
        A2aEvent::StatusUpdate(update) => update.status.timestamp,
        A2aEvent::Task(task) => task.status.timestamp,
        _ => None,
    };
    StreamPart::ResponseMetadata { id, timestamp }
}

/// Dispatch one protocol event into stream parts and metadata updates.
fn apply_event(
    event: A2aEvent,
    tracker: &mut SnapshotTracker,
    metadata: &mut TaskMetadata,
    finish_reason: &mut FinishReason,
    out: &mut Vec<StreamPart>,
) {
    match event {
        A2aEvent::StatusUpdate(update) => {
            apply_status_update(update, tracker, metadata, finish_reason, out)
        }
        A2aEvent::ArtifactUpdate(update) => apply_artifact_update(update, tracker, metadata, out),
        A2aEvent::Task(task) => apply_task(task, tracker, metadata, finish_reason, out),
        A2aEvent::Message(message) => {
            apply_message(message, tracker, metadata, finish_reason, out)
        }
    }
}

/// `status-update`: snapshot-to-delta keyed by taskId.
///
/// A `completed` update closes the task's stream and captures the full
/// snapshot as the authoritative final text, independent of whatever
/// partial delta was or wasn't emitted on the live stream.
fn apply_status_update(
    update: TaskStatusUpdateEvent,
    tracker: &mut SnapshotTracker,
    metadata: &mut TaskMetadata,
    finish_reason: &mut FinishReason,
    out: &mut Vec<StreamPart>,
) {
    let state = update.state();
    metadata.record_state(&update.task_id, update.context_id.as_deref(), state);

    let text = update.status.message_text();
    if let Some(message) = &update.status.message {
        metadata.status_message = Some(text.clone());
        emit_file_parts(&message.parts, out);
    }

    if state == TaskState::Completed && update.status.message.is_some() {
        metadata.final_text = Some(text.clone());
    }

    if update.status.message.is_some() {
        tracker.apply_snapshot(&update.task_id, &text, state == TaskState::Completed, out);
    } else if state == TaskState::Completed {
        // No message to diff, but the stream still closes here.
        tracker.close(&update.task_id, out);
    }

    if let Some(reason) = FinishReason::from_state(state) {
        *finish_reason = reason;
    }
}

/// `artifact-update`: snapshot-to-delta keyed by artifactId, with
/// content-diff dedup against the artifact already stored in metadata.
fn apply_artifact_update(
    update: TaskArtifactUpdateEvent,
    tracker: &mut SnapshotTracker,
    metadata: &mut TaskMetadata,
    out: &mut Vec<StreamPart>,
) {
    metadata
        .task_id
        .get_or_insert_with(|| update.task_id.clone());
    if let Some(ctx) = &update.context_id {
        metadata.context_id.get_or_insert_with(|| ctx.clone());
    }

    let artifact_id = update.artifact.artifact_id.clone();
    let text = update.artifact.text_content();
    let parts = update.artifact.parts.clone();

    if !metadata.upsert_artifact(update.artifact) {
        // Identical content resent for the same id: suppress entirely.
        return;
    }

    emit_file_parts(&parts, out);
    tracker.apply_snapshot(&artifact_id, &text, update.last_chunk, out);
}

/// `task`: a full snapshot, generally arriving after status-updates for
/// the same task. Must not duplicate content already streamed — only the
/// tail beyond the tracked snapshot is emitted, and the stream ends
/// closed. With no prior streaming (non-streaming agent), the full
/// content goes out as a fresh, immediately-closed stream.
fn apply_task(
    task: Task,
    tracker: &mut SnapshotTracker,
    metadata: &mut TaskMetadata,
    finish_reason: &mut FinishReason,
    out: &mut Vec<StreamPart>,
) {
    let state = task.status.state;
    metadata.record_state(&task.id, task.context_id.as_deref(), state);

    for artifact in task.artifacts {
        metadata.upsert_artifact(artifact);
    }

    let text = task.status.message_text();
    if let Some(message) = &task.status.message {
        metadata.status_message = Some(text.clone());
        emit_file_parts(&message.parts, out);
        tracker.apply_snapshot(&task.id, &text, true, out);
    } else {
        tracker.close(&task.id, out);
    }

    if let Some(reason) = FinishReason::from_state(state) {
        *finish_reason = reason;
    }
}

/// `message`: a standalone turn — an immediately-opened-and-closed stream
/// keyed by messageId, plus a `file` part per file.
fn apply_message(
    message: Message,
    tracker: &mut SnapshotTracker,
    metadata: &mut TaskMetadata,
    finish_reason: &mut FinishReason,
    out: &mut Vec<StreamPart>,
) {
    if let Some(ctx) = &message.context_id {
        metadata.context_id.get_or_insert_with(|| ctx.clone());
    }

    emit_file_parts(&message.parts, out);

    let text = text_of_parts(&message.parts);
    tracker.apply_snapshot(&message.message_id, &text, true, out);

    if *finish_reason == FinishReason::Unknown {
        *finish_reason = FinishReason::Stop;
    }
}
