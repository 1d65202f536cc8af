//! End-to-end reconciliation scenarios: A2A event sequences in, generic
//! stream parts out.

use futures::StreamExt;

use relaykit_a2a::{
    A2aError, A2aEvent, A2aResult, Artifact, Message, Part, Task, TaskState, TaskStatus,
};
use relaykit_bridge::{BridgeResult, FinishReason, StreamPart, TaskMetadata, reconcile};

fn status_event(task_id: &str, state: TaskState, text: Option<&str>) -> A2aEvent {
    let status = match text {
        Some(text) => TaskStatus::with_message(state, Message::agent(text)),
        None => TaskStatus::state(state),
    };
    A2aEvent::status_update(task_id, Some("ctx-1".to_string()), status, state.is_terminal())
}

fn artifact_event(task_id: &str, artifact: Artifact, last_chunk: bool) -> A2aEvent {
    A2aEvent::artifact_update(task_id, Some("ctx-1".to_string()), artifact, last_chunk)
}

async fn run(events: Vec<A2aResult<A2aEvent>>) -> Vec<BridgeResult<StreamPart>> {
    reconcile(futures::stream::iter(events)).collect().await
}

async fn run_ok(events: Vec<A2aEvent>) -> Vec<StreamPart> {
    run(events.into_iter().map(Ok).collect())
        .await
        .into_iter()
        .map(|part| part.expect("stream part"))
        .collect()
}

fn deltas(parts: &[StreamPart]) -> String {
    parts
        .iter()
        .filter_map(|p| match p {
            StreamPart::TextDelta { delta, .. } => Some(delta.as_str()),
            _ => None,
        })
        .collect()
}

fn text_end_count(parts: &[StreamPart], id: &str) -> usize {
    parts
        .iter()
        .filter(|p| matches!(p, StreamPart::TextEnd { id: end } if end == id))
        .count()
}

fn finish(parts: &[StreamPart]) -> (&FinishReason, &TaskMetadata) {
    match parts.last().expect("non-empty stream") {
        StreamPart::Finish {
            finish_reason,
            metadata,
            ..
        } => (finish_reason, metadata),
        other => panic!("expected finish part, got {other:?}"),
    }
}

#[tokio::test]
async fn test_snapshot_suffix_extension() {
    let parts = run_ok(vec![
        status_event("task-1", TaskState::Working, Some("Hello")),
        status_event("task-1", TaskState::Completed, Some("Hello world")),
    ])
    .await;

    assert_eq!(parts[0], StreamPart::StreamStart { warnings: vec![] });
    assert!(matches!(
        &parts[1],
        StreamPart::ResponseMetadata { id: Some(id), .. } if id == "task-1"
    ));
    assert_eq!(parts[2], StreamPart::TextStart { id: "task-1".into() });
    assert_eq!(
        parts[3],
        StreamPart::TextDelta {
            id: "task-1".into(),
            delta: "Hello".into()
        }
    );
    assert_eq!(
        parts[4],
        StreamPart::TextDelta {
            id: "task-1".into(),
            delta: " world".into()
        }
    );
    assert_eq!(parts[5], StreamPart::TextEnd { id: "task-1".into() });

    let (reason, metadata) = finish(&parts);
    assert_eq!(*reason, FinishReason::Stop);
    assert_eq!(metadata.final_text.as_deref(), Some("Hello world"));
    assert_eq!(metadata.task_state, Some(TaskState::Completed));
    assert_eq!(metadata.context_id.as_deref(), Some("ctx-1"));
}

#[tokio::test]
async fn test_extension_sequence_concatenates_to_final_text() {
    let parts = run_ok(vec![
        status_event("task-1", TaskState::Working, Some("The answer")),
        status_event("task-1", TaskState::Working, Some("The answer is")),
        status_event("task-1", TaskState::Completed, Some("The answer is 42")),
    ])
    .await;

    assert_eq!(deltas(&parts), "The answer is 42");
    let (_, metadata) = finish(&parts);
    assert_eq!(metadata.final_text.as_deref(), Some("The answer is 42"));
}

#[tokio::test]
async fn test_lone_task_event_emits_immediately() {
    let mut task = Task::new("task-9").with_context_id("ctx-1");
    task.status = TaskStatus::with_message(TaskState::Completed, Message::agent("42 is prime"));

    let parts = run_ok(vec![A2aEvent::Task(task)]).await;

    assert_eq!(parts[2], StreamPart::TextStart { id: "task-9".into() });
    assert_eq!(
        parts[3],
        StreamPart::TextDelta {
            id: "task-9".into(),
            delta: "42 is prime".into()
        }
    );
    assert_eq!(parts[4], StreamPart::TextEnd { id: "task-9".into() });

    let (reason, metadata) = finish(&parts);
    assert_eq!(*reason, FinishReason::Stop);
    assert_eq!(metadata.task_state, Some(TaskState::Completed));
    // Authoritative final text is a status-update concept; a bare task
    // snapshot does not set it.
    assert!(metadata.final_text.is_none());
}

#[tokio::test]
async fn test_divergent_snapshot_suppressed_final_text_authoritative() {
    let parts = run_ok(vec![
        status_event("task-1", TaskState::Working, Some("Hello")),
        status_event("task-1", TaskState::Completed, Some("Goodbye")),
    ])
    .await;

    // The diverging completed snapshot emits no live delta.
    assert_eq!(deltas(&parts), "Hello");
    assert_eq!(text_end_count(&parts, "task-1"), 1);

    let (reason, metadata) = finish(&parts);
    assert_eq!(*reason, FinishReason::Stop);
    assert_eq!(metadata.final_text.as_deref(), Some("Goodbye"));
}

#[tokio::test]
async fn test_duplicate_artifact_update_suppressed() {
    let artifact = Artifact::text("art-1", "same content");
    let parts = run_ok(vec![
        artifact_event("task-1", artifact.clone(), false),
        artifact_event("task-1", artifact, false),
    ])
    .await;

    let delta_count = parts
        .iter()
        .filter(|p| matches!(p, StreamPart::TextDelta { .. }))
        .count();
    assert_eq!(delta_count, 1);
    assert_eq!(deltas(&parts), "same content");

    let (_, metadata) = finish(&parts);
    assert_eq!(metadata.artifacts.len(), 1);
}

#[tokio::test]
async fn test_incremental_artifact_diffed_and_closed() {
    let parts = run_ok(vec![
        artifact_event("task-1", Artifact::text("art-1", "fn main"), false),
        artifact_event("task-1", Artifact::text("art-1", "fn main() {}"), true),
    ])
    .await;

    assert_eq!(deltas(&parts), "fn main() {}");
    assert_eq!(
        parts
            .iter()
            .filter(|p| matches!(p, StreamPart::TextDelta { .. }))
            .map(|p| match p {
                StreamPart::TextDelta { delta, .. } => delta.as_str(),
                _ => unreachable!(),
            })
            .collect::<Vec<_>>(),
        vec!["fn main", "() {}"]
    );
    assert_eq!(text_end_count(&parts, "art-1"), 1);

    let (_, metadata) = finish(&parts);
    assert_eq!(metadata.artifacts[0].text_content(), "fn main() {}");
}

#[tokio::test]
async fn test_message_event_with_file_part() {
    let message = Message::agent("Here is the chart")
        .with_part(Part::file_uri("https://example.com/chart.png", "image/png"));
    let message_id = message.message_id.clone();

    let parts = run_ok(vec![A2aEvent::Message(message)]).await;

    assert!(matches!(
        &parts[1],
        StreamPart::ResponseMetadata { id: Some(id), .. } if *id == message_id
    ));
    assert!(parts.contains(&StreamPart::File {
        data: "https://example.com/chart.png".into(),
        media_type: "image/png".into(),
    }));
    assert_eq!(deltas(&parts), "Here is the chart");
    assert_eq!(text_end_count(&parts, &message_id), 1);

    let (reason, _) = finish(&parts);
    assert_eq!(*reason, FinishReason::Stop);
}

#[tokio::test]
async fn test_transport_error_propagates_without_finish() {
    let parts = run(vec![
        Ok(status_event("task-1", TaskState::Working, Some("partial"))),
        Err(A2aError::connection_error("connection reset")),
    ])
    .await;

    assert!(parts.last().expect("non-empty stream").is_err());
    assert!(!parts.iter().any(|p| matches!(
        p,
        Ok(StreamPart::Finish { .. })
    )));
}

#[tokio::test]
async fn test_unterminated_stream_flushes_open_ids() {
    let parts = run_ok(vec![status_event(
        "task-1",
        TaskState::Working,
        Some("still going"),
    )])
    .await;

    // The open stream is closed before finish even without a terminal event.
    assert_eq!(text_end_count(&parts, "task-1"), 1);
    let end_pos = parts
        .iter()
        .position(|p| matches!(p, StreamPart::TextEnd { .. }))
        .expect("text-end emitted");
    assert!(matches!(parts.last(), Some(StreamPart::Finish { .. })));
    assert!(end_pos < parts.len() - 1);

    let (reason, _) = finish(&parts);
    assert_eq!(*reason, FinishReason::Unknown);
}

#[tokio::test]
async fn test_input_required_pauses_with_stop_reason() {
    let parts = run_ok(vec![
        status_event("task-1", TaskState::Working, Some("Looking up weather")),
        status_event("task-1", TaskState::InputRequired, Some("Which city?")),
    ])
    .await;

    let (reason, metadata) = finish(&parts);
    assert_eq!(*reason, FinishReason::Stop);
    assert!(metadata.input_required);
    assert_eq!(metadata.task_state, Some(TaskState::InputRequired));
    assert_eq!(metadata.status_message.as_deref(), Some("Which city?"));
    // The pause prompt is not a continuation of the streamed text.
    assert_eq!(deltas(&parts), "Looking up weather");
}

#[tokio::test]
async fn test_completed_without_message_closes_cleanly() {
    let parts = run_ok(vec![
        status_event("task-1", TaskState::Working, Some("All done")),
        status_event("task-1", TaskState::Completed, None),
    ])
    .await;

    assert_eq!(deltas(&parts), "All done");
    assert_eq!(text_end_count(&parts, "task-1"), 1);

    let (reason, metadata) = finish(&parts);
    assert_eq!(*reason, FinishReason::Stop);
    assert!(metadata.final_text.is_none());
}

#[tokio::test]
async fn test_status_and_artifact_streams_are_independent() {
    let parts = run_ok(vec![
        status_event("task-1", TaskState::Working, Some("Writing code")),
        artifact_event("task-1", Artifact::text("art-1", "let x = 1;"), true),
        status_event("task-1", TaskState::Completed, Some("Writing code, done")),
    ])
    .await;

    assert_eq!(text_end_count(&parts, "task-1"), 1);
    assert_eq!(text_end_count(&parts, "art-1"), 1);

    let status_deltas: String = parts
        .iter()
        .filter_map(|p| match p {
            StreamPart::TextDelta { id, delta } if id == "task-1" => Some(delta.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(status_deltas, "Writing code, done");

    let (_, metadata) = finish(&parts);
    assert_eq!(metadata.final_text.as_deref(), Some("Writing code, done"));
    assert_eq!(metadata.artifacts.len(), 1);
}
