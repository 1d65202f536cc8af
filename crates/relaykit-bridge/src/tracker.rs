//! Per-invocation text-stream bookkeeping and snapshot-to-delta conversion.
//!
//! A2A agents are not guaranteed to send true incremental deltas; some send
//! the full cumulative text snapshot on every update. The tracker keeps the
//! last-seen snapshot per logical stream id (taskId, artifactId, or
//! messageId depending on the event kind) and converts each new snapshot
//! into the smallest correct delta, opening and closing the id's stream as
//! it goes.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use relaykit_a2a::Part;

use crate::stream::StreamPart;

/// Mutable tracking state for one reconciliation run.
///
/// Never shared across invocations; each call to `reconcile` gets a fresh
/// tracker.
#[derive(Debug, Default)]
pub(crate) struct SnapshotTracker {
    /// Last-emitted full-text snapshot per stream id
    snapshots: HashMap<String, String>,
    /// Stream ids currently open (text-start emitted, no text-end yet)
    open: HashSet<String>,
    /// Open order, for deterministic flushing
    open_order: Vec<String>,
    /// Stream ids that have been closed; a closed id never reopens
    closed: HashSet<String>,
}

impl SnapshotTracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Feed a new full-text snapshot for `id`, emitting the delta (if any)
    /// into `out` and closing the stream when `close` is set.
    ///
    /// Per snapshot:
    /// - a true extension of the tracked text emits only the suffix;
    /// - the first sighting emits the full text;
    /// - divergence from a non-empty tracked snapshot is suppressed on the
    ///   live stream (the authoritative final text carries the correct
    ///   content to metadata readers);
    /// - the tracked snapshot is always updated.
    pub(crate) fn apply_snapshot(
        &mut self,
        id: &str,
        text: &str,
        close: bool,
        out: &mut Vec<StreamPart>,
    ) {
        if self.closed.contains(id) {
            // Late content for a closed stream updates tracking only; the
            // id already got its one text-end.
            if let Some(prev) = self.snapshots.get(id)
                && text != prev
            {
                debug!(stream_id = %id, "Dropping late content for closed stream");
            }
            self.snapshots.insert(id.to_string(), text.to_string());
            return;
        }

        let prev = self.snapshots.get(id).map(String::as_str).unwrap_or("");
        let delta = if let Some(suffix) = text.strip_prefix(prev) {
            suffix
        } else if prev.is_empty() {
            text
        } else {
            warn!(
                stream_id = %id,
                "Snapshot diverged from tracked text; suppressing live delta"
            );
            ""
        };

        if !delta.is_empty() {
            self.ensure_open(id, out);
            out.push(StreamPart::TextDelta {
                id: id.to_string(),
                delta: delta.to_string(),
            });
        }

        self.snapshots.insert(id.to_string(), text.to_string());

        if close {
            self.close(id, out);
        }
    }

    /// Emit `text-start` for `id` unless the stream is already open.
    fn ensure_open(&mut self, id: &str, out: &mut Vec<StreamPart>) {
        if self.open.contains(id) {
            return;
        }
        self.open.insert(id.to_string());
        self.open_order.push(id.to_string());
        out.push(StreamPart::TextStart { id: id.to_string() });
    }

    /// Close the stream for `id`. Emits `text-end` only if the stream was
    /// actually opened; either way the id is barred from reopening.
    pub(crate) fn close(&mut self, id: &str, out: &mut Vec<StreamPart>) {
        if self.open.remove(id) {
            out.push(StreamPart::TextEnd { id: id.to_string() });
        }
        self.closed.insert(id.to_string());
    }

    /// Close every still-open stream, in the order the streams were opened.
    pub(crate) fn flush_open(&mut self, out: &mut Vec<StreamPart>) {
        for id in std::mem::take(&mut self.open_order) {
            if self.open.remove(&id) {
                out.push(StreamPart::TextEnd { id: id.clone() });
                self.closed.insert(id);
            }
        }
    }
}

/// Emit one `file` part per file part in `parts`.
///
/// Inline base64 bytes or a URI pass through as the `data` field; the
/// media type defaults to `application/octet-stream` when unspecified.
pub(crate) fn emit_file_parts(parts: &[Part], out: &mut Vec<StreamPart>) {
    for part in parts {
        if let Some(file) = part.as_file()
            && let Some(data) = file.payload()
        {
            out.push(StreamPart::File {
                data: data.to_string(),
                media_type: file.mime_type_or_default().to_string(),
            });
        }
    }
}

/// Concatenate the text parts of an event, without injected separators.
pub(crate) fn text_of_parts(parts: &[Part]) -> String {
    parts
        .iter()
        .filter_map(|p| p.as_text())
        .collect::<Vec<_>>()
        .concat()
}

#[cfg(test)]
mod tests {
    use super::*;
    use relaykit_a2a::Part;

    fn deltas(parts: &[StreamPart]) -> String {
        parts
            .iter()
            .filter_map(|p| match p {
                StreamPart::TextDelta { delta, .. } => Some(delta.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_extension_emits_suffix() {
        let mut tracker = SnapshotTracker::new();
        let mut out = Vec::new();

        tracker.apply_snapshot("t1", "Hello", false, &mut out);
        tracker.apply_snapshot("t1", "Hello world", false, &mut out);

        assert_eq!(out[0], StreamPart::TextStart { id: "t1".into() });
        assert_eq!(deltas(&out), "Hello world");
        assert_eq!(
            out.last().unwrap(),
            &StreamPart::TextDelta {
                id: "t1".into(),
                delta: " world".into()
            }
        );
    }

    #[test]
    fn test_repeated_snapshot_emits_nothing() {
        let mut tracker = SnapshotTracker::new();
        let mut out = Vec::new();

        tracker.apply_snapshot("t1", "Hello", false, &mut out);
        let before = out.len();
        tracker.apply_snapshot("t1", "Hello", false, &mut out);

        assert_eq!(out.len(), before);
    }

    #[test]
    fn test_divergence_is_suppressed() {
        let mut tracker = SnapshotTracker::new();
        let mut out = Vec::new();

        tracker.apply_snapshot("t1", "Hello", false, &mut out);
        tracker.apply_snapshot("t1", "Goodbye", false, &mut out);

        assert_eq!(deltas(&out), "Hello");

        // Tracking still advanced: an extension of the replacement works.
        tracker.apply_snapshot("t1", "Goodbye!", false, &mut out);
        assert_eq!(deltas(&out), "Hello!");
    }

    #[test]
    fn test_close_without_content() {
        let mut tracker = SnapshotTracker::new();
        let mut out = Vec::new();

        // Never opened: close emits no text-end, but bars reopening.
        tracker.close("t1", &mut out);
        assert!(out.is_empty());

        tracker.apply_snapshot("t1", "late", false, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_closed_stream_never_reopens() {
        let mut tracker = SnapshotTracker::new();
        let mut out = Vec::new();

        tracker.apply_snapshot("t1", "Hello", true, &mut out);
        assert_eq!(out.last().unwrap(), &StreamPart::TextEnd { id: "t1".into() });

        let before = out.len();
        tracker.apply_snapshot("t1", "Hello again", false, &mut out);
        assert_eq!(out.len(), before);
    }

    #[test]
    fn test_flush_closes_in_open_order() {
        let mut tracker = SnapshotTracker::new();
        let mut out = Vec::new();

        tracker.apply_snapshot("a", "1", false, &mut out);
        tracker.apply_snapshot("b", "2", false, &mut out);

        let mut flushed = Vec::new();
        tracker.flush_open(&mut flushed);

        assert_eq!(
            flushed,
            vec![
                StreamPart::TextEnd { id: "a".into() },
                StreamPart::TextEnd { id: "b".into() },
            ]
        );
    }

    #[test]
    fn test_file_part_emission() {
        let parts = vec![
            Part::text("ignored here"),
            Part::file_bytes("aGVsbG8=", "image/png"),
            Part::file_uri("https://example.com/f.bin", "application/zip"),
        ];

        let mut out = Vec::new();
        emit_file_parts(&parts, &mut out);

        assert_eq!(
            out,
            vec![
                StreamPart::File {
                    data: "aGVsbG8=".into(),
                    media_type: "image/png".into()
                },
                StreamPart::File {
                    data: "https://example.com/f.bin".into(),
                    media_type: "application/zip".into()
                },
            ]
        );
    }

    #[test]
    fn test_text_of_parts_concatenation() {
        let parts = vec![
            Part::text("Hello"),
            Part::data(serde_json::json!({"skip": true})),
            Part::text(" world"),
        ];
        assert_eq!(text_of_parts(&parts), "Hello world");
    }
}
