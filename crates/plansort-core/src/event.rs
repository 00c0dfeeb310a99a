use chrono::Utc;
use serde::Serialize;
use std::fmt;
use std::sync::mpsc;

/// Notification emitted by the pipeline while it runs.
///
/// `Status` carries the overall progress percentage, `Log` a timestamped
/// narrative line. Neither is retained by the pipeline itself; they exist
/// only to be forwarded to whatever surface is observing the run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PipelineEvent {
    Status { progress: u8, message: String },
    Log { timestamp: f64, message: String },
}

impl fmt::Display for PipelineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineEvent::Status { progress, message } => write!(f, "{progress}: {message}"),
            PipelineEvent::Log { timestamp, message } => write!(f, "{timestamp}: {message}"),
        }
    }
}

/// Sending half of the event channel handed to a pipeline run.
///
/// Emitting never blocks: the channel is unbounded, and a receiver that has
/// gone away is ignored rather than treated as an error, so an observer can
/// disconnect without taking the run down with it.
#[derive(Clone)]
pub struct EventSink {
    tx: mpsc::Sender<PipelineEvent>,
}

impl EventSink {
    pub fn new(tx: mpsc::Sender<PipelineEvent>) -> Self {
        EventSink { tx }
    }

    /// Create a connected sink/receiver pair.
    pub fn channel() -> (Self, mpsc::Receiver<PipelineEvent>) {
        let (tx, rx) = mpsc::channel();
        (EventSink { tx }, rx)
    }

    pub fn emit(&self, event: PipelineEvent) {
        let _ = self.tx.send(event);
    }

    pub fn status(&self, progress: u8, message: impl Into<String>) {
        self.emit(PipelineEvent::Status {
            progress,
            message: message.into(),
        });
    }

    pub fn log(&self, message: impl Into<String>) {
        self.emit(PipelineEvent::Log {
            timestamp: unix_time(),
            message: message.into(),
        });
    }
}

/// Current wall-clock time as fractional unix seconds.
pub fn unix_time() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats() {
        let status = PipelineEvent::Status {
            progress: 42,
            message: "working".into(),
        };
        assert_eq!(status.to_string(), "42: working");

        let log = PipelineEvent::Log {
            timestamp: 1.5,
            message: "did a thing".into(),
        };
        assert_eq!(log.to_string(), "1.5: did a thing");
    }

    #[test]
    fn serializes_with_kind_tag() {
        let status = PipelineEvent::Status {
            progress: 100,
            message: "Finished".into(),
        };
        let json = serde_json::to_string(&status).unwrap();
        assert_eq!(
            json,
            r#"{"kind":"status","progress":100,"message":"Finished"}"#
        );
    }

    #[test]
    fn emit_ignores_disconnected_receiver() {
        let (sink, rx) = EventSink::channel();
        drop(rx);
        // Must not panic or error.
        sink.log("nobody listening");
    }

    #[test]
    fn channel_preserves_order() {
        let (sink, rx) = EventSink::channel();
        sink.status(0, "a");
        sink.log("b");
        sink.status(50, "c");
        drop(sink);

        let events: Vec<PipelineEvent> = rx.iter().collect();
        assert_eq!(events.len(), 3);
        assert!(matches!(&events[0], PipelineEvent::Status { progress: 0, .. }));
        assert!(matches!(&events[1], PipelineEvent::Log { .. }));
        assert!(matches!(&events[2], PipelineEvent::Status { progress: 50, .. }));
    }
}
