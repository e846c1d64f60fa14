//! Event sinks that receive a job's envelopes.

use std::io::{self, Write};
use std::sync::Mutex;

use reactrun_core::EventEnvelope;
use tokio::sync::mpsc;
use tracing::{trace, warn};

use crate::error::SinkError;

/// Append-only destination for job events.
pub trait EventSink: Send + Sync {
    /// Append one envelope.
    fn enqueue(&self, envelope: EventEnvelope) -> Result<(), SinkError>;
}

/// Append `envelope` to `sink`, logging and discarding any failure.
pub fn emit(sink: &dyn EventSink, envelope: EventEnvelope) {
    let kind = envelope.kind();
    let event_type = envelope.event_type();
    match sink.enqueue(envelope) {
        Ok(()) => trace!(kind, ?event_type, "Event enqueued"),
        Err(e) => warn!(kind, ?event_type, error = %e, "Failed to enqueue event"),
    }
}

/// Sink backed by an unbounded tokio channel.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<EventEnvelope>,
}

impl ChannelSink {
    /// Create a sink and the receiver its envelopes arrive on.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<EventEnvelope>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn enqueue(&self, envelope: EventEnvelope) -> Result<(), SinkError> {
        self.tx.send(envelope).map_err(|_| SinkError::Closed)
    }
}

/// Sink writing one JSON document per line.
pub struct JsonLinesSink<W = io::Stdout> {
    writer: Mutex<W>,
}

impl JsonLinesSink<io::Stdout> {
    /// Sink writing to standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> JsonLinesSink<W> {
    /// Sink writing to `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Consume the sink, returning its writer.
    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<W: Write + Send> EventSink for JsonLinesSink<W> {
    fn enqueue(&self, envelope: EventEnvelope) -> Result<(), SinkError> {
        let line = serde_json::to_string(&envelope)?;
        let mut writer = self
            .writer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        writeln!(writer, "{}", line)?;
        writer.flush()?;
        Ok(())
    }
}
