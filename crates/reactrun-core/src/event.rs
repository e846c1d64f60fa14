//! Job lifecycle events as consumed by the remote caller.

use crate::ids::JobId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Job id stamped on the terminal `done` envelope.
pub const CREW_FINISHED_JOB_ID: &str = "CREW_FINISHED";

/// Crew type of lifecycle and progress events.
pub const REACT_CREW_TYPE: &str = "react";

/// Crew type of the terminal `done` envelope.
pub const DONE_CREW_TYPE: &str = "crew";

/// One entry appended to the event sink.
///
/// Serializes as `{"type": "event" | "done" | "output", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum EventEnvelope {
    /// Lifecycle or progress notification.
    Event(EventData),
    /// Terminal marker; always the last envelope of a job.
    Done(EventData),
    /// Final structured payload for the caller.
    Output(OutputData),
}

impl EventEnvelope {
    /// Wrap a lifecycle/progress notification.
    pub fn event(data: EventData) -> Self {
        Self::Event(data)
    }

    /// Create the terminal `crew_completed` marker.
    pub fn crew_completed(todo_id: Option<String>, proc_inst_id: Option<String>) -> Self {
        Self::Done(EventData::new(
            EventType::CrewCompleted,
            JobId::new(CREW_FINISHED_JOB_ID),
            DONE_CREW_TYPE,
            Value::Object(Map::new()),
            todo_id,
            proc_inst_id,
        ))
    }

    /// Create the final output envelope, keyed by the form id.
    pub fn output(form_key: &str, payload: Value) -> Self {
        let mut data = Map::new();
        data.insert(form_key.to_string(), payload);
        Self::Output(OutputData {
            final_flag: "true".to_string(),
            data: Value::Object(data),
        })
    }

    /// Event type carried by this envelope, if any.
    pub fn event_type(&self) -> Option<EventType> {
        match self {
            Self::Event(data) | Self::Done(data) => Some(data.event_type),
            Self::Output(_) => None,
        }
    }

    /// Short label of the envelope kind, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Event(_) => "event",
            Self::Done(_) => "done",
            Self::Output(_) => "output",
        }
    }
}

/// Payload of `event` and `done` envelopes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventData {
    /// Type of event.
    pub event_type: EventType,
    /// Event stream this entry belongs to.
    pub job_id: JobId,
    /// Producer kind (`react` or `crew`).
    pub crew_type: String,
    /// Event-specific payload.
    pub data: Value,
    /// Work item identifier, carried through verbatim.
    pub todo_id: Option<String>,
    /// Process instance identifier, carried through verbatim.
    pub proc_inst_id: Option<String>,
    /// ISO-8601 time of emission.
    pub timestamp: String,
}

impl EventData {
    /// Create event data stamped with the current time.
    pub fn new(
        event_type: EventType,
        job_id: JobId,
        crew_type: impl Into<String>,
        data: Value,
        todo_id: Option<String>,
        proc_inst_id: Option<String>,
    ) -> Self {
        Self {
            event_type,
            job_id,
            crew_type: crew_type.into(),
            data,
            todo_id,
            proc_inst_id,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Payload of the `output` envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputData {
    /// Always the string `"true"` on the wire.
    #[serde(rename = "final")]
    pub final_flag: String,
    /// `{<form_id>: <payload>}`.
    pub data: Value,
}

/// Type of job event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// Job accepted; carries the agent profile and inputs.
    TaskStarted,
    /// Result processed; carries the final payload.
    TaskCompleted,
    /// Terminal marker.
    CrewCompleted,
    /// Model call started.
    LlmStarted,
    /// Tool call started.
    ToolUsageStarted,
    /// Tool call finished.
    ToolUsageFinished,
    /// Tool call failed.
    ToolUsageError,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_crew_completed_shape() {
        let envelope = EventEnvelope::crew_completed(Some("todo-1".to_string()), None);
        let value = serde_json::to_value(&envelope).unwrap();

        assert_eq!(value["type"], "done");
        assert_eq!(value["data"]["event_type"], "crew_completed");
        assert_eq!(value["data"]["job_id"], CREW_FINISHED_JOB_ID);
        assert_eq!(value["data"]["crew_type"], "crew");
        assert_eq!(value["data"]["data"], json!({}));
        assert_eq!(value["data"]["todo_id"], "todo-1");
        assert_eq!(value["data"]["proc_inst_id"], Value::Null);
        assert!(value["data"]["timestamp"].as_str().unwrap().contains('T'));
    }

    #[test]
    fn test_output_shape() {
        let envelope = EventEnvelope::output("form_a", json!({"summary": "ok"}));
        let value = serde_json::to_value(&envelope).unwrap();

        assert_eq!(
            value,
            json!({
                "type": "output",
                "data": {"final": "true", "data": {"form_a": {"summary": "ok"}}}
            })
        );
        assert_eq!(envelope.event_type(), None);
    }

    #[test]
    fn test_event_shape() {
        let envelope = EventEnvelope::event(EventData::new(
            EventType::ToolUsageStarted,
            JobId::new("job-1"),
            REACT_CREW_TYPE,
            json!({"tool_name": "run_python"}),
            None,
            Some("7".to_string()),
        ));
        let value = serde_json::to_value(&envelope).unwrap();

        assert_eq!(value["type"], "event");
        assert_eq!(value["data"]["event_type"], "tool_usage_started");
        assert_eq!(value["data"]["job_id"], "job-1");
        assert_eq!(value["data"]["crew_type"], "react");
        assert_eq!(value["data"]["proc_inst_id"], "7");
        assert_eq!(envelope.event_type(), Some(EventType::ToolUsageStarted));
    }
}
