//! Agent progress forwarded to a job's event sink.

use std::sync::Arc;

use async_trait::async_trait;
use reactrun_agent::ProgressHandler;
use reactrun_core::{EventData, EventEnvelope, EventType, JobId, REACT_CREW_TYPE};
use serde_json::{json, Map, Value};

use crate::sink::{emit, EventSink};

/// Maximum characters of a tool input or output carried in an event.
pub const PREVIEW_MAX: usize = 400;

/// Progress handler bound to one job's identifiers and sink.
pub struct QueueProgress {
    sink: Arc<dyn EventSink>,
    job_id: JobId,
    todo_id: Option<String>,
    proc_inst_id: Option<String>,
}

impl QueueProgress {
    pub fn new(
        sink: Arc<dyn EventSink>,
        job_id: JobId,
        todo_id: Option<String>,
        proc_inst_id: Option<String>,
    ) -> Self {
        Self {
            sink,
            job_id,
            todo_id,
            proc_inst_id,
        }
    }

    fn send(&self, event_type: EventType, data: Value) {
        let envelope = EventEnvelope::event(EventData::new(
            event_type,
            self.job_id.clone(),
            REACT_CREW_TYPE,
            data,
            self.todo_id.clone(),
            self.proc_inst_id.clone(),
        ));
        emit(self.sink.as_ref(), envelope);
    }
}

#[async_trait]
impl ProgressHandler for QueueProgress {
    async fn on_llm_start(&self, _message_count: usize) {
        self.send(EventType::LlmStarted, Value::Object(Map::new()));
    }

    async fn on_tool_start(&self, tool_name: &str, input: &str) {
        self.send(
            EventType::ToolUsageStarted,
            json!({ "tool_name": tool_name, "query": preview(input) }),
        );
    }

    async fn on_tool_end(&self, tool_name: &str, output: &str) {
        self.send(
            EventType::ToolUsageFinished,
            json!({ "tool_name": tool_name, "result": preview(output) }),
        );
    }

    async fn on_tool_error(&self, tool_name: &str, error: &str) {
        self.send(
            EventType::ToolUsageError,
            json!({ "tool_name": tool_name, "error": preview(error) }),
        );
    }
}

/// Truncate `text` to [`PREVIEW_MAX`] characters, marking the cut with `…`.
pub fn preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_MAX) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}
