//! Job execution.
//!
//! One call to [`JobExecutor::execute`] runs one job end to end:
//!
//! 1. emit `task_started` and capture the start time
//! 2. open a tool session, load the tool set, run the agent
//! 3. extract a JSON payload from the agent's answer and inline new images
//! 4. emit `task_completed` and `output`
//! 5. emit the terminal `crew_completed` marker
//!
//! Failures in step 2 become a failure record that stands in for the
//! payload. The terminal marker is emitted by a drop guard, so it also goes
//! out when the job future panics or is dropped.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use reactrun_agent::{
    AgentError, AgentRunner, OpenAiChatModel, ProgressHandler, ReactAgent, Tool,
};
use reactrun_core::{
    EventData, EventEnvelope, EventType, JobId, JobInputs, JobOutcome, JobState, REACT_CREW_TYPE,
};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::SessionError;
use crate::extract::extract;
use crate::inline::{inline_with, ArtifactFs, LocalFs};
use crate::progress::QueueProgress;
use crate::prompt::compose;
use crate::sink::{emit, EventSink};
use crate::tools::{load_all_tools, CreateImage, McpStdioProvider, ToolProvider, ToolSession};

const AGENT_NAME: &str = "ReAct Agent";
const AGENT_GOAL: &str =
    "Select the appropriate tools and carry out the work described in the task instructions.";
const AGENT_PROFILE: &str = "/images/chat-icon.png";

/// Why the agent stage of a job failed.
#[derive(Debug, Error)]
enum StageError {
    #[error("Tool session error: {0}")]
    Session(#[from] SessionError),

    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),
}

/// Summary of one finished job.
#[derive(Debug, Clone)]
pub struct JobReport {
    /// Identifier of the job's event stream.
    pub job_id: JobId,
    /// Raw outcome of the agent stage.
    pub outcome: JobOutcome,
    /// Payload emitted with `task_completed` and `output`.
    pub payload: Value,
}

/// Emits the terminal `done` envelope when dropped.
struct DoneSignal {
    sink: Arc<dyn EventSink>,
    todo_id: Option<String>,
    proc_inst_id: Option<String>,
}

impl Drop for DoneSignal {
    fn drop(&mut self) {
        if std::thread::panicking() {
            warn!(todo_id = ?self.todo_id, "Job aborted, emitting terminal event");
        }
        emit(
            self.sink.as_ref(),
            EventEnvelope::crew_completed(self.todo_id.take(), self.proc_inst_id.take()),
        );
    }
}

/// Runs jobs against a tool provider and an agent.
///
/// Holds no per-job state; one executor can run any number of jobs,
/// sequentially or concurrently.
pub struct JobExecutor {
    provider: Arc<dyn ToolProvider>,
    agent: Arc<dyn AgentRunner>,
    first_party: Vec<Arc<dyn Tool>>,
    fs: Arc<dyn ArtifactFs>,
}

impl JobExecutor {
    /// Create an executor with no first-party tools.
    pub fn new(provider: Arc<dyn ToolProvider>, agent: Arc<dyn AgentRunner>) -> Self {
        Self {
            provider,
            agent,
            first_party: Vec::new(),
            fs: Arc::new(LocalFs),
        }
    }

    /// Executor wired from configuration: the code-interpreter tool server,
    /// the `create_image` tool, and a ReAct agent over the configured model.
    pub fn from_config(config: &Config) -> Self {
        let model = OpenAiChatModel::new(config.api_key.clone())
            .with_base_url(config.base_url.clone())
            .with_model(config.model.clone())
            .with_temperature(config.temperature);
        let agent = ReactAgent::new(Arc::new(model)).with_max_iterations(config.max_iterations);

        Self::new(
            Arc::new(McpStdioProvider::from_config(config)),
            Arc::new(agent),
        )
        .with_tool(Arc::new(CreateImage::from_config(config)))
    }

    /// Append a first-party tool, offered after the session's tools.
    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.first_party.push(tool);
        self
    }

    /// Use a different filesystem for image inlining.
    pub fn with_artifact_fs(mut self, fs: Arc<dyn ArtifactFs>) -> Self {
        self.fs = fs;
        self
    }

    /// Run one job, streaming its events into `sink`.
    ///
    /// Never fails: every domain error ends up in the emitted payload, and
    /// the terminal event is always the last one emitted.
    pub async fn execute(&self, inputs: &JobInputs, sink: Arc<dyn EventSink>) -> JobReport {
        let _done = DoneSignal {
            sink: sink.clone(),
            todo_id: inputs.todo_id.clone(),
            proc_inst_id: inputs.proc_inst_id.clone(),
        };

        let job_id = JobId::generate();
        let mut state = JobState::Created;

        info!(
            job_id = %job_id,
            todo_id = ?inputs.todo_id,
            activity = %inputs.activity_name,
            "Starting job"
        );
        if let Some(user_input) = inputs.user_input.as_deref().filter(|s| !s.trim().is_empty()) {
            debug!(job_id = %job_id, user_input = %user_input.trim(), "Job user input");
        }

        self.emit_event(&sink, &job_id, inputs, EventType::TaskStarted, started_data(inputs));
        advance(&job_id, &mut state, JobState::Started);

        // Only images written after this instant are inlined
        let start_time: DateTime<Utc> = Utc::now();

        let prompt = compose(
            &inputs.activity_name,
            &inputs.description,
            &inputs.output_summary,
            &inputs.feedback_summary,
            inputs.form_types.as_ref(),
            inputs.form_html.as_ref(),
        );
        debug!(job_id = %job_id, prompt_len = prompt.len(), "Composed prompt");

        let outcome = match self
            .run_agent(&prompt, &job_id, inputs, &sink, &mut state)
            .await
        {
            Ok(text) => {
                advance(&job_id, &mut state, JobState::ResultReady);
                info!(job_id = %job_id, result_len = text.len(), "Agent finished");
                JobOutcome::succeeded(text)
            }
            Err(e) => {
                advance(&job_id, &mut state, JobState::Failed);
                error!(job_id = %job_id, error = %e, "Job failed");
                JobOutcome::failed(e.to_string())
            }
        };

        let payload = match outcome.result.as_deref() {
            Some(text) if outcome.is_succeeded() => extract(text),
            _ => outcome.to_value(),
        };
        let payload = inline_with(self.fs.as_ref(), payload, start_time);

        self.emit_event(&sink, &job_id, inputs, EventType::TaskCompleted, payload.clone());
        emit(
            sink.as_ref(),
            EventEnvelope::output(inputs.output_key(), payload.clone()),
        );
        advance(&job_id, &mut state, JobState::Completed);

        info!(job_id = %job_id, status = ?outcome.status, "Job completed");

        JobReport {
            job_id,
            outcome,
            payload,
        }
    }

    /// Cancellation hook.
    ///
    /// In-flight work is not interrupted; the job runs to completion.
    pub async fn cancel(&self) {
        info!("cancel requested - no-op (no interruption)");
    }

    /// Open the tool session, run the agent inside it, and close it again.
    async fn run_agent(
        &self,
        prompt: &str,
        job_id: &JobId,
        inputs: &JobInputs,
        sink: &Arc<dyn EventSink>,
        state: &mut JobState,
    ) -> Result<String, StageError> {
        let session = self.provider.open().await?;
        advance(job_id, state, JobState::ToolSessionOpen);

        let result = self
            .run_in_session(session.as_ref(), prompt, job_id, inputs, sink, state)
            .await;

        session.close().await;
        result
    }

    async fn run_in_session(
        &self,
        session: &dyn ToolSession,
        prompt: &str,
        job_id: &JobId,
        inputs: &JobInputs,
        sink: &Arc<dyn EventSink>,
        state: &mut JobState,
    ) -> Result<String, StageError> {
        let tools = load_all_tools(session, &self.first_party).await?;
        advance(job_id, state, JobState::AgentRunning);

        let progress: Arc<dyn ProgressHandler> = Arc::new(QueueProgress::new(
            sink.clone(),
            job_id.clone(),
            inputs.todo_id.clone(),
            inputs.proc_inst_id.clone(),
        ));

        let response = self.agent.invoke(&tools, prompt, Some(progress)).await?;
        Ok(response.final_text())
    }

    fn emit_event(
        &self,
        sink: &Arc<dyn EventSink>,
        job_id: &JobId,
        inputs: &JobInputs,
        event_type: EventType,
        data: Value,
    ) {
        let envelope = EventEnvelope::event(EventData::new(
            event_type,
            job_id.clone(),
            REACT_CREW_TYPE,
            data,
            inputs.todo_id.clone(),
            inputs.proc_inst_id.clone(),
        ));
        emit(sink.as_ref(), envelope);
    }
}

fn started_data(inputs: &JobInputs) -> Value {
    json!({
        "role": AGENT_NAME,
        "name": AGENT_NAME,
        "goal": AGENT_GOAL,
        "agent_profile": AGENT_PROFILE,
        "activity_name": inputs.activity_name,
        "description": inputs.description,
        "previous_result": inputs.output_summary,
        "feedback_summary": inputs.feedback_summary,
    })
}

fn advance(job_id: &JobId, state: &mut JobState, next: JobState) {
    match state.transition(next) {
        Ok(new_state) => {
            debug!(job_id = %job_id, from = ?*state, to = ?new_state, "Job state changed");
            *state = new_state;
        }
        Err(e) => warn!(job_id = %job_id, error = %e, "Unexpected job state transition"),
    }
}
